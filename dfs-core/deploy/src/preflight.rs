//! 前置检查
//!
//! 只读探测远端状态，绝不修改远端；每个变更步骤执行前都以此作保护。

use std::sync::Arc;

use crate::error::Result;
use crate::runner::RemoteRunner;
use crate::topology::NodeRef;

/// 前置检查器
pub struct PreflightChecker {
    runner: Arc<dyn RemoteRunner>,
}

impl PreflightChecker {
    /// 创建前置检查器
    pub fn new(runner: Arc<dyn RemoteRunner>) -> Self {
        Self { runner }
    }

    /// 检查远端路径是否存在（二进制、卷元数据文件等）
    pub async fn has_file(&self, path: &str, node: &NodeRef) -> Result<bool> {
        let output = self
            .runner
            .exec(&format!("test -e {} && echo 1 || echo 0", path), node)
            .await?;
        Ok(output.stdout.trim() == "1")
    }

    /// 检查远端路径当前是否已挂载
    pub async fn has_mount(&self, path: &str, node: &NodeRef) -> Result<bool> {
        let output = self
            .runner
            .exec(&format!("mountpoint -q {}", path), node)
            .await?;
        Ok(output.is_success())
    }
}
