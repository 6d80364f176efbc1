//! 客户端挂载管理
//!
//! 把挂载/卸载动作依次应用到所有客户端节点。单个节点失败只记录通知，
//! 不中断其余节点（尽力而为的扇出）。

use std::sync::Arc;
use tracing::warn;

use crate::error::Result;
use crate::runner::{ProgressSink, RemoteRunner};
use crate::topology::NodeRef;

/// 客户端统一挂载点
pub const CLIENT_MOUNT_POINT: &str = "/dfs";

/// 挂载动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountAction {
    /// 挂载文件系统
    Mount,
    /// 卸载文件系统
    Umount,
}

/// 挂载管理器
pub struct MountManager {
    runner: Arc<dyn RemoteRunner>,
    progress: Arc<dyn ProgressSink>,
}

impl MountManager {
    /// 创建挂载管理器
    pub fn new(runner: Arc<dyn RemoteRunner>, progress: Arc<dyn ProgressSink>) -> Self {
        Self { runner, progress }
    }

    /// 在所有客户端节点上执行挂载/卸载
    ///
    /// mount_cmd 由调用方按文件系统类型拼好；label 只用于通知文案。
    pub async fn apply(
        &self,
        action: MountAction,
        clients: &[NodeRef],
        mount_cmd: &str,
        label: &str,
    ) -> Result<()> {
        for client in clients {
            let result = match action {
                MountAction::Mount => {
                    self.progress
                        .notice(&format!("在客户端 {} 挂载 {}", client.host, label));
                    self.run_mount(client, mount_cmd).await
                }
                MountAction::Umount => {
                    self.progress
                        .notice(&format!("在客户端 {} 卸载 {}", client.host, label));
                    self.run_umount(client).await
                }
            };

            // 单节点失败不阻断其余客户端
            if let Err(e) = result {
                warn!("客户端 {} 操作失败: {}", client.host, e);
                self.progress
                    .notice(&format!("客户端 {} 操作失败: {}", client.host, e));
            }
        }
        Ok(())
    }

    async fn run_mount(&self, client: &NodeRef, mount_cmd: &str) -> Result<()> {
        let mkdir = format!("mkdir -p {}", CLIENT_MOUNT_POINT);
        let output = self.runner.exec(&mkdir, client).await?;
        if !output.is_success() {
            return Err(crate::error::DeployError::remote(
                format!("建立挂载点失败 ({})", client.host),
                output.combined_output(),
            ));
        }

        let output = self.runner.exec(mount_cmd, client).await?;
        if !output.is_success() {
            return Err(crate::error::DeployError::remote(
                format!("挂载失败 ({})", client.host),
                output.combined_output(),
            ));
        }
        Ok(())
    }

    async fn run_umount(&self, client: &NodeRef) -> Result<()> {
        let cmd = format!("umount {}", CLIENT_MOUNT_POINT);
        let output = self.runner.exec(&cmd, client).await?;
        if !output.is_success() {
            return Err(crate::error::DeployError::remote(
                format!("卸载失败 ({})", client.host),
                output.combined_output(),
            ));
        }
        Ok(())
    }
}
