//! 部署错误定义

use thiserror::Error;

use crate::topology::ConfigError;
use dfs_ssh_executor::SshError;

/// 部署操作结果类型
pub type Result<T> = std::result::Result<T, DeployError>;

/// 部署错误类型
#[derive(Error, Debug)]
pub enum DeployError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// SSH 传输错误（命令未能执行）
    #[error("SSH 错误: {0}")]
    Ssh(#[from] SshError),

    /// 远程命令已执行但返回失败，context 描述出错的步骤与节点
    #[error("{context}: {detail}")]
    Remote { context: String, detail: String },

    /// 前置检查失败（缺少必需的二进制），对整次运行是致命的
    #[error("前置检查失败: 以下节点缺少 {binary}: {}", nodes.join(", "))]
    Precondition { binary: String, nodes: Vec<String> },

    /// 主机地址解析失败
    #[error("无法解析主机地址: {0}")]
    Resolve(String),
}

impl DeployError {
    /// 构造带步骤上下文的远程命令错误
    pub fn remote(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Remote {
            context: context.into(),
            detail: detail.into(),
        }
    }

    /// 是否为致命的前置检查失败（CLI 据此返回退出码 1）
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition { .. })
    }
}
