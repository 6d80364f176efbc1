//! DFS SSH 执行器
//!
//! 通过系统 ssh/sshpass 命令执行远程命令，支持：
//! - 密码认证 / 密钥认证 / 默认密钥
//! - 命令执行和输出捕获
//! - 逐条命令超时控制
//!
//! # 示例
//!
//! ```ignore
//! use dfs_ssh_executor::{SshClient, SshConfig};
//!
//! let config = SshConfig::with_default_key("node-1", "root");
//! let client = SshClient::new(config);
//! let output = client.execute("gluster peer status").await?;
//! println!("{}", output.stdout);
//! ```

mod client;
mod config;
mod error;

pub use client::{CommandOutput, SshClient};
pub use config::{AuthMethod, SshConfig};
pub use error::{Result, SshError};
