//! SSH 客户端实现
//!
//! 使用系统 ssh/sshpass 命令执行远程命令，兼容性更好

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::config::{AuthMethod, SshConfig};
use crate::error::{Result, SshError};

/// 命令执行输出
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// 标准输出
    pub stdout: String,
    /// 标准错误
    pub stderr: String,
    /// 退出码
    pub exit_code: Option<u32>,
}

impl CommandOutput {
    /// 检查命令是否成功执行
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// 获取合并的输出（stdout + stderr）
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// SSH 客户端（使用系统 ssh 命令）
///
/// 每条命令独立建立连接，无会话状态；部署场景命令数量有限，
/// 简单性优先于连接复用。
pub struct SshClient {
    config: SshConfig,
}

impl SshClient {
    /// 创建客户端（不做连接验证，首条命令执行时才会触碰网络）
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    /// 执行命令
    pub async fn execute(&self, command: &str) -> Result<CommandOutput> {
        debug!("在 {} 执行命令: {}", self.config.target(), command);

        timeout(self.config.command_timeout, self.execute_internal(command))
            .await
            .map_err(|_| SshError::TimeoutError(format!("命令执行超时: {}", command)))?
    }

    /// 执行命令并检查退出码
    pub async fn execute_checked(&self, command: &str) -> Result<CommandOutput> {
        let output = self.execute(command).await?;

        if !output.is_success() {
            return Err(SshError::ExecutionError(format!(
                "命令执行失败 (退出码 {:?}): {}",
                output.exit_code,
                output.combined_output()
            )));
        }

        Ok(output)
    }

    /// 检查远端路径是否存在
    pub async fn file_exists(&self, path: &str) -> Result<bool> {
        let output = self
            .execute(&format!("test -e {} && echo 1 || echo 0", path))
            .await?;
        Ok(output.stdout.trim() == "1")
    }

    /// 读取远端文件的第一行（原样返回，不做解析）
    pub async fn read_first_line(&self, path: &str) -> Result<String> {
        let output = self.execute_checked(&format!("head -n 1 {}", path)).await?;
        Ok(output.stdout)
    }

    /// 获取配置
    pub fn config(&self) -> &SshConfig {
        &self.config
    }

    async fn execute_internal(&self, command: &str) -> Result<CommandOutput> {
        let mut cmd = match &self.config.auth {
            AuthMethod::Password(password) => {
                // 密码认证经由 sshpass 传递
                let mut cmd = Command::new("sshpass");
                cmd.arg("-p").arg(password);
                cmd.arg("ssh");
                cmd
            }
            AuthMethod::Key { key_path } => {
                let mut cmd = Command::new("ssh");
                cmd.arg("-i").arg(expand_path(key_path));
                cmd
            }
            AuthMethod::DefaultKey => {
                let mut cmd = Command::new("ssh");
                // 无交互场景下不允许退化为密码提问
                cmd.arg("-o").arg("BatchMode=yes");
                cmd
            }
        };

        cmd.arg("-o")
            .arg("StrictHostKeyChecking=no")
            .arg("-o")
            .arg("UserKnownHostsFile=/dev/null")
            .arg("-o")
            .arg(format!(
                "ConnectTimeout={}",
                self.config.connect_timeout.as_secs()
            ))
            .arg("-p")
            .arg(self.config.port.to_string())
            .arg(self.config.target())
            .arg(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .map_err(|e| SshError::ExecutionError(format!("启动 SSH 进程失败: {}", e)))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SshError::ExecutionError(format!("等待 SSH 进程失败: {}", e)))?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: output.status.code().map(|c| c as u32),
        };

        // ssh 以 255 表示自身失败，认证问题在 stderr 中
        if result.exit_code == Some(255)
            && (result.stderr.contains("Permission denied")
                || result.stderr.contains("Authentication failed"))
        {
            return Err(SshError::AuthenticationError(format!(
                "SSH 认证失败: {}",
                result.stderr
            )));
        }

        debug!(
            "命令执行完成, 退出码: {:?}, stdout {} 字节, stderr {} 字节",
            result.exit_code,
            result.stdout.len(),
            result.stderr.len()
        );

        Ok(result)
    }
}

/// 展开路径（处理 ~ 前缀）
fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if path_str.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return PathBuf::from(path_str.replacen('~', &home.to_string_lossy(), 1));
        }
    }
    path.to_path_buf()
}
