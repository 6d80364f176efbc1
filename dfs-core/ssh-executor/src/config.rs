//! SSH 配置

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// SSH 认证方式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuthMethod {
    /// 密码认证（通过 sshpass）
    Password(String),
    /// 密钥认证
    Key {
        /// 私钥路径
        key_path: PathBuf,
    },
    /// 使用默认密钥（~/.ssh/id_rsa, ~/.ssh/id_ed25519 等）
    DefaultKey,
}

/// SSH 配置
///
/// host/username 描述单个目标节点；同一批部署中每个节点各建一份配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    /// 主机地址
    pub host: String,
    /// 端口（默认 22）
    pub port: u16,
    /// 用户名
    pub username: String,
    /// 认证方式
    pub auth: AuthMethod,
    /// 连接超时
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
    /// 命令执行超时
    #[serde(with = "humantime_serde", default = "default_command_timeout")]
    pub command_timeout: Duration,
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_command_timeout() -> Duration {
    // 远端的 mkfs 操作可能相当耗时
    Duration::from_secs(600)
}

impl SshConfig {
    /// 使用密码认证创建配置
    pub fn with_password(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::build(host, username, AuthMethod::Password(password.into()))
    }

    /// 使用密钥认证创建配置
    pub fn with_key(
        host: impl Into<String>,
        username: impl Into<String>,
        key_path: impl Into<PathBuf>,
    ) -> Self {
        Self::build(
            host,
            username,
            AuthMethod::Key {
                key_path: key_path.into(),
            },
        )
    }

    /// 使用默认密钥认证创建配置
    pub fn with_default_key(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self::build(host, username, AuthMethod::DefaultKey)
    }

    fn build(host: impl Into<String>, username: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            auth,
            connect_timeout: default_connect_timeout(),
            command_timeout: default_command_timeout(),
        }
    }

    /// 设置端口
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// 设置命令执行超时
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// 获取 user@host 形式的目标描述
    pub fn target(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_config() {
        let config = SshConfig::with_password("192.168.10.1", "root", "secret");
        assert_eq!(config.host, "192.168.10.1");
        assert_eq!(config.port, 22);
        assert_eq!(config.target(), "root@192.168.10.1");
        assert!(matches!(config.auth, AuthMethod::Password(_)));
    }

    #[test]
    fn test_key_config() {
        let config = SshConfig::with_key("node-1", "admin", "~/.ssh/id_ed25519");
        assert!(matches!(config.auth, AuthMethod::Key { .. }));
    }

    #[test]
    fn test_builder() {
        let config = SshConfig::with_default_key("node-1", "root")
            .port(2222)
            .command_timeout(Duration::from_secs(30));
        assert_eq!(config.port, 2222);
        assert_eq!(config.command_timeout.as_secs(), 30);
    }
}
