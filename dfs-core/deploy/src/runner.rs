//! 远程执行边界
//!
//! 编排器只通过 `RemoteRunner` 触碰远端，SSH 细节（和测试替身）都收在
//! 这一层后面。进度输出同理走 `ProgressSink`，而不是直接写 stdout。

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use dfs_ssh_executor::{AuthMethod, CommandOutput, SshClient, SshConfig};

use crate::error::Result;
use crate::topology::NodeRef;

/// 远程命令执行接口
#[async_trait]
pub trait RemoteRunner: Send + Sync {
    /// 以节点的用户身份在节点上执行一条 shell 命令
    async fn exec(&self, command: &str, node: &NodeRef) -> Result<CommandOutput>;

    /// 读取远端文件的第一行，原样返回
    async fn read_first_line(&self, path: &str, node: &NodeRef) -> Result<String>;
}

/// 进度通知输出
///
/// 部署过程中的进度/跳过/冲突提示都从这里出去，测试可注入内存实现捕获。
pub trait ProgressSink: Send + Sync {
    /// 输出一条进度通知
    fn notice(&self, msg: &str);
}

/// 标准输出进度通知
pub struct StdoutProgress;

impl ProgressSink for StdoutProgress {
    fn notice(&self, msg: &str) {
        println!("{}", msg);
    }
}

/// 基于系统 ssh 的远程执行器
///
/// 每条命令按目标节点构造一份 SshConfig；认证方式与超时对所有节点一致。
pub struct SshRunner {
    auth: AuthMethod,
    command_timeout: Duration,
}

impl SshRunner {
    /// 使用指定认证方式创建执行器
    pub fn new(auth: AuthMethod, command_timeout: Duration) -> Self {
        Self {
            auth,
            command_timeout,
        }
    }

    /// 使用默认密钥认证创建执行器
    pub fn with_default_key() -> Self {
        Self::new(AuthMethod::DefaultKey, Duration::from_secs(600))
    }

    fn client_for(&self, node: &NodeRef) -> SshClient {
        let config = SshConfig {
            host: node.host.clone(),
            port: 22,
            username: node.user.clone(),
            auth: self.auth.clone(),
            connect_timeout: Duration::from_secs(30),
            command_timeout: self.command_timeout,
        };
        SshClient::new(config)
    }
}

#[async_trait]
impl RemoteRunner for SshRunner {
    async fn exec(&self, command: &str, node: &NodeRef) -> Result<CommandOutput> {
        debug!("[{}] {}", node, command);
        Ok(self.client_for(node).execute(command).await?)
    }

    async fn read_first_line(&self, path: &str, node: &NodeRef) -> Result<String> {
        Ok(self.client_for(node).read_first_line(path).await?)
    }
}
