//! 公共命令行选项

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;

use dfs_deploy::{DeployError, MountAction, SshRunner, Topology};
use dfs_ssh_executor::AuthMethod;

/// SSH 连接选项
#[derive(Args)]
pub struct SshOpts {
    /// SSH 密码（不建议在命令行使用，优先使用密钥认证）
    #[arg(long)]
    pub ssh_password: Option<String>,

    /// SSH 私钥路径
    #[arg(long, conflicts_with = "ssh_password")]
    pub ssh_key: Option<String>,

    /// 单条远程命令的超时时间（秒）
    #[arg(long, default_value = "600")]
    pub timeout: u64,
}

impl SshOpts {
    /// 按选项构造远程执行器
    pub fn runner(&self) -> Arc<SshRunner> {
        let auth = if let Some(password) = &self.ssh_password {
            AuthMethod::Password(password.clone())
        } else if let Some(key) = &self.ssh_key {
            AuthMethod::Key {
                key_path: key.into(),
            }
        } else {
            AuthMethod::DefaultKey
        };
        Arc::new(SshRunner::new(auth, Duration::from_secs(self.timeout)))
    }
}

/// Gluster 命令公共选项
#[derive(Args)]
pub struct GlusterOpts {
    /// 拓扑配置文件路径
    #[arg(short, long, default_value = "config/gluster.yaml")]
    pub conf: String,

    #[command(flatten)]
    pub ssh: SshOpts,
}

/// Lustre 命令公共选项
#[derive(Args)]
pub struct LustreOpts {
    /// 拓扑配置文件路径
    #[arg(short, long, default_value = "config/lustre.yaml")]
    pub conf: String,

    #[command(flatten)]
    pub ssh: SshOpts,
}

/// 挂载动作参数
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MountActionArg {
    /// 挂载
    Mount,
    /// 卸载
    Umount,
}

impl From<MountActionArg> for MountAction {
    fn from(arg: MountActionArg) -> Self {
        match arg {
            MountActionArg::Mount => MountAction::Mount,
            MountActionArg::Umount => MountAction::Umount,
        }
    }
}

/// 加载拓扑配置
pub fn load_topology(path: &str) -> Result<Topology> {
    Topology::from_file(path).with_context(|| format!("加载拓扑配置失败: {}", path))
}

/// 统一处理编排结果
///
/// 前置检查失败按约定以退出码 1 终止整个进程；其余错误向上传播。
pub fn finish(result: dfs_deploy::Result<()>, done_msg: &str) -> Result<()> {
    match result {
        Ok(()) => {
            println!("{} {}", "✓".green().bold(), done_msg);
            Ok(())
        }
        Err(e @ DeployError::Precondition { .. }) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
