//! DFS CLI 应用

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};

mod commands;

use commands::common::{GlusterOpts, LustreOpts, MountActionArg};

#[derive(Parser)]
#[command(name = "dfsctl")]
#[command(about = "dfsctl - 在远程节点上部署分布式文件系统集群", long_about = None)]
#[command(version)]
struct Cli {
    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GlusterFS 集群管理
    Gluster {
        #[command(subcommand)]
        action: GlusterAction,
    },

    /// Lustre 集群管理
    Lustre {
        #[command(subcommand)]
        action: LustreAction,
    },
}

#[derive(Subcommand)]
pub enum GlusterAction {
    /// 部署集群（加入成员、建卷、启卷）
    Deploy {
        #[command(flatten)]
        opts: GlusterOpts,
    },
    /// 卸载集群（停卷、删卷、移出成员）
    Undeploy {
        #[command(flatten)]
        opts: GlusterOpts,
    },
    /// 在协调节点和全部数据节点上重启 glusterd 服务
    Start {
        #[command(flatten)]
        opts: GlusterOpts,
    },
    /// 在协调节点和全部数据节点上停止 glusterd 服务
    Stop {
        #[command(flatten)]
        opts: GlusterOpts,
    },
    /// 检查各节点是否安装了 gluster
    Check {
        #[command(flatten)]
        opts: GlusterOpts,
    },
    /// 在客户端节点上挂载/卸载卷
    Mount {
        #[command(flatten)]
        opts: GlusterOpts,

        /// 挂载动作
        #[arg(long, value_enum, default_value = "mount")]
        action: MountActionArg,
    },
}

#[derive(Subcommand)]
pub enum LustreAction {
    /// 部署集群（格式化并挂载 MDT 与各 OST）
    Deploy {
        #[command(flatten)]
        opts: LustreOpts,
    },
    /// 卸载集群（清理 MDT 与各 OST）
    Undeploy {
        #[command(flatten)]
        opts: LustreOpts,
    },
    /// 检查各节点并报告健康状态
    Check {
        #[command(flatten)]
        opts: LustreOpts,
    },
    /// 在客户端节点上挂载/卸载文件系统
    Mount {
        #[command(flatten)]
        opts: LustreOpts,

        /// 挂载动作
        #[arg(long, value_enum, default_value = "mount")]
        action: MountActionArg,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt().with_max_level(log_level).init();

    info!("dfsctl 启动");

    match cli.command {
        Commands::Gluster { action } => commands::gluster::handle(action).await?,
        Commands::Lustre { action } => commands::lustre::handle(action).await?,
    }

    Ok(())
}
