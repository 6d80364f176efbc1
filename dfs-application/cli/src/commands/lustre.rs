//! Lustre 集群管理命令

use std::sync::Arc;

use anyhow::Result;

use dfs_deploy::{LustreOrchestrator, StdoutProgress};

use crate::commands::common::{finish, load_topology, LustreOpts};
use crate::LustreAction;

pub async fn handle(action: LustreAction) -> Result<()> {
    match action {
        LustreAction::Deploy { opts } => {
            let orch = orchestrator(&opts)?;
            finish(orch.deploy().await, "lustre 集群部署完成")
        }
        LustreAction::Undeploy { opts } => {
            let orch = orchestrator(&opts)?;
            finish(orch.undeploy().await, "lustre 集群卸载完成")
        }
        LustreAction::Check { opts } => {
            let orch = orchestrator(&opts)?;
            finish(orch.check().await, "各节点健康状态检查完成")
        }
        LustreAction::Mount { opts, action } => {
            let orch = orchestrator(&opts)?;
            finish(orch.mount(action.into()).await, "客户端挂载操作完成")
        }
    }
}

fn orchestrator(opts: &LustreOpts) -> Result<LustreOrchestrator> {
    let topology = load_topology(&opts.conf)?;
    Ok(LustreOrchestrator::new(
        topology,
        opts.ssh.runner(),
        Arc::new(StdoutProgress),
    ))
}
