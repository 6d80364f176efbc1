//! GlusterFS 集群管理命令

use std::sync::Arc;

use anyhow::Result;

use dfs_deploy::{GlusterOrchestrator, StdoutProgress};

use crate::commands::common::{finish, load_topology, GlusterOpts};
use crate::GlusterAction;

pub async fn handle(action: GlusterAction) -> Result<()> {
    match action {
        GlusterAction::Deploy { opts } => {
            let orch = orchestrator(&opts)?;
            finish(orch.deploy().await, "glusterfs 集群部署完成")
        }
        GlusterAction::Undeploy { opts } => {
            let orch = orchestrator(&opts)?;
            finish(orch.undeploy().await, "glusterfs 集群卸载完成")
        }
        GlusterAction::Start { opts } => {
            let orch = orchestrator(&opts)?;
            finish(orch.start_all().await, "glusterd 服务已在全部节点重启")
        }
        GlusterAction::Stop { opts } => {
            let orch = orchestrator(&opts)?;
            finish(orch.stop_all().await, "glusterd 服务已在全部节点停止")
        }
        GlusterAction::Check { opts } => {
            let orch = orchestrator(&opts)?;
            finish(orch.check_servers().await, "各节点检查通过")
        }
        GlusterAction::Mount { opts, action } => {
            let orch = orchestrator(&opts)?;
            finish(orch.mount(action.into()).await, "客户端挂载操作完成")
        }
    }
}

fn orchestrator(opts: &GlusterOpts) -> Result<GlusterOrchestrator> {
    let topology = load_topology(&opts.conf)?;
    Ok(GlusterOrchestrator::new(
        topology,
        opts.ssh.runner(),
        Arc::new(StdoutProgress),
    ))
}
