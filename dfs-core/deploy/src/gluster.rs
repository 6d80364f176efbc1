//! GlusterFS 集群编排
//!
//! 按固定顺序驱动远端 gluster CLI：探测成员、建卷、启卷、挂载。
//! 每个变更步骤执行前先查询远端状态，已达目标则跳过并输出通知。
//! 远端守护进程是唯一事实来源，状态一律现查现用，不做本地缓存。

use std::sync::Arc;
use tracing::{debug, warn};

use dfs_ssh_executor::CommandOutput;

use crate::command::{GlusterCmd, GLUSTER_BASE_PORT, GLUSTER_BINARY};
use crate::error::{DeployError, Result};
use crate::mount::{MountAction, MountManager, CLIENT_MOUNT_POINT};
use crate::parser::{peer_listed, volume_started};
use crate::preflight::PreflightChecker;
use crate::runner::{ProgressSink, RemoteRunner};
use crate::topology::{NodeRef, Topology};

/// GlusterFS 编排器
///
/// 持有一份解析完成的拓扑，整次运行期间拓扑只读。
pub struct GlusterOrchestrator {
    topology: Topology,
    runner: Arc<dyn RemoteRunner>,
    progress: Arc<dyn ProgressSink>,
    preflight: PreflightChecker,
}

impl GlusterOrchestrator {
    /// 创建编排器
    pub fn new(
        topology: Topology,
        runner: Arc<dyn RemoteRunner>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        let preflight = PreflightChecker::new(runner.clone());
        Self {
            topology,
            runner,
            progress,
            preflight,
        }
    }

    /// 当前拓扑
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// 在单个节点上重启 glusterd 服务
    pub async fn start_node(&self, node: &NodeRef) -> Result<()> {
        self.run(
            &GlusterCmd::ServiceRestart,
            node,
            &format!("启动文件系统服务失败 ({})", node.host),
        )
        .await?;
        Ok(())
    }

    /// 在单个节点上停止 glusterd 服务
    pub async fn stop_node(&self, node: &NodeRef) -> Result<()> {
        self.run(
            &GlusterCmd::ServiceStop,
            node,
            &format!("停止文件系统服务失败 ({})", node.host),
        )
        .await?;
        Ok(())
    }

    /// 在协调节点和全部数据节点上重启服务（配置顺序）
    pub async fn start_all(&self) -> Result<()> {
        self.start_node(&self.topology.master).await?;
        for node in &self.topology.data_nodes {
            self.start_node(node).await?;
        }
        Ok(())
    }

    /// 在协调节点和全部数据节点上停止服务（配置顺序）
    pub async fn stop_all(&self) -> Result<()> {
        self.stop_node(&self.topology.master).await?;
        for node in &self.topology.data_nodes {
            self.stop_node(node).await?;
        }
        Ok(())
    }

    /// 检查协调节点和全部数据节点是否安装了 gluster
    ///
    /// 任一节点缺少必需二进制即为致命错误，整次运行终止，不做部分重试。
    pub async fn check_servers(&self) -> Result<()> {
        let mut missing = Vec::new();

        for node in std::iter::once(&self.topology.master).chain(self.topology.data_nodes.iter()) {
            if !self.preflight.has_file(GLUSTER_BINARY, node).await? {
                self.progress
                    .notice(&format!("节点 {} 未安装 gluster 文件系统", node.host));
                missing.push(node.host.clone());
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DeployError::Precondition {
                binary: GLUSTER_BINARY.to_string(),
                nodes: missing,
            })
        }
    }

    /// 初始化各节点：前置检查、启动服务、放行防火墙端口
    ///
    /// 数据端口从 24009 起按配置顺序逐节点递增，顺序是远端可观测的
    /// 副作用，必须与配置一致。
    async fn init_servers(&self) -> Result<()> {
        self.progress.notice("检查配置文件中的各节点...");
        self.check_servers().await?;

        let master = &self.topology.master;
        self.start_node(master).await?;
        for cmd in [
            GlusterCmd::FirewallOpenAll,
            GlusterCmd::FirewallOpenPort { port: 24008 },
            GlusterCmd::FirewallOpenRange {
                from: 38465,
                to: 38467,
            },
        ] {
            self.run(
                &cmd,
                master,
                &format!("初始化协调节点失败 ({})", master.host),
            )
            .await?;
        }

        for (index, node) in self.topology.data_nodes.iter().enumerate() {
            self.start_node(node).await?;
            let port = GLUSTER_BASE_PORT + index as u32;
            self.run(
                &GlusterCmd::FirewallOpenPort { port },
                master,
                &format!("放行数据端口失败 ({})", master.host),
            )
            .await?;
        }

        Ok(())
    }

    /// 部署集群：加入成员、建卷、启卷
    pub async fn deploy(&self) -> Result<()> {
        self.init_servers().await?;

        let master = &self.topology.master;
        let name = &self.topology.name;

        // 逐个探测数据节点，新加入的节点进入建卷 brick 列表
        let mut bricks = Vec::new();
        for node in &self.topology.data_nodes {
            self.progress
                .notice(&format!("将 {} 加入 glusterfs 存储节点", node.host));
            if self.is_peer(&node.host).await? {
                self.progress
                    .notice(&format!("主机 {} 已在成员列表中", node.host));
                continue;
            }
            self.run(
                &GlusterCmd::PeerProbe {
                    host: node.host.clone(),
                },
                master,
                &format!("探测存储节点失败 ({})", node.host),
            )
            .await?;
            let space = node.extra.as_deref().unwrap_or("");
            bricks.push(format!("{}:{}", node.host, space));
        }

        self.progress.notice(&format!("创建 glusterfs 卷 {}", name));
        if self.volume_exists().await? {
            self.progress.notice(&format!("卷 {} 已存在", name));
        } else {
            self.run(
                &GlusterCmd::VolumeCreate {
                    name: name.clone(),
                    options: self.topology.options.clone(),
                    bricks,
                },
                master,
                &format!("创建卷失败 ({})", name),
            )
            .await?;
        }

        self.progress.notice("启动 glusterfs 卷");
        if self.volume_running().await? {
            self.progress.notice(&format!("卷 {} 已处于启动状态", name));
        } else {
            self.run(
                &GlusterCmd::VolumeStart { name: name.clone() },
                master,
                &format!("启动卷失败 ({})", name),
            )
            .await?;
        }

        self.start_node(master).await
    }

    /// 卸载集群：停卷、删卷、逐节点脱离
    ///
    /// 尽力而为：每个带保护的步骤彼此独立，单步失败或跳过不阻断后续。
    pub async fn undeploy(&self) -> Result<()> {
        let master = &self.topology.master;
        let name = &self.topology.name;

        self.progress.notice(&format!("删除 glusterfs 卷 {}", name));
        if self.volume_running().await? {
            self.best_effort(
                &GlusterCmd::VolumeStop { name: name.clone() },
                master,
                &format!("停止卷失败 ({})", name),
            )
            .await;
        } else {
            self.progress.notice(&format!("卷 {} 不在启动状态", name));
        }

        if self.volume_exists().await? {
            self.best_effort(
                &GlusterCmd::VolumeDelete { name: name.clone() },
                master,
                &format!("删除卷失败 ({})", name),
            )
            .await;
        } else {
            self.progress.notice(&format!("卷 {} 不存在", name));
        }

        for node in &self.topology.data_nodes {
            self.progress
                .notice(&format!("将 {} 移出 glusterfs 存储节点", node.host));
            if self.is_peer(&node.host).await? {
                self.best_effort(
                    &GlusterCmd::PeerDetach {
                        host: node.host.clone(),
                    },
                    master,
                    &format!("脱离存储节点失败 ({})", node.host),
                )
                .await;
                if let Err(e) = self.stop_node(node).await {
                    warn!("停止节点 {} 服务失败: {}", node.host, e);
                    self.progress.notice(&format!("{}", e));
                }
            } else {
                self.progress
                    .notice(&format!("{} 不属于当前集群", node.host));
            }
        }

        self.progress
            .notice(&format!("停止 gluster 文件系统 '{}'", name));
        self.stop_node(master).await
    }

    /// 在所有客户端节点上挂载/卸载卷
    pub async fn mount(&self, action: MountAction) -> Result<()> {
        let mount_cmd = format!(
            "mount -t glusterfs {}:/{} {}",
            self.topology.master.host, self.topology.name, CLIENT_MOUNT_POINT
        );
        MountManager::new(self.runner.clone(), self.progress.clone())
            .apply(action, &self.topology.clients, &mount_cmd, "Glusterfs")
            .await
    }

    /// 查询某主机是否已是集群成员
    pub async fn is_peer(&self, host: &str) -> Result<bool> {
        let output = self
            .run_query(&GlusterCmd::PeerStatus, &self.topology.master)
            .await?;
        Ok(peer_listed(&output.stdout, host))
    }

    /// 查询卷是否存在（按协调节点上的卷元数据文件判断）
    pub async fn volume_exists(&self) -> Result<bool> {
        let info_path = format!("/etc/glusterd/vols/{}/info", self.topology.name);
        self.preflight
            .has_file(&info_path, &self.topology.master)
            .await
    }

    /// 查询卷是否处于启动状态
    pub async fn volume_running(&self) -> Result<bool> {
        if !self.volume_exists().await? {
            return Ok(false);
        }
        let output = self
            .run_query(
                &GlusterCmd::VolumeInfo {
                    name: self.topology.name.clone(),
                },
                &self.topology.master,
            )
            .await?;
        if !output.is_success() {
            // 卷信息查不到即视为未启动
            return Ok(false);
        }
        Ok(volume_started(&output.stdout))
    }

    async fn run(
        &self,
        cmd: &GlusterCmd,
        node: &NodeRef,
        context: &str,
    ) -> Result<CommandOutput> {
        let output = self.runner.exec(&cmd.render(), node).await?;
        if !output.is_success() {
            return Err(DeployError::remote(context, output.combined_output()));
        }
        Ok(output)
    }

    /// 只读查询，不包装退出码（由调用方解释输出）
    async fn run_query(&self, cmd: &GlusterCmd, node: &NodeRef) -> Result<CommandOutput> {
        self.runner.exec(&cmd.render(), node).await
    }

    /// 卸载路径上的步骤：失败记录通知后继续
    async fn best_effort(&self, cmd: &GlusterCmd, node: &NodeRef, context: &str) {
        match self.run(cmd, node, context).await {
            Ok(_) => debug!("{} 完成", cmd),
            Err(e) => {
                warn!("{}", e);
                self.progress.notice(&format!("{}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{MemoryProgress, MockCluster};

    fn topology() -> Topology {
        Topology::from_yaml(
            r#"
name: vol1
options: ""
master: "m@hm"
dataNodes: "u@h1:10 u@h2:20"
clients: "c@h3"
"#,
        )
        .unwrap()
    }

    fn orchestrator(cluster: &Arc<MockCluster>) -> (GlusterOrchestrator, Arc<MemoryProgress>) {
        let progress = Arc::new(MemoryProgress::default());
        let orch = GlusterOrchestrator::new(topology(), cluster.clone(), progress.clone());
        (orch, progress)
    }

    #[tokio::test]
    async fn test_deploy_sequence_on_empty_cluster() {
        let cluster = Arc::new(MockCluster::default());
        let (orch, _) = orchestrator(&cluster);

        orch.deploy().await.unwrap();

        // 空集群上的完整序列：probe(h1), probe(h2), create, start
        let interesting = cluster.commands_matching(&["peer probe", "volume create", "volume start"]);
        assert_eq!(
            interesting,
            vec![
                "/usr/sbin/gluster peer probe h1".to_string(),
                "/usr/sbin/gluster peer probe h2".to_string(),
                "/usr/sbin/gluster volume create vol1 h1:10 h2:20".to_string(),
                "/usr/sbin/gluster volume start vol1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_deploy_probe_count_matches_data_nodes() {
        let cluster = Arc::new(MockCluster::default());
        let (orch, _) = orchestrator(&cluster);

        orch.deploy().await.unwrap();
        assert_eq!(cluster.commands_matching(&["peer probe"]).len(), 2);
    }

    #[tokio::test]
    async fn test_deploy_skips_existing_peer() {
        let cluster = Arc::new(MockCluster::default());
        cluster.add_peer("h1");
        let (orch, progress) = orchestrator(&cluster);

        orch.deploy().await.unwrap();

        let probes = cluster.commands_matching(&["peer probe"]);
        assert_eq!(probes, vec!["/usr/sbin/gluster peer probe h2".to_string()]);
        assert!(progress.contains("主机 h1 已在成员列表中"));
        // 已是成员的节点不进入建卷 brick 列表
        assert!(cluster
            .commands_matching(&["volume create"])
            .iter()
            .all(|c| !c.contains("h1:10")));
    }

    #[tokio::test]
    async fn test_deploy_twice_is_idempotent() {
        let cluster = Arc::new(MockCluster::default());
        let (orch, _) = orchestrator(&cluster);
        orch.deploy().await.unwrap();

        let before = cluster
            .commands_matching(&["peer probe", "volume create", "volume start"])
            .len();
        orch.deploy().await.unwrap();
        let after = cluster
            .commands_matching(&["peer probe", "volume create", "volume start"])
            .len();

        // 第二次部署全部步骤都被守卫跳过
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_port_assignment_in_config_order() {
        let cluster = Arc::new(MockCluster::default());
        let (orch, _) = orchestrator(&cluster);

        orch.deploy().await.unwrap();

        let rules = cluster.commands_matching(&["--dport 24009 ", "--dport 24010 "]);
        assert_eq!(
            rules,
            vec![
                "iptables -A INPUT -m state --state NEW -m tcp -p tcp --dport 24009 -j ACCEPT"
                    .to_string(),
                "iptables -A INPUT -m state --state NEW -m tcp -p tcp --dport 24010 -j ACCEPT"
                    .to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_check_servers_missing_binary_is_fatal() {
        let cluster = Arc::new(MockCluster::default());
        cluster.remove_binary("hm");
        let (orch, _) = orchestrator(&cluster);

        let err = orch.deploy().await.unwrap_err();
        assert!(err.is_precondition());
        // 失败发生在任何变更命令之前
        assert!(cluster
            .commands_matching(&["peer probe", "volume", "iptables", "glusterd"])
            .is_empty());
    }

    #[tokio::test]
    async fn test_undeploy_sequence_after_deploy() {
        let cluster = Arc::new(MockCluster::default());
        let (orch, _) = orchestrator(&cluster);
        orch.deploy().await.unwrap();
        cluster.clear_commands();

        orch.undeploy().await.unwrap();

        let interesting = cluster.commands_matching(&["volume stop", "volume delete", "peer detach"]);
        assert_eq!(
            interesting,
            vec![
                "yes | /usr/sbin/gluster volume stop vol1".to_string(),
                "yes | /usr/sbin/gluster volume delete vol1".to_string(),
                "gluster peer detach h1".to_string(),
                "gluster peer detach h2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_undeploy_on_empty_cluster_is_noop() {
        let cluster = Arc::new(MockCluster::default());
        let (orch, progress) = orchestrator(&cluster);

        orch.undeploy().await.unwrap();

        assert!(cluster
            .commands_matching(&["volume stop", "volume delete", "peer detach"])
            .is_empty());
        assert!(progress.contains("卷 vol1 不在启动状态"));
        assert!(progress.contains("卷 vol1 不存在"));
        assert!(progress.contains("h1 不属于当前集群"));
    }

    #[tokio::test]
    async fn test_undeploy_continues_after_stop_failure() {
        let cluster = Arc::new(MockCluster::default());
        let (orch, progress) = orchestrator(&cluster);
        orch.deploy().await.unwrap();
        cluster.clear_commands();
        cluster.fail_on("hm", "volume stop");

        // 停卷失败只记录通知，后续步骤照常执行
        orch.undeploy().await.unwrap();

        assert!(progress.contains("停止卷失败"));
        let rest = cluster.commands_matching(&["volume delete", "peer detach"]);
        assert_eq!(
            rest,
            vec![
                "yes | /usr/sbin/gluster volume delete vol1".to_string(),
                "gluster peer detach h1".to_string(),
                "gluster peer detach h2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_mount_continues_after_client_failure() {
        let cluster = Arc::new(MockCluster::default());
        cluster.fail_on("h3", "mount -t glusterfs");
        let topology = Topology::from_yaml(
            r#"
name: vol1
master: "m@hm"
dataNodes: "u@h1:10"
clients: "c@h3 c@h4"
"#,
        )
        .unwrap();
        let progress = Arc::new(MemoryProgress::default());
        let orch = GlusterOrchestrator::new(topology, cluster.clone(), progress.clone());

        orch.mount(MountAction::Mount).await.unwrap();

        // h3 挂载失败被报告，h4 仍然执行
        assert_eq!(cluster.commands_matching(&["mount -t glusterfs"]).len(), 2);
        assert!(progress.contains("客户端 h3 操作失败"));
        assert!(!cluster.is_mounted("h3", "/dfs"));
        assert!(cluster.is_mounted("h4", "/dfs"));
    }

    #[tokio::test]
    async fn test_mount_fans_out_to_clients() {
        let cluster = Arc::new(MockCluster::default());
        let (orch, _) = orchestrator(&cluster);

        orch.mount(MountAction::Mount).await.unwrap();

        let mounts = cluster.commands_matching(&["mount -t glusterfs"]);
        assert_eq!(mounts, vec!["mount -t glusterfs hm:/vol1 /dfs".to_string()]);
    }
}
