//! Lustre 集群编排
//!
//! MDT（元数据目标，兼做 MGS）落在协调节点，每个数据节点承载一个 OST。
//! 初始化/清理都是同一套保护模式：挂载点已挂载才卸载，然后格式化、
//! 重新挂载。格式化对目标设备是破坏性且不可逆的。

use std::sync::Arc;
use tracing::warn;

use dfs_ssh_executor::CommandOutput;

use crate::command::LustreCmd;
use crate::error::{DeployError, Result};
use crate::mount::{MountAction, MountManager, CLIENT_MOUNT_POINT};
use crate::preflight::PreflightChecker;
use crate::runner::{ProgressSink, RemoteRunner};
use crate::topology::{NodeRef, Topology};

/// MDT 挂载点
const MDT_MOUNT_POINT: &str = "/mnt/mdt";
/// OST 挂载点
const OST_MOUNT_POINT: &str = "/mnt/ost";
/// dataDir 未配置时的默认目标设备
const DEFAULT_DEVICE: &str = "/dev/sda5";
/// 前置检查的必需二进制
const LUSTRE_BINARY: &str = "/usr/sbin/mkfs.lustre";
/// 内核导出的健康状态文件，首行原样即健康字符串
const HEALTH_FILE: &str = "/proc/fs/lustre/health_check";

/// Lustre 编排器
pub struct LustreOrchestrator {
    topology: Topology,
    runner: Arc<dyn RemoteRunner>,
    progress: Arc<dyn ProgressSink>,
    preflight: PreflightChecker,
}

impl LustreOrchestrator {
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

    fn device(&self) -> &str {
        self.topology.data_dir.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    /// 解析协调节点（MGS）的网络地址
    ///
    /// 每次现查，不缓存；优先 IPv4。
    pub async fn mgs_addr(&self) -> Result<String> {
        let host = self.topology.master.host.as_str();
        let addrs: Vec<_> = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|_| DeployError::Resolve(host.to_string()))?
            .collect();

        addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .map(|a| a.ip().to_string())
            .ok_or_else(|| DeployError::Resolve(host.to_string()))
    }

    /// 检查协调节点和全部数据节点是否具备 mkfs.lustre
    pub async fn check_servers(&self) -> Result<()> {
        let mut missing = Vec::new();

        for node in std::iter::once(&self.topology.master).chain(self.topology.data_nodes.iter()) {
            if !self.preflight.has_file(LUSTRE_BINARY, node).await? {
                self.progress
                    .notice(&format!("节点 {} 未安装 lustre 文件系统", node.host));
                missing.push(node.host.clone());
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DeployError::Precondition {
                binary: LUSTRE_BINARY.to_string(),
                nodes: missing,
            })
        }
    }

    /// 部署集群：先建 MDT，再逐个建 OST
    pub async fn deploy(&self) -> Result<()> {
        self.progress.notice("检查配置文件中的各节点...");
        self.check_servers().await?;

        self.progress.notice(&format!(
            "正在初始化 MDT 服务节点 {}，该操作可能耗时较长...",
            self.topology.master.host
        ));
        self.init_mdt_server().await?;

        for node in &self.topology.data_nodes {
            self.progress.notice(&format!(
                "正在初始化 OST 服务节点 {}，该操作可能耗时较长...",
                node.host
            ));
            self.init_ost_server(node).await?;
        }
        Ok(())
    }

    /// 卸载集群：清理 MDT 与各 OST，尽力而为
    pub async fn undeploy(&self) -> Result<()> {
        self.progress.notice("正在卸载 lustre 文件系统");

        self.progress.notice(&format!(
            "清理 MDT 服务节点: {}",
            self.topology.master.host
        ));
        if let Err(e) = self.clean_mdt_server().await {
            warn!("{}", e);
            self.progress.notice(&format!("{}", e));
        }

        for node in &self.topology.data_nodes {
            self.progress
                .notice(&format!("清理 lustre 存储节点 {}", node.host));
            if let Err(e) = self.clean_ost_server(node).await {
                warn!("{}", e);
                self.progress.notice(&format!("{}", e));
            }
        }
        Ok(())
    }

    /// 报告各节点的健康状态
    pub async fn check(&self) -> Result<()> {
        self.check_servers().await?;

        let master = &self.topology.master;
        let health = self.check_server_health(master).await?;
        self.progress
            .notice(&format!("mdt 服务节点 ({}) 状态: {}", master.host, health));

        for node in &self.topology.data_nodes {
            let health = self.check_server_health(node).await?;
            self.progress
                .notice(&format!("ost 服务节点 ({}) 状态: {}", node.host, health));
        }
        Ok(())
    }

    /// 读取节点健康状态文件的首行，原样返回
    pub async fn check_server_health(&self, node: &NodeRef) -> Result<String> {
        self.runner.read_first_line(HEALTH_FILE, node).await
    }

    /// 初始化 MDT：格式化协调节点设备并挂载
    pub async fn init_mdt_server(&self) -> Result<()> {
        let master = &self.topology.master;
        let context = format!("初始化 MDT 服务失败 ({})", master.host);

        self.umount_if_mounted("/tmp", master, &context).await?;
        for cmd in [
            LustreCmd::MkdirMountPoint {
                path: MDT_MOUNT_POINT.to_string(),
            },
            LustreCmd::FormatMdt {
                fsname: self.topology.name.clone(),
                device: self.device().to_string(),
            },
            LustreCmd::MountLustreDevice {
                device: self.device().to_string(),
                path: MDT_MOUNT_POINT.to_string(),
            },
        ] {
            self.run(&cmd, master, &context).await?;
        }
        Ok(())
    }

    /// 初始化单个 OST：格式化数据节点设备并挂载，指向 MGS
    pub async fn init_ost_server(&self, node: &NodeRef) -> Result<()> {
        let context = format!("初始化 OST 服务失败 ({})", node.host);
        let mgs_addr = self.mgs_addr().await?;

        self.umount_if_mounted("/tmp", node, &context).await?;
        for cmd in [
            LustreCmd::MkdirMountPoint {
                path: OST_MOUNT_POINT.to_string(),
            },
            LustreCmd::FormatOst {
                fsname: self.topology.name.clone(),
                mgs_addr,
                device: self.device().to_string(),
            },
            LustreCmd::MountLustreDevice {
                device: self.device().to_string(),
                path: OST_MOUNT_POINT.to_string(),
            },
        ] {
            self.run(&cmd, node, &context).await?;
        }
        Ok(())
    }

    /// 清理 MDT：卸载后把设备刷回临时盘
    pub async fn clean_mdt_server(&self) -> Result<()> {
        let master = &self.topology.master;
        let context = format!("清理 MDT 服务失败 ({})", master.host);
        self.clean_server(MDT_MOUNT_POINT, master, &context).await
    }

    /// 清理单个 OST
    pub async fn clean_ost_server(&self, node: &NodeRef) -> Result<()> {
        let context = format!("清理 lustre 存储节点失败 ({})", node.host);
        self.clean_server(OST_MOUNT_POINT, node, &context).await
    }

    async fn clean_server(&self, mount_point: &str, node: &NodeRef, context: &str) -> Result<()> {
        self.umount_if_mounted(mount_point, node, context).await?;
        self.umount_if_mounted("/tmp", node, context).await?;
        for cmd in [
            LustreCmd::FormatScratch {
                device: self.device().to_string(),
            },
            LustreCmd::MountScratch {
                device: self.device().to_string(),
            },
        ] {
            self.run(&cmd, node, context).await?;
        }
        Ok(())
    }

    /// 在所有客户端节点上挂载/卸载文件系统
    pub async fn mount(&self, action: MountAction) -> Result<()> {
        let mount_cmd = format!(
            "mount -t lustre {}:/{} {}",
            self.mgs_addr().await?,
            self.topology.name,
            CLIENT_MOUNT_POINT
        );
        MountManager::new(self.runner.clone(), self.progress.clone())
            .apply(action, &self.topology.clients, &mount_cmd, "Lustre")
            .await
    }

    /// 守卫式卸载：路径当前已挂载才执行 umount
    async fn umount_if_mounted(&self, path: &str, node: &NodeRef, context: &str) -> Result<()> {
        if self.preflight.has_mount(path, node).await? {
            self.run(
                &LustreCmd::Umount {
                    path: path.to_string(),
                },
                node,
                context,
            )
            .await?;
        }
        Ok(())
    }

    async fn run(&self, cmd: &LustreCmd, node: &NodeRef, context: &str) -> Result<CommandOutput> {
        let output = self.runner.exec(&cmd.render(), node).await?;
        if !output.is_success() {
            return Err(DeployError::remote(context, output.combined_output()));
        }
        Ok(output)
    }
}
