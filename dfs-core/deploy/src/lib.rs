//! DFS 部署编排库
//!
//! 按固定顺序在远程节点上执行 shell 命令，部署/卸载分布式文件系统集群。
//! 真正的文件系统工作（复制、元数据、一致性）由远端的 gluster/lustre
//! 守护进程完成，本库只负责编排：
//! - 解析 YAML 拓扑（卷名、协调节点、数据节点、客户端节点）
//! - 前置检查（远端二进制/挂载点是否存在）
//! - 幂等保护：每个变更步骤之前先查询远端状态，已达目标则跳过
//!
//! # 示例
//!
//! ```ignore
//! use std::sync::Arc;
//! use dfs_deploy::{GlusterOrchestrator, SshRunner, StdoutProgress, Topology};
//!
//! let topology = Topology::from_file("config/gluster.yaml")?;
//! let runner = Arc::new(SshRunner::with_default_key());
//! let orchestrator = GlusterOrchestrator::new(topology, runner, Arc::new(StdoutProgress));
//! orchestrator.deploy().await?;
//! ```

mod command;
mod error;
mod gluster;
mod lustre;
mod mount;
mod parser;
mod preflight;
mod runner;
mod topology;

#[cfg(test)]
pub(crate) mod testkit;

pub use command::{GlusterCmd, LustreCmd};
pub use error::{DeployError, Result};
pub use gluster::GlusterOrchestrator;
pub use lustre::LustreOrchestrator;
pub use mount::{MountAction, MountManager};
pub use preflight::PreflightChecker;
pub use runner::{ProgressSink, RemoteRunner, SshRunner, StdoutProgress};
pub use topology::{ConfigError, NodeRef, Topology};
