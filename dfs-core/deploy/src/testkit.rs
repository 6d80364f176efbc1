//! 测试替身
//!
//! `MockCluster` 模拟一个远端集群：记录每条下发的命令，并对状态查询
//! （成员列表、卷状态、挂载点、二进制存在性）按内部状态作答。变更命令
//! 会推进内部状态，这样幂等性质可以直接在两次编排之间断言。

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use dfs_ssh_executor::CommandOutput;

use crate::runner::{ProgressSink, RemoteRunner};
use crate::topology::NodeRef;
use crate::Result;

fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: Some(0),
    }
}

fn fail(stderr: &str) -> CommandOutput {
    CommandOutput {
        stdout: String::new(),
        stderr: stderr.to_string(),
        exit_code: Some(1),
    }
}

/// 模拟集群状态
#[derive(Default)]
struct ClusterState {
    commands: Vec<String>,
    peers: HashSet<String>,
    hosts_without_binary: HashSet<String>,
    volume_exists: bool,
    volume_running: bool,
    mounts: HashSet<(String, String)>,
    /// 注入的失败规则：(host, 命令片段)，命中即返回失败且不推进状态
    failures: Vec<(String, String)>,
}

/// 模拟远端集群
#[derive(Default)]
pub struct MockCluster {
    state: Mutex<ClusterState>,
    /// 健康状态文件的首行内容
    pub health_line: Mutex<String>,
}

impl MockCluster {
    /// 预置一个已加入集群的成员
    pub fn add_peer(&self, host: &str) {
        self.state.lock().unwrap().peers.insert(host.to_string());
    }

    /// 预置某主机缺少必需二进制
    pub fn remove_binary(&self, host: &str) {
        self.state
            .lock()
            .unwrap()
            .hosts_without_binary
            .insert(host.to_string());
    }

    /// 注入失败：指定主机上包含该片段的命令一律返回失败
    pub fn fail_on(&self, host: &str, fragment: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((host.to_string(), fragment.to_string()));
    }

    /// 预置某主机上的挂载点
    pub fn add_mount(&self, host: &str, path: &str) {
        self.state
            .lock()
            .unwrap()
            .mounts
            .insert((host.to_string(), path.to_string()));
    }

    /// 查询某主机上的路径是否处于挂载状态
    pub fn is_mounted(&self, host: &str, path: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .mounts
            .contains(&(host.to_string(), path.to_string()))
    }

    /// 清空命令记录（保留集群状态）
    pub fn clear_commands(&self) {
        self.state.lock().unwrap().commands.clear();
    }

    /// 全部命令记录
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    /// 按记录顺序返回包含任一片段的命令
    pub fn commands_matching(&self, fragments: &[&str]) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .commands
            .iter()
            .filter(|c| fragments.iter().any(|f| c.contains(f)))
            .cloned()
            .collect()
    }

    fn respond(&self, command: &str, node: &NodeRef) -> CommandOutput {
        let mut state = self.state.lock().unwrap();

        // 只读探测：不记入命令日志，日志只保留实际下发的变更命令
        if let Some(rest) = command.strip_prefix("test -e ") {
            let path = rest.split(" && ").next().unwrap_or("");
            let present = if path.contains("/vols/") {
                state.volume_exists
            } else {
                !state.hosts_without_binary.contains(&node.host)
            };
            return ok(if present { "1" } else { "0" });
        }
        if let Some(path) = command.strip_prefix("mountpoint -q ") {
            return if state.mounts.contains(&(node.host.clone(), path.to_string())) {
                ok("")
            } else {
                fail("not a mountpoint")
            };
        }
        if command.contains("peer status") {
            let listing: String = state
                .peers
                .iter()
                .map(|p| format!("Hostname: {}\nState: Peer in Cluster (Connected)\n", p))
                .collect();
            return ok(&format!("Number of Peers: {}\n{}", state.peers.len(), listing));
        }
        if command.contains("volume info") {
            if !state.volume_exists {
                return fail("Volume does not exist");
            }
            let status = if state.volume_running {
                "Started"
            } else {
                "Created"
            };
            return ok(&format!("Volume Name: vol1\nStatus: {}\n", status));
        }

        state.commands.push(command.to_string());

        // 命中注入的失败规则：命令已记录，但状态不推进
        if state
            .failures
            .iter()
            .any(|(host, fragment)| node.host == *host && command.contains(fragment))
        {
            return fail("simulated failure");
        }

        // 变更命令推进模拟状态
        if command.contains("peer probe") {
            if let Some(host) = command.split_whitespace().last() {
                state.peers.insert(host.to_string());
            }
        } else if command.contains("peer detach") {
            if let Some(host) = command.split_whitespace().last() {
                state.peers.remove(host);
            }
        } else if command.contains("volume create") {
            state.volume_exists = true;
        } else if command.contains("volume start") {
            state.volume_running = true;
        } else if command.contains("volume stop") {
            state.volume_running = false;
        } else if command.contains("volume delete") {
            state.volume_exists = false;
        } else if let Some(path) = command.strip_prefix("umount ") {
            state.mounts.remove(&(node.host.clone(), path.to_string()));
        } else if command.starts_with("mount -t lustre ") || command.starts_with("mount -t glusterfs ")
        {
            if let Some(path) = command.split_whitespace().last() {
                state.mounts.insert((node.host.clone(), path.to_string()));
            }
        } else if command.starts_with("mount ") && command.ends_with(" /tmp") {
            state.mounts.insert((node.host.clone(), "/tmp".to_string()));
        }

        ok("")
    }
}

#[async_trait]
impl RemoteRunner for MockCluster {
    async fn exec(&self, command: &str, node: &NodeRef) -> Result<CommandOutput> {
        Ok(self.respond(command, node))
    }

    async fn read_first_line(&self, path: &str, node: &NodeRef) -> Result<String> {
        self.state
            .lock()
            .unwrap()
            .commands
            .push(format!("read {} @{}", path, node.host));
        Ok(self.health_line.lock().unwrap().clone())
    }
}

/// 捕获进度通知的内存实现
#[derive(Default)]
pub struct MemoryProgress {
    notices: Mutex<Vec<String>>,
}

impl MemoryProgress {
    /// 是否出现过包含指定片段的通知
    pub fn contains(&self, fragment: &str) -> bool {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .any(|n| n.contains(fragment))
    }

    /// 全部通知
    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }
}

impl ProgressSink for MemoryProgress {
    fn notice(&self, msg: &str) {
        self.notices.lock().unwrap().push(msg.to_string());
    }
}
