//! 集群拓扑配置
//!
//! 从 YAML 文档解析出固定形状的拓扑记录。必填字段在解析期校验，
//! 而不是等到首次访问（动态哈希记录的老毛病）。解析本身无副作用，
//! 拓扑一经装载在整次编排运行期间不可变。

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("读取配置文件失败: {0}")]
    Io(#[from] std::io::Error),

    /// YAML 解析失败
    #[error("解析配置失败: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// 必填字段为空
    #[error("配置字段 {0} 不能为空")]
    EmptyField(&'static str),

    /// 节点描述格式错误（应为 user@host[:extra]）
    #[error("节点描述格式错误: {0:?} (应为 user@host[:extra])")]
    MalformedNode(String),
}

/// 远程节点引用
///
/// 由 `user@host[:extra]` 解析而来。extra 字段按技术含义不同：
/// Gluster 数据节点为存储空间描述（brick 路径），其余节点无 extra。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    /// SSH 用户名
    pub user: String,
    /// 主机名/IP
    pub host: String,
    /// 每种技术自定义的附加字段
    pub extra: Option<String>,
}

impl NodeRef {
    /// 解析 `user@host[:extra]` 形式的节点描述
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let (user, rest) = spec
            .split_once('@')
            .ok_or_else(|| ConfigError::MalformedNode(spec.to_string()))?;

        let (host, extra) = match rest.split_once(':') {
            Some((host, extra)) => (host, Some(extra.to_string())),
            None => (rest, None),
        };

        if user.is_empty() || host.is_empty() {
            return Err(ConfigError::MalformedNode(spec.to_string()));
        }

        Ok(Self {
            user: user.to_string(),
            host: host.to_string(),
            extra,
        })
    }

    fn parse_list(specs: &str) -> Result<Vec<Self>, ConfigError> {
        specs.split_whitespace().map(Self::parse).collect()
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.host)
    }
}

/// 原始 YAML 文档
#[derive(Debug, Deserialize)]
struct RawTopology {
    /// 卷名
    name: String,
    /// 原样传给 volume create 的自由选项串
    #[serde(default)]
    options: String,
    /// 协调节点（user@host）
    master: String,
    /// 数据节点列表（空格分隔）
    #[serde(rename = "dataNodes")]
    data_nodes: String,
    /// 客户端节点列表（空格分隔）
    #[serde(default)]
    clients: String,
    /// Lustre 目标设备（可选，默认 /dev/sda5）
    #[serde(rename = "dataDir", default)]
    data_dir: Option<String>,
}

/// 集群拓扑
///
/// 每次编排调用创建一份，进程退出即丢弃；解析完成后只读。
#[derive(Debug, Clone)]
pub struct Topology {
    /// 卷名
    pub name: String,
    /// volume create 附加选项
    pub options: String,
    /// 协调节点
    pub master: NodeRef,
    /// 数据节点，配置顺序即探测/端口分配顺序
    pub data_nodes: Vec<NodeRef>,
    /// 客户端节点
    pub clients: Vec<NodeRef>,
    /// Lustre 目标设备
    pub data_dir: Option<String>,
}

impl Topology {
    /// 从 YAML 文本解析拓扑
    pub fn from_yaml(doc: &str) -> Result<Self, ConfigError> {
        let raw: RawTopology = serde_yaml::from_str(doc)?;

        if raw.name.trim().is_empty() {
            return Err(ConfigError::EmptyField("name"));
        }
        if raw.master.trim().is_empty() {
            return Err(ConfigError::EmptyField("master"));
        }
        if raw.data_nodes.trim().is_empty() {
            return Err(ConfigError::EmptyField("dataNodes"));
        }

        Ok(Self {
            name: raw.name,
            options: raw.options,
            master: NodeRef::parse(raw.master.trim())?,
            data_nodes: NodeRef::parse_list(&raw.data_nodes)?,
            clients: NodeRef::parse_list(&raw.clients)?,
            data_dir: raw.data_dir.filter(|d| !d.trim().is_empty()),
        })
    }

    /// 从配置文件加载拓扑
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_ref() {
        let node = NodeRef::parse("alice@host1").unwrap();
        assert_eq!(node.user, "alice");
        assert_eq!(node.host, "host1");
        assert_eq!(node.extra, None);
    }

    #[test]
    fn test_parse_node_ref_with_extra() {
        let node = NodeRef::parse("root@node-2:/srv/brick1").unwrap();
        assert_eq!(node.user, "root");
        assert_eq!(node.host, "node-2");
        assert_eq!(node.extra.as_deref(), Some("/srv/brick1"));
    }

    #[test]
    fn test_parse_node_ref_malformed() {
        assert!(NodeRef::parse("no-separator").is_err());
        assert!(NodeRef::parse("@host").is_err());
        assert!(NodeRef::parse("user@").is_err());
        assert!(NodeRef::parse("user@:extra").is_err());
    }

    #[test]
    fn test_topology_from_yaml() {
        let doc = r#"
name: vol1
options: "replica 2"
master: "alice@host1"
dataNodes: "u@h1:10 u@h2:20"
clients: "c@h3"
"#;
        let topology = Topology::from_yaml(doc).unwrap();
        assert_eq!(topology.name, "vol1");
        assert_eq!(topology.options, "replica 2");
        assert_eq!(topology.master.user, "alice");
        assert_eq!(topology.master.host, "host1");
        assert_eq!(topology.data_nodes.len(), 2);
        assert_eq!(topology.data_nodes[0].host, "h1");
        assert_eq!(topology.data_nodes[0].extra.as_deref(), Some("10"));
        assert_eq!(topology.data_nodes[1].extra.as_deref(), Some("20"));
        assert_eq!(topology.clients.len(), 1);
        assert_eq!(topology.clients[0].host, "h3");
    }

    #[test]
    fn test_topology_lustre_fields() {
        let doc = r#"
name: lfs
master: "root@mds1"
dataNodes: "root@oss1 root@oss2"
dataDir: /dev/sdb1
"#;
        let topology = Topology::from_yaml(doc).unwrap();
        assert_eq!(topology.data_dir.as_deref(), Some("/dev/sdb1"));
        assert!(topology.clients.is_empty());
        assert_eq!(topology.options, "");
    }

    #[test]
    fn test_topology_missing_fields() {
        // master 缺失由 serde 拒绝
        assert!(Topology::from_yaml("name: v\ndataNodes: \"a@b\"").is_err());
        // dataNodes 空串视为缺失
        assert!(Topology::from_yaml("name: v\nmaster: a@b\ndataNodes: \"\"").is_err());
    }

    #[test]
    fn test_topology_malformed_data_node() {
        let doc = "name: v\nmaster: a@b\ndataNodes: \"a@b badnode\"";
        assert!(matches!(
            Topology::from_yaml(doc),
            Err(ConfigError::MalformedNode(_))
        ));
    }
}
