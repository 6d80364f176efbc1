//! 远程命令构造
//!
//! 把对远端工具的每次调用表示成结构化命令，`render()` 时才拼出 shell
//! 字符串。测试断言结构化命令即可，不必逐字符比对格式化结果。

use std::fmt;

/// Gluster 起始数据端口，按数据节点在配置中的顺序逐一递增。
/// 用 u32 计算，节点序号再大也不会回绕。
pub const GLUSTER_BASE_PORT: u32 = 24009;

/// gluster CLI 路径，同时也是前置检查的必需二进制
pub const GLUSTER_BINARY: &str = "/usr/sbin/gluster";

/// GlusterFS 远程命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlusterCmd {
    /// 重启 glusterd 服务
    ServiceRestart,
    /// 停止 glusterd 服务
    ServiceStop,
    /// 探测加入一个存储节点
    PeerProbe { host: String },
    /// 将一个存储节点移出集群
    PeerDetach { host: String },
    /// 查询集群成员列表
    PeerStatus,
    /// 查询卷信息
    VolumeInfo { name: String },
    /// 创建卷，bricks 为 host:space 形式的列表
    VolumeCreate {
        name: String,
        options: String,
        bricks: Vec<String>,
    },
    /// 启动卷
    VolumeStart { name: String },
    /// 停止卷（gluster 会交互确认，用 yes 直通）
    VolumeStop { name: String },
    /// 删除卷
    VolumeDelete { name: String },
    /// 放行全部 tcp 入站
    FirewallOpenAll,
    /// 放行单个端口
    FirewallOpenPort { port: u32 },
    /// 放行端口区间
    FirewallOpenRange { from: u16, to: u16 },
}

impl GlusterCmd {
    /// 渲染成远端执行的 shell 命令
    pub fn render(&self) -> String {
        match self {
            Self::ServiceRestart => "/etc/init.d/glusterd restart".to_string(),
            Self::ServiceStop => "/etc/init.d/glusterd stop".to_string(),
            Self::PeerProbe { host } => format!("{} peer probe {}", GLUSTER_BINARY, host),
            // detach 历来走 PATH 上的 gluster，与其余命令的全路径写法不同
            Self::PeerDetach { host } => format!("gluster peer detach {}", host),
            Self::PeerStatus => format!("{} peer status", GLUSTER_BINARY),
            Self::VolumeInfo { name } => format!("{} volume info {}", GLUSTER_BINARY, name),
            Self::VolumeCreate {
                name,
                options,
                bricks,
            } => {
                let mut cmd = format!("{} volume create {}", GLUSTER_BINARY, name);
                if !options.is_empty() {
                    cmd.push(' ');
                    cmd.push_str(options);
                }
                for brick in bricks {
                    cmd.push(' ');
                    cmd.push_str(brick);
                }
                cmd
            }
            Self::VolumeStart { name } => format!("{} volume start {}", GLUSTER_BINARY, name),
            Self::VolumeStop { name } => {
                format!("yes | {} volume stop {}", GLUSTER_BINARY, name)
            }
            Self::VolumeDelete { name } => {
                format!("yes | {} volume delete {}", GLUSTER_BINARY, name)
            }
            Self::FirewallOpenAll => "iptables -A INPUT -m tcp -p tcp -j ACCEPT".to_string(),
            Self::FirewallOpenPort { port } => format!(
                "iptables -A INPUT -m state --state NEW -m tcp -p tcp --dport {} -j ACCEPT",
                port
            ),
            Self::FirewallOpenRange { from, to } => format!(
                "iptables -A INPUT -m state --state NEW -m tcp -p tcp --dport {}:{} -j ACCEPT",
                from, to
            ),
        }
    }
}

impl fmt::Display for GlusterCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Lustre 远程命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LustreCmd {
    /// 卸载一个挂载点
    Umount { path: String },
    /// 建立挂载点目录
    MkdirMountPoint { path: String },
    /// 将设备格式化为 MDT（兼做 MGS）
    FormatMdt { fsname: String, device: String },
    /// 将设备格式化为 OST，指向 MGS 地址
    FormatOst {
        fsname: String,
        mgs_addr: String,
        device: String,
    },
    /// 清场：把设备重刷成 ext3 临时盘
    FormatScratch { device: String },
    /// 以 lustre 类型挂载设备
    MountLustreDevice { device: String, path: String },
    /// 把临时盘挂回 /tmp
    MountScratch { device: String },
}

impl LustreCmd {
    /// 渲染成远端执行的 shell 命令
    pub fn render(&self) -> String {
        match self {
            Self::Umount { path } => format!("umount {}", path),
            Self::MkdirMountPoint { path } => format!("mkdir -p {}", path),
            Self::FormatMdt { fsname, device } => {
                format!("mkfs.lustre --fsname {} --mdt --mgs {}", fsname, device)
            }
            Self::FormatOst {
                fsname,
                mgs_addr,
                device,
            } => format!(
                "mkfs.lustre --fsname {} --ost --mgsnode={}@tcp0 {}",
                fsname, mgs_addr, device
            ),
            Self::FormatScratch { device } => format!(
                "mkfs.ext3 -m 0 -E lazy_itable_init=1 -O uninit_bg {}",
                device
            ),
            Self::MountLustreDevice { device, path } => {
                format!("mount -t lustre {} {}", device, path)
            }
            Self::MountScratch { device } => format!("mount {} /tmp", device),
        }
    }
}

impl fmt::Display for LustreCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
