//! CLI 命令处理模块

pub mod common; // 公共选项与工具函数
pub mod gluster;
pub mod lustre;
