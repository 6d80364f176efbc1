//! 远端 CLI 输出解析
//!
//! gluster CLI 的文本输出格式是外部依赖，容易随版本漂移。相关的逐行
//! 扫描全部收在这里，编排逻辑不直接接触输出文本。

/// 判断某主机是否已在 `gluster peer status` 输出的成员列表中
///
/// 按 `Hostname: <host>` 子串匹配。这是既有约定：主机名互为前缀时
/// （如 h1 与 h10）子串也会命中，行为原样保留，不做收紧。
pub fn peer_listed(peer_status: &str, host: &str) -> bool {
    let needle = format!("Hostname: {}", host);
    peer_status.lines().any(|line| line.contains(&needle))
}

/// 判断 `gluster volume info` 输出描述的卷是否处于 Started 状态
pub fn volume_started(volume_info: &str) -> bool {
    volume_info
        .lines()
        .any(|line| line.trim() == "Status: Started")
}
