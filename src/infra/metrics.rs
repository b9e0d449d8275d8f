//! Prometheus 指标：垃圾消息检测量、警告发送结果、成员表大小等
//!
//! 未调用 `init()` 时 `metrics` 宏为空操作，测试中无需安装 Recorder。

use std::net::SocketAddr;

/// 指标名称
const COUNTER_SPAM_DETECTED: &str = "antispam_spam_detected_total";
const COUNTER_WARNINGS_SENT: &str = "antispam_warnings_sent_total";
const COUNTER_WARNINGS_FAILED: &str = "antispam_warnings_failed_total";
const COUNTER_UPDATES_DROPPED: &str = "antispam_updates_dropped_total";
const COUNTER_MEMBERS_EVICTED: &str = "antispam_members_evicted_total";
const GAUGE_MEMBERS_TRACKED: &str = "antispam_members_tracked";

/// 安装全局 Recorder 并在 `addr` 上暴露 `/metrics`。
/// 仅需在进程内调用一次；重复调用会返回 Err。
pub fn init(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    Ok(())
}

/// 记录一次垃圾消息检测
pub fn record_spam_detected() {
    metrics::counter!(COUNTER_SPAM_DETECTED).increment(1);
}

/// 记录警告发送结果
pub fn record_warning(sent: bool) {
    if sent {
        metrics::counter!(COUNTER_WARNINGS_SENT).increment(1);
    } else {
        metrics::counter!(COUNTER_WARNINGS_FAILED).increment(1);
    }
}

/// 记录无法识别发送者而被丢弃的 Update
pub fn record_update_dropped() {
    metrics::counter!(COUNTER_UPDATES_DROPPED).increment(1);
}

/// 记录一次清理的结果
pub fn record_sweep(evicted: usize, remaining: usize) {
    metrics::counter!(COUNTER_MEMBERS_EVICTED).increment(evicted as u64);
    metrics::gauge!(GAUGE_MEMBERS_TRACKED).set(remaining as f64);
}
