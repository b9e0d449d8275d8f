use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 初始化日志系统
///
/// 指定 `log_file` 时日志按天滚动写入文件，返回的 guard 需要保持到进程退出，
/// 否则缓冲中的日志会丢失。
pub fn init_logging(
    log_level: &str,
    log_format: Option<&str>,
    log_file: Option<&str>,
    quiet: bool,
) -> Result<Option<WorkerGuard>> {
    // 如果静默模式，只输出错误
    let level = if quiet { "error" } else { log_level };

    // 解析日志级别
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (writer, guard) = match log_file {
        Some(path) => {
            let path = Path::new(path);
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "antispam.log".to_string());
            let appender = tracing_appender::rolling::daily(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (Some(non_blocking), Some(guard))
        }
        None => (None, None),
    };

    // 根据格式选择不同的输出方式
    let layer = match (log_format, writer) {
        // JSON 格式（适合生产环境）
        (Some("json"), Some(w)) => fmt::layer().json().with_writer(w).boxed(),
        (Some("json"), None) => fmt::layer().json().boxed(),
        // Pretty 格式（适合开发环境）
        (Some("pretty") | Some("dev"), Some(w)) => fmt::layer().pretty().with_ansi(false).with_writer(w).boxed(),
        (Some("pretty") | Some("dev"), None) => fmt::layer().pretty().boxed(),
        // Compact 格式（默认）
        (_, Some(w)) => fmt::layer().compact().with_ansi(false).with_writer(w).boxed(),
        (_, None) => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()?;

    Ok(guard)
}
