use std::fs;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use privchat_antispam::{
    cli::{Cli, Commands},
    config::{self, AntispamConfig},
    infra::metrics,
    logging,
    transport::TelegramClient,
    AntispamBot,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载 .env 文件（如果存在）
    let _ = dotenvy::dotenv();

    // 解析命令行参数
    let cli = Cli::parse();

    // 处理子命令
    if let Some(command) = &cli.command {
        match command {
            Commands::GenerateConfig { path } => return generate_config(path),
            Commands::ValidateConfig { path } => return validate_config(path),
            Commands::ShowConfig => return show_config(&cli),
        }
    }

    // 快速读取配置文件的 [logging] 段和 ANTISPAM_LOG_LEVEL（不加载完整配置）
    let early_log = config::load_early_logging_config(cli.config_file.as_deref());

    // 合并日志配置（优先级：CLI > 环境变量 > 配置文件 > 默认值）
    let log_level = cli
        .get_log_level()
        .or(early_log.level)
        .unwrap_or_else(|| "info".to_string());
    let log_format = cli.get_log_format().or(early_log.format);
    let log_file = cli.log_file.clone().or(early_log.file);

    let _log_guard = logging::init_logging(&log_level, log_format.as_deref(), log_file.as_deref(), cli.quiet)?;

    tracing::info!("🚀 Starting anti-spam bot...");

    // 加载配置（按优先级：命令行 > 环境变量 > 配置文件 > 默认值）
    let config = match AntispamConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ 加载配置失败: {:#}", e);
            process::exit(2);
        }
    };

    if config.metrics.enabled {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics.port));
        match metrics::init(addr) {
            Ok(()) => tracing::info!("📊 Metrics listening on {}", addr),
            Err(e) => tracing::warn!("⚠️ 监控指标初始化失败: {}", e),
        }
    }

    let bot = match AntispamBot::new(config) {
        Ok(bot) => bot,
        Err(e) => {
            tracing::error!("❌ 配置无效: {}", e);
            process::exit(2);
        }
    };

    let (mut poller, sender) = match connect(bot.config()).await {
        Ok(clients) => clients,
        Err(e) => {
            tracing::error!("❌ Configure: {}", e);
            process::exit(2);
        }
    };

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("🛑 收到退出信号，正在停止...");
        }
        signal_cancel.cancel();
    });

    if let Err(e) = bot.run(&mut poller, Arc::new(sender), cancel).await {
        tracing::error!("❌ Bot 运行失败: {}", e);
        process::exit(2);
    }

    Ok(())
}

/// 创建轮询和发送两个客户端，并用 getMe 校验 token
async fn connect(config: &AntispamConfig) -> privchat_antispam::Result<(TelegramClient, TelegramClient)> {
    let poller = TelegramClient::new(config.token.clone(), &config.telegram)?;
    let sender = TelegramClient::new(config.token.clone(), &config.telegram)?;
    poller.get_me().await?;
    Ok((poller, sender))
}

/// 生成默认配置文件
fn generate_config(path: &str) -> Result<()> {
    let default_config = r#"# PrivChat Antispam 配置文件
# 此文件由 privchat-antispam generate-config 生成

[bot]
# token 建议通过 ANTISPAM_TOKEN 环境变量注入
token = ""
# 只观察不警告
watch_only = true
warning_text = "Is it spam?"

[membership]
ttl_secs = 300
sweep_interval_secs = 60

[classifier]
# 空文本的转发消息（图片、贴纸等）是否参与判定
empty_text_eligible = true

[telegram]
api_base_url = "https://api.telegram.org"
poll_timeout_secs = 60

[metrics]
enabled = false
port = 9090

[logging]
level = "info"
format = "compact"
# file = "./logs/antispam.log"
"#;

    fs::write(path, default_config).with_context(|| format!("无法写入配置文件: {}", path))?;

    println!("✅ 配置文件已生成: {}", path);
    Ok(())
}

/// 验证配置文件
fn validate_config(path: &str) -> Result<()> {
    let config = AntispamConfig::from_toml_file(path)
        .with_context(|| format!("配置文件验证失败: {}", path))?;

    if let Err(e) = config.validate() {
        // token 可以由环境变量或命令行提供
        println!("⚠️ {}", e);
    }

    println!("✅ 配置文件有效: {}", path);
    println!("📊 配置摘要:");
    println!("  - Watch only: {}", config.watch_only);
    println!("  - Member TTL: {}s", config.membership.ttl_secs);
    println!("  - Sweep interval: {}s", config.membership.sweep_interval_secs);
    println!("  - Empty text eligible: {}", config.classifier.empty_text_eligible);

    Ok(())
}

/// 显示最终配置（合并后的配置）
fn show_config(cli: &Cli) -> Result<()> {
    // 初始化基本日志（用于显示配置）
    let _guard = logging::init_logging("info", None, None, false)?;

    let config = AntispamConfig::load(cli).context("加载配置失败")?;

    println!("📊 最终配置（合并后的配置）:");
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}
