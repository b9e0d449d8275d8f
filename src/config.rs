use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize, Serializer};
use tracing::info;

use crate::error::AntispamError;
use crate::infra::{EventRouterConfig, DEFAULT_WARNING_TEXT};
use crate::security::EmptyTextPolicy;

/// 默认配置文件
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// 反垃圾 Bot 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntispamConfig {
    /// Bot API token
    #[serde(serialize_with = "redact_secret")]
    pub token: String,
    /// 观察模式：只判定和计数，不发送警告
    pub watch_only: bool,
    /// 警告文本
    pub warning_text: String,
    /// 成员表配置
    pub membership: MembershipConfig,
    /// 分类器配置
    pub classifier: ClassifierConfig,
    /// Telegram 接入配置
    pub telegram: TelegramConfig,
    /// 监控指标配置
    pub metrics: MetricsConfig,
    /// 日志级别
    pub log_level: String,
}

impl Default for AntispamConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            watch_only: true, // 默认只观察，确认误判率后再打开警告
            warning_text: DEFAULT_WARNING_TEXT.to_string(),
            membership: MembershipConfig::default(),
            classifier: ClassifierConfig::default(),
            telegram: TelegramConfig::default(),
            metrics: MetricsConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AntispamConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 新成员判定窗口
    pub fn ttl(&self) -> Duration {
        self.membership.ttl()
    }

    /// 清理间隔
    pub fn sweep_interval(&self) -> Duration {
        self.membership.sweep_interval()
    }

    pub fn empty_text_policy(&self) -> EmptyTextPolicy {
        EmptyTextPolicy::from_eligible(self.classifier.empty_text_eligible)
    }

    /// 路由器配置
    pub fn router_config(&self) -> EventRouterConfig {
        EventRouterConfig {
            watch_only: self.watch_only,
            warning_text: self.warning_text.clone(),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.token.is_empty() {
            return Err(AntispamError::Configuration(
                "Token must be specified".to_string(),
            ));
        }
        if self.membership.sweep_interval_secs == 0 {
            return Err(AntispamError::Configuration(
                "membership.sweep_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.telegram.api_base_url.is_empty() {
            return Err(AntispamError::Configuration(
                "telegram.api_base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// 从 TOML 文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("无法读取配置文件: {:?}", path.as_ref()))?;
        Self::from_toml_str(&content)
    }

    /// 从 TOML 文本解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let toml_config: TomlConfig = toml::from_str(content).with_context(|| "配置文件格式错误")?;
        Ok(toml_config.into())
    }

    /// 从环境变量合并配置（ANTISPAM_ 前缀）
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(token) = env::var("ANTISPAM_TOKEN").or_else(|_| env::var("TELEGRAM_BOT_TOKEN")) {
            self.token = token;
        }
        if let Ok(watch_only) = env::var("ANTISPAM_WATCH_ONLY") {
            self.watch_only = watch_only.parse().unwrap_or(self.watch_only);
        }
        if let Ok(warning_text) = env::var("ANTISPAM_WARNING_TEXT") {
            self.warning_text = warning_text;
        }
        if let Ok(ttl) = env::var("ANTISPAM_TTL_SECS") {
            self.membership.ttl_secs = ttl.parse().unwrap_or(self.membership.ttl_secs);
        }
        if let Ok(interval) = env::var("ANTISPAM_SWEEP_INTERVAL_SECS") {
            self.membership.sweep_interval_secs =
                interval.parse().unwrap_or(self.membership.sweep_interval_secs);
        }
        if let Ok(eligible) = env::var("ANTISPAM_EMPTY_TEXT_ELIGIBLE") {
            self.classifier.empty_text_eligible =
                eligible.parse().unwrap_or(self.classifier.empty_text_eligible);
        }
        if let Ok(base_url) = env::var("ANTISPAM_API_BASE_URL") {
            self.telegram.api_base_url = base_url;
        }
        if let Ok(log_level) = env::var("ANTISPAM_LOG_LEVEL") {
            self.log_level = log_level;
        }

        Ok(())
    }

    /// 从命令行参数合并配置
    pub fn merge_from_cli(&mut self, cli: &crate::cli::Cli) {
        if let Some(token) = &cli.token {
            self.token = token.clone();
        }
        if let Some(watch) = cli.watch {
            self.watch_only = watch;
        }
        if let Some(ttl) = cli.ttl_secs {
            self.membership.ttl_secs = ttl;
        }
        if let Some(interval) = cli.sweep_interval_secs {
            self.membership.sweep_interval_secs = interval;
        }
        if cli.enable_metrics {
            self.metrics.enabled = true;
        }
        if let Some(port) = cli.metrics_port {
            self.metrics.port = port;
        }
        if let Some(log_level) = cli.get_log_level() {
            self.log_level = log_level;
        }
    }

    /// 加载配置（按优先级：命令行 > 环境变量 > 配置文件 > 默认值）
    pub fn load(cli: &crate::cli::Cli) -> Result<Self> {
        // 1. 从配置文件加载（如果存在），否则使用默认值
        let mut config = if let Some(config_file) = &cli.config_file {
            if Path::new(config_file).exists() {
                info!("📄 从配置文件加载: {}", config_file);
                Self::from_toml_file(config_file)?
            } else {
                tracing::warn!("⚠️ 配置文件不存在: {}", config_file);
                Self::new()
            }
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            info!("📄 从默认配置文件加载: {}", DEFAULT_CONFIG_FILE);
            Self::from_toml_file(DEFAULT_CONFIG_FILE)?
        } else {
            Self::new()
        };

        // 2. 从环境变量合并（优先级高于配置文件）
        config.merge_from_env()?;

        // 3. 从命令行参数合并（最高优先级）
        config.merge_from_cli(cli);

        Ok(config)
    }
}

fn redact_secret<S: Serializer>(secret: &str, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if secret.is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str("***")
    }
}

/// 成员表配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipConfig {
    /// 新成员判定窗口（秒）
    pub ttl_secs: u64,
    /// 过期清理间隔（秒）
    pub sweep_interval_secs: u64,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            sweep_interval_secs: 60,
        }
    }
}

impl MembershipConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// 分类器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// 空文本的转发消息是否参与判定
    ///
    /// - true: 参与（默认，图片/贴纸转发同样会被标记）
    /// - false: 空文本直接放行
    pub empty_text_eligible: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            empty_text_eligible: true,
        }
    }
}

/// Telegram 接入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API 地址（可指向自建 Bot API server）
    pub api_base_url: String,
    /// getUpdates 长轮询超时（秒）
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 60,
        }
    }
}

/// 监控指标配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// 是否启用 Prometheus 指标
    pub enabled: bool,
    /// 监听端口
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9090,
        }
    }
}

/// TOML 配置文件结构（用于反序列化）
#[derive(Debug, Deserialize)]
struct TomlConfig {
    bot: Option<TomlBotConfig>,
    membership: Option<TomlMembershipConfig>,
    classifier: Option<TomlClassifierConfig>,
    telegram: Option<TomlTelegramConfig>,
    metrics: Option<TomlMetricsConfig>,
    logging: Option<TomlLoggingConfig>,
}

#[derive(Debug, Deserialize)]
struct TomlBotConfig {
    token: Option<String>,
    watch_only: Option<bool>,
    warning_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlMembershipConfig {
    ttl_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TomlClassifierConfig {
    empty_text_eligible: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct TomlTelegramConfig {
    api_base_url: Option<String>,
    poll_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TomlMetricsConfig {
    enabled: Option<bool>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlLoggingConfig {
    level: Option<String>,
    format: Option<String>,
    file: Option<String>,
}

impl From<TomlConfig> for AntispamConfig {
    fn from(toml: TomlConfig) -> Self {
        let mut config = Self::default();

        if let Some(bot) = toml.bot {
            if let Some(token) = bot.token {
                config.token = token;
            }
            if let Some(watch_only) = bot.watch_only {
                config.watch_only = watch_only;
            }
            if let Some(warning_text) = bot.warning_text {
                config.warning_text = warning_text;
            }
        }

        if let Some(membership) = toml.membership {
            if let Some(ttl) = membership.ttl_secs {
                config.membership.ttl_secs = ttl;
            }
            if let Some(interval) = membership.sweep_interval_secs {
                config.membership.sweep_interval_secs = interval;
            }
        }

        if let Some(classifier) = toml.classifier {
            if let Some(eligible) = classifier.empty_text_eligible {
                config.classifier.empty_text_eligible = eligible;
            }
        }

        if let Some(telegram) = toml.telegram {
            if let Some(base_url) = telegram.api_base_url {
                config.telegram.api_base_url = base_url;
            }
            if let Some(timeout) = telegram.poll_timeout_secs {
                config.telegram.poll_timeout_secs = timeout;
            }
        }

        if let Some(metrics) = toml.metrics {
            if let Some(enabled) = metrics.enabled {
                config.metrics.enabled = enabled;
            }
            if let Some(port) = metrics.port {
                config.metrics.port = port;
            }
        }

        if let Some(level) = toml.logging.and_then(|l| l.level) {
            config.log_level = level;
        }

        config
    }
}

/// 日志初始化前需要的配置
#[derive(Debug, Clone, Default)]
pub struct EarlyLoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
    pub file: Option<String>,
}

/// 只读取配置文件的 [logging] 段，文件不存在或格式错误时返回空配置。
/// `ANTISPAM_LOG_LEVEL` 优先于配置文件中的 level。
pub fn load_early_logging_config(config_file: Option<&str>) -> EarlyLoggingConfig {
    #[derive(Deserialize)]
    struct LoggingOnly {
        logging: Option<TomlLoggingConfig>,
    }

    let path = config_file.unwrap_or(DEFAULT_CONFIG_FILE);
    let logging = fs::read_to_string(path)
        .ok()
        .and_then(|content| toml::from_str::<LoggingOnly>(&content).ok())
        .and_then(|parsed| parsed.logging)
        .unwrap_or_default();

    early_logging_from(logging, env::var("ANTISPAM_LOG_LEVEL").ok())
}

fn early_logging_from(logging: TomlLoggingConfig, env_level: Option<String>) -> EarlyLoggingConfig {
    EarlyLoggingConfig {
        level: env_level.filter(|level| !level.is_empty()).or(logging.level),
        format: logging.format,
        file: logging.file,
    }
}
