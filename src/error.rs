use thiserror::Error;

/// 反垃圾服务错误类型
#[derive(Debug, Error)]
pub enum AntispamError {
    /// 配置错误
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// 网络/传输层错误
    #[error("Transport error: {0}")]
    Transport(String),
    /// Bot API 返回 ok=false
    #[error("Bot API error{}: {description}", .code.map(|c| format!(" {}", c)).unwrap_or_default())]
    Api {
        code: Option<i64>,
        description: String,
    },
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AntispamError {
    fn from(err: reqwest::Error) -> Self {
        // 请求 URL 中含有 Bot token，不能进入错误信息
        let err = err.without_url();
        if err.is_decode() {
            AntispamError::Serialization(err.to_string())
        } else {
            AntispamError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AntispamError {
    fn from(err: serde_json::Error) -> Self {
        AntispamError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AntispamError {
    fn from(err: std::io::Error) -> Self {
        AntispamError::Internal(err.to_string())
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AntispamError>;
