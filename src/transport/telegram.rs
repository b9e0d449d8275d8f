use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use super::provider_trait::{UpdateSource, WarningSender};
use crate::config::TelegramConfig;
use crate::error::{AntispamError, Result};
use crate::model::{ChatId, Update};

/// HTTP 超时在长轮询超时基础上留出的余量
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// Bot API 统一响应格式
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(AntispamError::Api {
                code: self.error_code,
                description: self
                    .description
                    .unwrap_or_else(|| "empty response".to_string()),
            }),
        }
    }
}

/// getMe 返回的 Bot 账号
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
}

/// Telegram Bot API 客户端
///
/// 同时实现 [`UpdateSource`]（getUpdates 长轮询）和 [`WarningSender`]（sendMessage）。
pub struct TelegramClient {
    client: Client,
    api_base_url: String,
    token: String,
    poll_timeout: Duration,
    /// 下一次 getUpdates 的 offset
    offset: i64,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base_url", &self.api_base_url)
            .field("poll_timeout", &self.poll_timeout)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, config: &TelegramConfig) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(AntispamError::Configuration(
                "Token must be specified".to_string(),
            ));
        }

        let poll_timeout = Duration::from_secs(config.poll_timeout_secs);
        let client = Client::builder()
            .timeout(poll_timeout + HTTP_TIMEOUT_MARGIN)
            .build()?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token,
            poll_timeout,
            offset: 0,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base_url, self.token, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&params)
            .send()
            .await?;
        // 失败时 Bot API 同样返回 JSON 信封，不按 HTTP 状态码提前返回
        let body: ApiResponse<T> = response.json().await?;
        body.into_result()
    }

    /// 校验 token 并返回 Bot 账号信息
    pub async fn get_me(&self) -> Result<BotUser> {
        let me: BotUser = self.call("getMe", json!({})).await?;
        info!(
            "🤖 Authorized on account: {}",
            me.username.as_deref().unwrap_or(&me.first_name)
        );
        Ok(me)
    }

    /// 长轮询拉取 Update，并推进 offset
    pub async fn get_updates(&mut self) -> Result<Vec<Update>> {
        let raw: Vec<serde_json::Value> = self
            .call(
                "getUpdates",
                json!({
                    "offset": self.offset,
                    "timeout": self.poll_timeout.as_secs(),
                    "allowed_updates": ["message"],
                }),
            )
            .await?;

        let (updates, offset) = decode_batch(self.offset, raw);
        self.offset = offset;
        if !updates.is_empty() {
            debug!("📥 Received {} updates, next offset {}", updates.len(), self.offset);
        }
        Ok(updates)
    }

    /// 发送文本消息
    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(())
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}

/// 逐条解码 Update，解码失败的条目跳过但仍然确认，避免反复拉取同一批次
///
/// 返回解码成功的 Update 和下一个 offset（已见最大 update_id + 1；空批次保持不变）
fn decode_batch(current: i64, raw: Vec<serde_json::Value>) -> (Vec<Update>, i64) {
    let mut offset = current;
    let mut updates = Vec::with_capacity(raw.len());

    for value in raw {
        if let Some(update_id) = value.get("update_id").and_then(serde_json::Value::as_i64) {
            offset = offset.max(update_id + 1);
        }
        match serde_json::from_value::<Update>(value) {
            Ok(update) => updates.push(update),
            Err(e) => warn!("⚠️ Skip undecodable update: {}", e),
        }
    }

    (updates, offset)
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn next_batch(&mut self) -> Result<Vec<Update>> {
        self.get_updates().await
    }
}

#[async_trait]
impl WarningSender for TelegramClient {
    async fn send_warning(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await
    }
}
