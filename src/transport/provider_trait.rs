use async_trait::async_trait;

use crate::error::Result;
use crate::model::{ChatId, Update};

/// 入站 Update 来源（长轮询、webhook 等）
#[async_trait]
pub trait UpdateSource: Send {
    /// 拉取下一批 Update，可能为空
    async fn next_batch(&mut self) -> Result<Vec<Update>>;
}

/// 出站警告
#[async_trait]
pub trait WarningSender: Send + Sync {
    /// 向会话发送警告文本
    async fn send_warning(&self, chat_id: ChatId, text: &str) -> Result<()>;
}
