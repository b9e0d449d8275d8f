use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 平台用户 ID
pub type UserId = i64;

/// 会话 ID（群组为负数）
pub type ChatId = i64;

/// 成员加入记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
}

impl MembershipRecord {
    pub fn new(user_id: UserId, joined_at: DateTime<Utc>) -> Self {
        Self { user_id, joined_at }
    }
}

/// 待检测的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub sender_id: UserId,
    pub chat_id: ChatId,
    /// 文本内容，无文本时为空串
    pub text: String,
    /// 转发来源时间，非转发消息为 None
    pub forwarded_at: Option<DateTime<Utc>>,
}

impl MessageEvent {
    pub fn new(sender_id: UserId, chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            sender_id,
            chat_id,
            text: text.into(),
            forwarded_at: None,
        }
    }

    pub fn forwarded(mut self, at: DateTime<Utc>) -> Self {
        self.forwarded_at = Some(at);
        self
    }

    pub fn is_forwarded(&self) -> bool {
        self.forwarded_at.is_some()
    }
}

/// 入站事件
///
/// 每个事件只携带一种语义：入群、退群或普通消息。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundEvent {
    /// 用户入群
    Joined { user_id: UserId, chat_id: ChatId },
    /// 用户退群
    Left { user_id: UserId, chat_id: ChatId },
    /// 普通消息
    Message(MessageEvent),
}

impl InboundEvent {
    /// 事件关联的用户
    pub fn user_id(&self) -> UserId {
        match self {
            InboundEvent::Joined { user_id, .. } | InboundEvent::Left { user_id, .. } => *user_id,
            InboundEvent::Message(msg) => msg.sender_id,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        match self {
            InboundEvent::Joined { chat_id, .. } | InboundEvent::Left { chat_id, .. } => *chat_id,
            InboundEvent::Message(msg) => msg.chat_id,
        }
    }
}
