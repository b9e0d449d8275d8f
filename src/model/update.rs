//! Bot API 的 Update 结构
//!
//! 只保留反垃圾需要的字段，其余字段由 serde 忽略。
//! `into_events()` 负责把传输层结构转换为 [`InboundEvent`]，
//! 无法识别发送者的 Update 在这里被丢弃。

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::event::{ChatId, InboundEvent, MessageEvent, UserId};

/// 平台用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// 会话
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(default, rename = "type")]
    pub chat_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// 转发来源（新版 API 使用 forward_origin 取代 forward_date）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardOrigin {
    pub date: i64,
}

/// 消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub forward_date: Option<i64>,
    #[serde(default)]
    pub forward_origin: Option<ForwardOrigin>,
    #[serde(default)]
    pub new_chat_member: Option<User>,
    #[serde(default)]
    pub new_chat_members: Option<Vec<User>>,
    #[serde(default)]
    pub left_chat_member: Option<User>,
}

impl Message {
    /// 转发时间（0 视为未转发）
    pub fn forwarded_at(&self) -> Option<DateTime<Utc>> {
        let secs = self
            .forward_date
            .or_else(|| self.forward_origin.as_ref().map(|o| o.date))
            .filter(|secs| *secs != 0)?;
        Utc.timestamp_opt(secs, 0).single()
    }

    /// 新入群成员，按 ID 去重并保持顺序
    pub fn joined_members(&self) -> Vec<&User> {
        let mut members: Vec<&User> = Vec::new();
        let candidates = self
            .new_chat_members
            .iter()
            .flatten()
            .chain(self.new_chat_member.iter());
        for user in candidates {
            if !members.iter().any(|m| m.id == user.id) {
                members.push(user);
            }
        }
        members
    }
}

/// 一次长轮询返回的 Update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

impl Update {
    /// 转换为入站事件
    ///
    /// 优先级：入群 > 退群 > 普通消息。没有消息体或没有发送者时返回空。
    pub fn into_events(self) -> Vec<InboundEvent> {
        let message = match self.message {
            Some(message) if message.from.is_some() => message,
            _ => return Vec::new(),
        };
        let chat_id = message.chat.id;

        let joined = message.joined_members();
        if !joined.is_empty() {
            return joined
                .into_iter()
                .map(|user| InboundEvent::Joined {
                    user_id: user.id,
                    chat_id,
                })
                .collect();
        }

        if let Some(user) = &message.left_chat_member {
            return vec![InboundEvent::Left {
                user_id: user.id,
                chat_id,
            }];
        }

        let forwarded_at = message.forwarded_at();
        let sender_id = match &message.from {
            Some(user) => user.id,
            None => return Vec::new(),
        };
        vec![InboundEvent::Message(MessageEvent {
            sender_id,
            chat_id,
            text: message.text.unwrap_or_default(),
            forwarded_at,
        })]
    }
}
