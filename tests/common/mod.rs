#![allow(dead_code)]

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use privchat_antispam::{AntispamError, ChatId, Result, Update, UpdateSource, WarningSender};
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// 记录所有警告的发送器，可模拟发送失败
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(ChatId, String)>>,
    fail: bool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl WarningSender for RecordingSender {
    async fn send_warning(&self, chat_id: ChatId, text: &str) -> Result<()> {
        if self.fail {
            return Err(AntispamError::Transport("connection reset".to_string()));
        }
        self.sent.lock().push((chat_id, text.to_string()));
        Ok(())
    }
}

/// 按顺序返回预设批次，取完后触发取消
pub struct ScriptedSource {
    batches: VecDeque<Result<Vec<Update>>>,
    cancel: CancellationToken,
}

impl ScriptedSource {
    pub fn new(batches: Vec<Result<Vec<Update>>>, cancel: CancellationToken) -> Self {
        Self {
            batches: batches.into(),
            cancel,
        }
    }
}

#[async_trait]
impl UpdateSource for ScriptedSource {
    async fn next_batch(&mut self) -> Result<Vec<Update>> {
        match self.batches.pop_front() {
            Some(batch) => batch,
            None => {
                self.cancel.cancel();
                Ok(Vec::new())
            }
        }
    }
}

pub const CHAT: ChatId = -100_500;

pub fn join_update(update_id: i64, user_id: i64) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "from": {"id": user_id},
            "chat": {"id": CHAT, "type": "supergroup"},
            "new_chat_members": [{"id": user_id}]
        }
    }))
    .unwrap()
}

pub fn leave_update(update_id: i64, user_id: i64) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "from": {"id": user_id},
            "chat": {"id": CHAT, "type": "supergroup"},
            "left_chat_member": {"id": user_id}
        }
    }))
    .unwrap()
}

pub fn forward_update(update_id: i64, user_id: i64, text: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "from": {"id": user_id},
            "chat": {"id": CHAT, "type": "supergroup"},
            "text": text,
            "forward_date": 1_700_000_000
        }
    }))
    .unwrap()
}

pub fn text_update(update_id: i64, user_id: i64, text: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "from": {"id": user_id},
            "chat": {"id": CHAT, "type": "supergroup"},
            "text": text
        }
    }))
    .unwrap()
}

pub fn senderless_update(update_id: i64) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "chat": {"id": CHAT, "type": "channel"},
            "text": "channel post",
            "forward_date": 1_700_000_000
        }
    }))
    .unwrap()
}

/// 只含 edited_message 的 Update（没有 message 字段）
pub fn edited_update(update_id: i64, user_id: i64) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "edited_message": {
            "message_id": update_id,
            "from": {"id": user_id, "is_bot": false, "first_name": "user"},
            "chat": {"id": CHAT, "type": "supergroup"},
            "text": "edited",
            "forward_date": 1_700_000_000
        }
    }))
    .unwrap()
}
