//! 转发垃圾消息判定
//!
//! 典型模式：机器人账号入群后立即转发一条广告链接。
//! 判定规则：
//! 1. 非转发消息 -> 不是垃圾
//! 2. 空文本按 [`EmptyTextPolicy`] 处理
//! 3. 发送者在 TTL 窗口内入群 -> 垃圾
//!
//! 这是启发式规则，误判和漏判都在预期之内。
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::infra::MembershipStore;
use crate::model::MessageEvent;

/// 空文本转发消息的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyTextPolicy {
    /// 空文本同样参与判定（默认，更宽松的检测）
    #[default]
    Eligible,
    /// 空文本直接判为非垃圾（图片、贴纸等无文本转发不计）
    Ignored,
}

impl EmptyTextPolicy {
    pub fn from_eligible(eligible: bool) -> Self {
        if eligible {
            EmptyTextPolicy::Eligible
        } else {
            EmptyTextPolicy::Ignored
        }
    }
}

/// 垃圾消息分类器
#[derive(Debug, Clone)]
pub struct SpamClassifier {
    ttl: Duration,
    empty_text_policy: EmptyTextPolicy,
}

impl SpamClassifier {
    pub fn new(ttl: Duration, empty_text_policy: EmptyTextPolicy) -> Self {
        Self {
            ttl,
            empty_text_policy,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn empty_text_policy(&self) -> EmptyTextPolicy {
        self.empty_text_policy
    }

    /// 判定消息是否为垃圾消息，只读，不修改成员表
    pub fn classify(&self, event: &MessageEvent, store: &MembershipStore, now: DateTime<Utc>) -> bool {
        if !event.is_forwarded() {
            return false;
        }

        if event.text.is_empty() && self.empty_text_policy == EmptyTextPolicy::Ignored {
            return false;
        }

        let recent = store.is_recent_member(event.sender_id, now, self.ttl);
        if recent {
            debug!("[timeout] Spam from user {}", event.sender_id);
        }
        recent
    }
}
