use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::clock::Clock;
use super::membership_store::MembershipStore;
use super::metrics;
use super::spam_counter::SpamCounter;
use crate::model::{ChatId, InboundEvent, MessageEvent, Update, UserId};
use crate::security::SpamClassifier;
use crate::transport::WarningSender;

/// 默认警告文本
pub const DEFAULT_WARNING_TEXT: &str = "Is it spam?";

/// 单个事件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// 记录入群
    Joined(UserId),
    /// 删除成员记录
    Left(UserId),
    /// 普通消息，未命中规则
    Clean,
    /// 命中垃圾规则
    Spam {
        user_id: UserId,
        chat_id: ChatId,
        /// 本次计数后的累计次数
        count: u64,
        /// 是否成功发出警告（观察模式下恒为 false）
        warned: bool,
    },
    /// 无法识别发送者，已丢弃
    Dropped,
}

/// 事件路由器配置
#[derive(Debug, Clone)]
pub struct EventRouterConfig {
    /// 观察模式：只判定和计数，不发送警告
    pub watch_only: bool,
    /// 警告文本
    pub warning_text: String,
}

impl Default for EventRouterConfig {
    fn default() -> Self {
        Self {
            watch_only: true,
            warning_text: DEFAULT_WARNING_TEXT.to_string(),
        }
    }
}

/// 事件路由器
///
/// 入群 -> 写入成员表，退群 -> 删除，普通消息 -> 分类。
/// 自身不持有状态，所有状态都在共享的成员表和计数器里。
pub struct EventRouter {
    config: EventRouterConfig,
    store: Arc<MembershipStore>,
    counter: Arc<SpamCounter>,
    classifier: SpamClassifier,
    sender: Arc<dyn WarningSender>,
    clock: Arc<dyn Clock>,
}

impl EventRouter {
    pub fn new(
        config: EventRouterConfig,
        store: Arc<MembershipStore>,
        counter: Arc<SpamCounter>,
        classifier: SpamClassifier,
        sender: Arc<dyn WarningSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            counter,
            classifier,
            sender,
            clock,
        }
    }

    pub fn is_watch_only(&self) -> bool {
        self.config.watch_only
    }

    /// 处理一个传输层 Update，按顺序分发其中的事件
    pub async fn handle_update(&self, update: Update) -> Vec<RouteOutcome> {
        let update_id = update.update_id;
        let events = update.into_events();
        if events.is_empty() {
            debug!("⏭ Skip update {}: no message or no sender", update_id);
            metrics::record_update_dropped();
            return vec![RouteOutcome::Dropped];
        }

        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            outcomes.push(self.dispatch(event).await);
        }
        outcomes
    }

    /// 分发单个事件
    pub async fn dispatch(&self, event: InboundEvent) -> RouteOutcome {
        match event {
            InboundEvent::Joined { user_id, chat_id } => {
                info!("👋 Welcome new user {} in chat {}", user_id, chat_id);
                self.store.insert(user_id, self.clock.now());
                RouteOutcome::Joined(user_id)
            }
            InboundEvent::Left { user_id, chat_id } => {
                info!("👋 Goodbye user {} from chat {}", user_id, chat_id);
                self.store.remove(user_id);
                RouteOutcome::Left(user_id)
            }
            InboundEvent::Message(message) => self.check_message(message).await,
        }
    }

    async fn check_message(&self, message: MessageEvent) -> RouteOutcome {
        let now = self.clock.now();
        if !self.classifier.classify(&message, &self.store, now) {
            return RouteOutcome::Clean;
        }

        let count = self.counter.increment(message.sender_id);
        metrics::record_spam_detected();
        warn!(
            "🚫 SPAM: user={} chat={} count={} text={:?}",
            message.sender_id, message.chat_id, count, message.text
        );

        let warned = if self.config.watch_only {
            false
        } else {
            self.send_warning(message.chat_id).await
        };

        RouteOutcome::Spam {
            user_id: message.sender_id,
            chat_id: message.chat_id,
            count,
            warned,
        }
    }

    /// 发送失败只记录日志，不回滚计数
    async fn send_warning(&self, chat_id: ChatId) -> bool {
        match self
            .sender
            .send_warning(chat_id, &self.config.warning_text)
            .await
        {
            Ok(()) => {
                metrics::record_warning(true);
                true
            }
            Err(e) => {
                error!("❌ Send warning to chat {} failed: {}", chat_id, e);
                metrics::record_warning(false);
                false
            }
        }
    }
}
