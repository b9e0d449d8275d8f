use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::AntispamConfig;
use crate::error::Result;
use crate::infra::{Clock, EventRouter, Evictor, MembershipStore, SpamCounter, SystemClock};
use crate::security::SpamClassifier;
use crate::transport::{UpdateSource, WarningSender};

/// 拉取失败后的重试间隔
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// 反垃圾 Bot
///
/// 启动时创建一次成员表和计数器，再以共享引用交给路由器和清理任务。
pub struct AntispamBot {
    config: AntispamConfig,
    store: Arc<MembershipStore>,
    counter: Arc<SpamCounter>,
    clock: Arc<dyn Clock>,
    retry_backoff: Duration,
}

impl AntispamBot {
    pub fn new(config: AntispamConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AntispamConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: Arc::new(MembershipStore::new()),
            counter: Arc::new(SpamCounter::new()),
            clock,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        })
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn config(&self) -> &AntispamConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<MembershipStore> {
        Arc::clone(&self.store)
    }

    pub fn counter(&self) -> Arc<SpamCounter> {
        Arc::clone(&self.counter)
    }

    /// 创建事件路由器
    pub fn router(&self, sender: Arc<dyn WarningSender>) -> EventRouter {
        EventRouter::new(
            self.config.router_config(),
            Arc::clone(&self.store),
            Arc::clone(&self.counter),
            SpamClassifier::new(self.config.ttl(), self.config.empty_text_policy()),
            sender,
            Arc::clone(&self.clock),
        )
    }

    /// 创建成员表清理任务
    pub fn evictor(&self) -> Evictor {
        Evictor::new(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            self.config.ttl(),
            self.config.sweep_interval(),
        )
    }

    /// 运行直到 `cancel` 被触发
    ///
    /// Update 逐个串行处理；清理任务在独立的 tokio 任务中运行，退出时一并停止。
    pub async fn run<S>(
        &self,
        source: &mut S,
        sender: Arc<dyn WarningSender>,
        cancel: CancellationToken,
    ) -> Result<()>
    where
        S: UpdateSource + ?Sized,
    {
        info!("🚀 Antispam bot starting...");
        info!("  - Watch only: {}", self.config.watch_only);
        info!("  - Member TTL: {:?}", self.config.ttl());
        info!("  - Sweep interval: {:?}", self.config.sweep_interval());
        info!("  - Empty text policy: {:?}", self.config.empty_text_policy());

        let evictor_cancel = cancel.child_token();
        let evictor_handle = self.evictor().spawn(evictor_cancel.clone());
        let router = self.router(sender);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                batch = source.next_batch() => match batch {
                    Ok(updates) => {
                        for update in updates {
                            router.handle_update(update).await;
                        }
                    }
                    Err(e) => {
                        error!("❌ Fetch updates failed: {}", e);
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(self.retry_backoff) => {}
                        }
                    }
                },
            }
        }

        evictor_cancel.cancel();
        match evictor_handle.await {
            Ok(cycles) => info!("🛑 Antispam bot stopped, evictor ran {} cycles", cycles),
            Err(e) => warn!("⚠️ Evictor task ended abnormally: {}", e),
        }
        Ok(())
    }
}
