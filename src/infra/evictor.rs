use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::clock::Clock;
use super::membership_store::MembershipStore;
use super::metrics;

/// 成员表后台清理任务
///
/// 按固定间隔调用 [`MembershipStore::sweep`]，直到取消令牌被触发。
/// 第一次清理在启动时立即执行。
pub struct Evictor {
    store: Arc<MembershipStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    sweep_interval: Duration,
}

impl Evictor {
    /// `sweep_interval` 必须大于 0（由配置校验保证）
    pub fn new(
        store: Arc<MembershipStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            ttl,
            sweep_interval,
        }
    }

    /// 执行一次清理，返回删除的记录数
    pub fn sweep_once(&self) -> usize {
        let evicted = self.store.sweep(self.clock.now(), self.ttl);
        let remaining = self.store.len();
        metrics::record_sweep(evicted, remaining);

        if evicted > 0 {
            info!("🧹 Evicted {} expired members, {} still tracked", evicted, remaining);
        } else {
            debug!("🧹 Sweep finished, {} members tracked", remaining);
        }
        evicted
    }

    /// 循环清理直到取消，返回完成的清理轮数
    pub async fn run(self, cancel: CancellationToken) -> u64 {
        info!(
            "🚀 Starting evictor with {:?} interval, ttl {:?}",
            self.sweep_interval, self.ttl
        );
        let mut ticker = interval(self.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycles = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep_once();
                    cycles += 1;
                }
            }
        }

        info!("🛑 Evictor stopped after {} cycles", cycles);
        cycles
    }

    /// 在 tokio 运行时上启动清理任务
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<u64> {
        tokio::spawn(self.run(cancel))
    }
}
