use dashmap::DashMap;
use tracing::debug;

use crate::model::UserId;

/// 用户垃圾消息计数器
///
/// 进程生命周期内只增不减，不做过期清理。
#[derive(Debug, Default)]
pub struct SpamCounter {
    counters: DashMap<UserId, u64>,
}

impl SpamCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 计数 +1，返回新值
    pub fn increment(&self, user_id: UserId) -> u64 {
        let mut entry = self.counters.entry(user_id).or_insert(0);
        *entry += 1;
        let count = *entry;
        drop(entry);

        debug!("📈 Increase spam counter for user {} -> {}", user_id, count);
        count
    }

    /// 当前计数，未记录过为 0
    pub fn get(&self, user_id: UserId) -> u64 {
        self.counters.get(&user_id).map(|c| *c).unwrap_or(0)
    }

    /// 已记录的用户数
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// 所有计数的快照（按 user_id 排序）
    pub fn snapshot(&self) -> Vec<(UserId, u64)> {
        let mut counts: Vec<(UserId, u64)> = self
            .counters
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        counts.sort_unstable();
        counts
    }
}
