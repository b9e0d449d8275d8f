use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::model::{MembershipRecord, UserId};

/// 近期入群成员表
///
/// 记录 user_id -> 入群时间，事件处理路径和后台清理任务共享同一个实例。
/// 所有读写都经过同一把读写锁，单次操作对外是原子的；内部 map 不对外暴露。
///
/// - `is_recent_member` 只做被动判断，不会删除记录
/// - `sweep` 主动删除超过 TTL 的记录，由 [`Evictor`](super::Evictor) 周期调用
#[derive(Debug, Default)]
pub struct MembershipStore {
    members: RwLock<HashMap<UserId, DateTime<Utc>>>,
}

impl MembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录入群（重复入群会覆盖入群时间）
    pub fn insert(&self, user_id: UserId, now: DateTime<Utc>) {
        self.members.write().insert(user_id, now);
    }

    /// 删除记录，不存在时无操作
    pub fn remove(&self, user_id: UserId) -> bool {
        self.members.write().remove(&user_id).is_some()
    }

    /// 是否为 TTL 窗口内的新成员
    pub fn is_recent_member(&self, user_id: UserId, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.members.read().get(&user_id) {
            Some(joined_at) => !is_expired(*joined_at, now, ttl),
            None => false,
        }
    }

    /// 查询入群时间
    pub fn joined_at(&self, user_id: UserId) -> Option<DateTime<Utc>> {
        self.members.read().get(&user_id).copied()
    }

    /// 删除所有超过 TTL 的记录，返回删除数量
    pub fn sweep(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let mut members = self.members.write();
        let before = members.len();
        members.retain(|user_id, joined_at| {
            let expired = is_expired(*joined_at, now, ttl);
            if expired {
                debug!("🧹 Delete user {} by timeout", user_id);
            }
            !expired
        });
        before - members.len()
    }

    /// 当前所有记录的快照（按 user_id 排序）
    pub fn snapshot(&self) -> Vec<MembershipRecord> {
        let mut records: Vec<MembershipRecord> = self
            .members
            .read()
            .iter()
            .map(|(user_id, joined_at)| MembershipRecord::new(*user_id, *joined_at))
            .collect();
        records.sort_by_key(|r| r.user_id);
        records
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }
}

/// 年龄严格大于 TTL 才算过期；入群时间晚于 now 视为未过期
fn is_expired(joined_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    let ttl = match ChronoDuration::from_std(ttl) {
        Ok(ttl) => ttl,
        Err(_) => return false,
    };
    now.signed_duration_since(joined_at) > ttl
}
