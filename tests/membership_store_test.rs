use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use privchat_antispam::{MembershipRecord, MembershipStore};

const TTL: Duration = Duration::from_secs(300);

#[test]
fn test_concurrent_writes_with_sweeps_match_sequential_result() {
    let store = Arc::new(MembershipStore::new());
    let now = Utc::now();
    let stale = now - ChronoDuration::minutes(30);

    const WORKERS: i64 = 8;
    const PER_WORKER: i64 = 500;

    let writers: Vec<_> = (0..WORKERS)
        .map(|w| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..PER_WORKER {
                    let user_id = w * PER_WORKER + i;
                    store.insert(user_id, now);
                    match user_id % 3 {
                        0 => {
                            store.remove(user_id);
                        }
                        1 => store.insert(user_id, stale),
                        _ => {}
                    }
                }
            })
        })
        .collect();

    let sweepers: Vec<_> = (0..2)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut evicted = 0;
                for _ in 0..200 {
                    evicted += store.sweep(now, TTL);
                    // 清理期间读取不应阻塞或出错
                    let _ = store.is_recent_member(1, now, TTL);
                }
                evicted
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    let concurrent_evicted: usize = sweepers.into_iter().map(|s| s.join().unwrap()).sum();
    let final_evicted = store.sweep(now, TTL);

    let stale_count = (0..WORKERS * PER_WORKER).filter(|id| id % 3 == 1).count();
    assert_eq!(concurrent_evicted + final_evicted, stale_count);

    let expected: Vec<MembershipRecord> = (0..WORKERS * PER_WORKER)
        .filter(|id| id % 3 == 2)
        .map(|id| MembershipRecord::new(id, now))
        .collect();
    assert_eq!(store.snapshot(), expected);
}

#[test]
fn test_sweep_is_idempotent() {
    let store = MembershipStore::new();
    let now = Utc::now();
    for id in 0..10 {
        store.insert(id, now - ChronoDuration::minutes(id));
    }

    // 年龄 6..=9 分钟的记录过期
    assert_eq!(store.sweep(now, TTL), 4);
    assert_eq!(store.sweep(now, TTL), 0);
    assert_eq!(store.len(), 6);
}

#[test]
fn test_passive_check_independent_of_sweep() {
    let store = MembershipStore::new();
    let t0 = Utc::now();
    store.insert(1, t0);

    let later = t0 + ChronoDuration::from_std(TTL).unwrap() + ChronoDuration::seconds(1);
    assert!(!store.is_recent_member(1, later, TTL));
    assert_eq!(store.joined_at(1), Some(t0));
}
