//! Daily usage quota tracking
//!
//! Each feature (translate, chat) gets its own [`QuotaTracker`] with an
//! independent daily allowance. Counters are keyed by identity and scoped to
//! the current UTC calendar day; records from a previous day are read as zero
//! and overwritten on the next consume rather than swept (lazy expiry).

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// One identity's counter for a single UTC day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageRecord {
    /// UTC day the count belongs to
    pub date: NaiveDate,
    /// Billable actions taken on that day
    pub count: u32,
}

/// Outcome of a consume attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Within the allowance; `used` includes this action
    Allowed { used: u32 },
    /// Allowance exhausted; no mutation occurred
    Denied { limit: u32, used: u32 },
}

impl QuotaDecision {
    /// Whether the action was allowed
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed { .. })
    }
}

/// Storage behind a [`QuotaTracker`]
///
/// `try_consume` must be linearizable per key: two concurrent calls at the
/// boundary of the limit must not both succeed when only one slot remains.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Count already consumed by `key` on `today`; stale dates read as zero
    async fn current_usage(&self, key: &str, today: NaiveDate) -> u32;

    /// Atomic check-then-increment against `limit` for `key` on `today`
    async fn try_consume(&self, key: &str, today: NaiveDate, limit: u32) -> QuotaDecision;
}

/// In-memory usage store for single-instance deployments
///
/// A single mutex held across the read-modify-write gives the atomicity the
/// contract requires. Stale records are left in place until the identity acts
/// again on a later day.
#[derive(Debug, Clone, Default)]
pub struct MemoryUsageStore {
    records: Arc<Mutex<HashMap<String, UsageRecord>>>,
}

impl MemoryUsageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn current_usage(&self, key: &str, today: NaiveDate) -> u32 {
        let records = self.records.lock().await;
        match records.get(key) {
            Some(record) if record.date == today => record.count,
            _ => 0,
        }
    }

    async fn try_consume(&self, key: &str, today: NaiveDate, limit: u32) -> QuotaDecision {
        let mut records = self.records.lock().await;
        let used = match records.get(key) {
            Some(record) if record.date == today => record.count,
            _ => 0,
        };

        if used >= limit {
            return QuotaDecision::Denied { limit, used };
        }

        records.insert(
            key.to_string(),
            UsageRecord {
                date: today,
                count: used + 1,
            },
        );
        QuotaDecision::Allowed { used: used + 1 }
    }
}

/// Daily allowance enforcement for one feature
#[derive(Clone)]
pub struct QuotaTracker {
    store: Arc<dyn UsageStore>,
    limit: u32,
}

impl QuotaTracker {
    /// Create a tracker over `store` with a fixed daily `limit`
    pub fn new(store: Arc<dyn UsageStore>, limit: u32) -> Self {
        Self { store, limit }
    }

    /// In-memory tracker with its own backing store
    pub fn in_memory(limit: u32) -> Self {
        Self::new(Arc::new(MemoryUsageStore::new()), limit)
    }

    /// The configured daily limit
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Usage consumed today (UTC) by `key`
    pub async fn current_usage(&self, key: &str) -> u32 {
        self.store.current_usage(key, Utc::now().date_naive()).await
    }

    /// Attempt to consume one unit of today's allowance for `key`
    pub async fn try_consume(&self, key: &str) -> QuotaDecision {
        self.try_consume_on(key, Utc::now().date_naive()).await
    }

    /// Consume against an explicit day; `try_consume` with today's UTC date
    pub async fn try_consume_on(&self, key: &str, today: NaiveDate) -> QuotaDecision {
        let decision = self.store.try_consume(key, today, self.limit).await;
        if let QuotaDecision::Denied { used, .. } = decision {
            debug!(key, used, limit = self.limit, "quota denied");
        }
        decision
    }

    /// Usage consumed on an explicit day by `key`
    pub async fn current_usage_on(&self, key: &str, today: NaiveDate) -> u32 {
        self.store.current_usage(key, today).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_quota_boundary() {
        let tracker = QuotaTracker::in_memory(15);
        let today = day("2026-08-30");

        for i in 1..=15u32 {
            let decision = tracker.try_consume_on("anon:abc", today).await;
            assert_eq!(decision, QuotaDecision::Allowed { used: i });
        }

        let denied = tracker.try_consume_on("anon:abc", today).await;
        assert_eq!(
            denied,
            QuotaDecision::Denied {
                limit: 15,
                used: 15
            }
        );

        // Denial mutates nothing
        assert_eq!(tracker.current_usage_on("anon:abc", today).await, 15);
    }

    #[tokio::test]
    async fn test_quota_utc_rollover() {
        let tracker = QuotaTracker::in_memory(15);
        let day_one = day("2026-08-30");
        let day_two = day("2026-08-31");

        for _ in 0..15 {
            assert!(tracker.try_consume_on("anon:abc", day_one).await.is_allowed());
        }
        assert!(!tracker.try_consume_on("anon:abc", day_one).await.is_allowed());

        // Stale record reads as zero the next day, first consume lands on 1
        assert_eq!(tracker.current_usage_on("anon:abc", day_two).await, 0);
        assert_eq!(
            tracker.try_consume_on("anon:abc", day_two).await,
            QuotaDecision::Allowed { used: 1 }
        );
        assert_eq!(tracker.current_usage_on("anon:abc", day_two).await, 1);
    }

    #[tokio::test]
    async fn test_quota_keys_independent() {
        let tracker = QuotaTracker::in_memory(1);
        let today = day("2026-08-30");

        assert!(tracker.try_consume_on("u:1", today).await.is_allowed());
        assert!(tracker.try_consume_on("u:2", today).await.is_allowed());
        assert!(!tracker.try_consume_on("u:1", today).await.is_allowed());
    }

    #[tokio::test]
    async fn test_quota_monotonic_within_day() {
        let tracker = QuotaTracker::in_memory(5);
        let today = day("2026-08-30");

        let mut last = 0;
        for _ in 0..5 {
            tracker.try_consume_on("u:1", today).await;
            let used = tracker.current_usage_on("u:1", today).await;
            assert!(used >= last);
            last = used;
        }
        assert_eq!(last, 5);
    }

    #[tokio::test]
    async fn test_concurrent_boundary() {
        let limit = 10u32;
        let tracker = QuotaTracker::in_memory(limit);
        let today = day("2026-08-30");

        let mut handles = Vec::new();
        for _ in 0..(limit + 5) {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                tracker.try_consume_on("anon:abc", today).await.is_allowed()
            }));
        }

        let mut allowed = 0u32;
        let mut denied = 0u32;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            } else {
                denied += 1;
            }
        }

        assert_eq!(allowed, limit);
        assert_eq!(denied, 5);
        assert_eq!(tracker.current_usage_on("anon:abc", today).await, limit);
    }
}
