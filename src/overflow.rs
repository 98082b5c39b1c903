//! Write-once storage for untruncated results with paginated retrieval.
//!
//! When a response is truncated the full pre-truncation result is stored here
//! under a fresh opaque id, so a follow-up call can read page `k` of the full
//! sequence without re-running the traversal or query. Records are write-once;
//! reads are idempotent. This is the only shared mutable state between tool
//! invocations, guarded by one `RwLock` so readers never block each other.

use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{CodeNavError, Result};

/// Retention knobs. Records are evicted oldest-first past `max_records`, and
/// lazily swept once older than `ttl_seconds`.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    pub max_records: usize,
    pub ttl_seconds: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_records: 64,
            ttl_seconds: 1800,
        }
    }
}

/// One stored full result
#[derive(Debug, Clone)]
pub struct OverflowRecord {
    pub id: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub page_size: usize,
    /// Insertion sequence; breaks created_at ties during eviction.
    seq: u64,
    items: Vec<Value>,
}

impl OverflowRecord {
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    pub fn page_count(&self) -> usize {
        self.items.len().div_ceil(self.page_size)
    }
}

/// One page of a stored result, 1-based
#[derive(Debug, Clone, Serialize)]
pub struct OverflowPage {
    pub overflow_id: String,
    pub label: String,
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub items: Vec<Value>,
}

pub struct OverflowStore {
    records: RwLock<AHashMap<String, OverflowRecord>>,
    policy: RetentionPolicy,
    next_seq: AtomicU64,
}

impl Default for OverflowStore {
    fn default() -> Self {
        Self::new(RetentionPolicy::default())
    }
}

impl OverflowStore {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            records: RwLock::new(AHashMap::new()),
            policy,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Persist a full result and return its opaque id. Each call creates a
    /// new, independently keyed record; concurrent writers never collide.
    pub fn store(&self, label: &str, items: Vec<Value>, page_size: usize) -> String {
        let id = Uuid::new_v4().to_string();
        let record = OverflowRecord {
            id: id.clone(),
            label: label.to_string(),
            created_at: Utc::now(),
            page_size: page_size.max(1),
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            items,
        };

        let mut records = self.records.write();
        self.sweep_expired(&mut records);
        while records.len() >= self.policy.max_records {
            let oldest = records
                .values()
                .min_by_key(|r| (r.created_at, r.seq))
                .map(|r| r.id.clone());
            match oldest {
                Some(old_id) => {
                    records.remove(&old_id);
                }
                None => break,
            }
        }
        records.insert(id.clone(), record);
        id
    }

    /// Read page `page` (1-based) of a stored record. Unknown or expired ids
    /// and out-of-range pages fail with `OverflowRecordNotFound`.
    pub fn page(&self, id: &str, page: usize) -> Result<OverflowPage> {
        let records = self.records.read();
        let record = records
            .get(id)
            .filter(|r| !self.is_expired(r))
            .ok_or_else(|| CodeNavError::OverflowRecordNotFound { id: id.to_string() })?;

        let page_count = record.page_count();
        if page == 0 || page > page_count {
            return Err(CodeNavError::OverflowRecordNotFound { id: id.to_string() });
        }

        let start = (page - 1) * record.page_size;
        let end = (start + record.page_size).min(record.items.len());
        Ok(OverflowPage {
            overflow_id: record.id.clone(),
            label: record.label.clone(),
            page,
            page_count,
            page_size: record.page_size,
            total_items: record.items.len(),
            items: record.items[start..end].to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn is_expired(&self, record: &OverflowRecord) -> bool {
        Utc::now() - record.created_at > Duration::seconds(self.policy.ttl_seconds)
    }

    fn sweep_expired(&self, records: &mut AHashMap<String, OverflowRecord>) {
        let cutoff = Utc::now() - Duration::seconds(self.policy.ttl_seconds);
        records.retain(|_, r| r.created_at >= cutoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numbered(n: usize) -> Vec<Value> {
        (0..n).map(|i| json!({ "n": i })).collect()
    }

    #[test]
    fn pages_partition_the_original_sequence() {
        let store = OverflowStore::default();
        let id = store.store("refs", numbered(237), 100);

        let p1 = store.page(&id, 1).unwrap();
        let p2 = store.page(&id, 2).unwrap();
        let p3 = store.page(&id, 3).unwrap();
        assert_eq!(p1.items.len(), 100);
        assert_eq!(p2.items.len(), 100);
        assert_eq!(p3.items.len(), 37);
        assert_eq!(p1.page_count, 3);
        assert_eq!(p3.total_items, 237);

        let replayed: Vec<Value> = p1
            .items
            .into_iter()
            .chain(p2.items)
            .chain(p3.items)
            .collect();
        assert_eq!(replayed, numbered(237));
    }

    #[test]
    fn unknown_id_and_out_of_range_page_are_not_found() {
        let store = OverflowStore::default();
        let id = store.store("refs", numbered(5), 100);

        assert!(matches!(
            store.page("nope", 1),
            Err(CodeNavError::OverflowRecordNotFound { .. })
        ));
        assert!(matches!(
            store.page(&id, 0),
            Err(CodeNavError::OverflowRecordNotFound { .. })
        ));
        assert!(matches!(
            store.page(&id, 2),
            Err(CodeNavError::OverflowRecordNotFound { .. })
        ));
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let store = OverflowStore::new(RetentionPolicy {
            max_records: 2,
            ttl_seconds: 3600,
        });
        let first = store.store("a", numbered(1), 10);
        let second = store.store("b", numbered(1), 10);
        let third = store.store("c", numbered(1), 10);

        assert_eq!(store.len(), 2);
        assert!(store.page(&first, 1).is_err());
        assert!(store.page(&second, 1).is_ok());
        assert!(store.page(&third, 1).is_ok());
    }

    #[test]
    fn expired_records_are_gone() {
        let store = OverflowStore::new(RetentionPolicy {
            max_records: 8,
            ttl_seconds: -1,
        });
        let id = store.store("a", numbered(3), 10);
        assert!(matches!(
            store.page(&id, 1),
            Err(CodeNavError::OverflowRecordNotFound { .. })
        ));
    }
}
