//! Short-lived cache for executed result sets.
//!
//! Keyed on the final SQL text plus its bound parameter rendering, so the
//! same template filled with different seasons never collides. Only
//! successful executions are stored; refusals and errors are always
//! recomputed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::query::ResolvedQuery;

/// One row, as a JSON object.
pub type Row = serde_json::Value;

struct CacheSlot {
    rows: Vec<Row>,
    stored_at: Instant,
}

/// In-memory TTL cache for query results.
pub struct ResultCache {
    ttl: Duration,
    slots: HashMap<String, CacheSlot>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: HashMap::new(),
        }
    }

    /// Cache key: SQL text plus bound values in name order.
    fn key(query: &ResolvedQuery) -> String {
        let mut key = query.sql_text.clone();
        for (name, value) in &query.bound_params {
            key.push('\n');
            key.push_str(name);
            key.push('=');
            key.push_str(&value.to_string());
        }
        key
    }

    /// Fetch cached rows if the entry is still fresh.
    pub fn get(&self, query: &ResolvedQuery) -> Option<&[Row]> {
        let slot = self.slots.get(&Self::key(query))?;
        if slot.stored_at.elapsed() > self.ttl {
            return None;
        }
        Some(&slot.rows)
    }

    /// Store rows for a successfully executed query.
    pub fn insert(&mut self, query: &ResolvedQuery, rows: Vec<Row>) {
        self.slots.insert(
            Self::key(query),
            CacheSlot {
                rows,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every expired entry.
    pub fn purge_expired(&mut self) {
        let ttl = self.ttl;
        self.slots.retain(|_, slot| slot.stored_at.elapsed() <= ttl);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
