//! Per-client page-instance cache with idle-time eviction.
//!
//! Each route keeps a concurrent table of `PageInstance`s keyed by the
//! client key (FNV hash of IP + user agent). A first request clones the
//! page definition and arms a sweep task; repeat requests reuse the entry
//! and push its idle deadline out. Lookups and inserts for different keys
//! never block each other, and every instance sits behind its own mutex so
//! two requests from the same client cannot interleave on its scoped
//! fields.

use crate::page::{Page, PageInstance};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

type InstanceTable = Arc<DashMap<u32, Arc<Mutex<PageInstance>>>>;

pub struct InstanceCache {
    routes: DashMap<String, InstanceTable>,
    max_age: Duration,
}

impl InstanceCache {
    pub fn new(max_age: Duration) -> Self {
        Self {
            routes: DashMap::new(),
            max_age,
        }
    }

    /// Fetches the client's instance for this page, creating it (and its
    /// sweep task) on first access. The caller refreshes scoped fields
    /// under the instance lock.
    pub fn checkout(&self, page: &Page, client_key: u32) -> Arc<Mutex<PageInstance>> {
        let table = self
            .routes
            .entry(page.path().to_string())
            .or_default()
            .clone();
        let mut created = false;
        let instance = table
            .entry(client_key)
            .or_insert_with(|| {
                created = true;
                Arc::new(Mutex::new(PageInstance::new(page.callbacks())))
            })
            .clone();
        if created {
            tokio::spawn(sweep(table.clone(), client_key, self.max_age));
        }
        instance
    }

    /// Live instance count for one route.
    pub fn instances_for(&self, path: &str) -> usize {
        self.routes.get(path).map(|t| t.len()).unwrap_or(0)
    }
}

/// Removes the entry once its idle age crosses the threshold, re-arming
/// while requests keep touching it. Removal is idempotent; a concurrently
/// vanished entry just ends the task.
async fn sweep(table: InstanceTable, client_key: u32, max_age: Duration) {
    let mut wait = max_age;
    loop {
        tokio::time::sleep(wait).await;
        let instance = match table.get(&client_key) {
            Some(entry) => entry.value().clone(),
            None => return,
        };
        let idle = instance.lock().await.idle();
        if idle >= max_age {
            table.remove(&client_key);
            tracing::debug!(client_key, "evicted idle page instance");
            return;
        }
        wait = max_age - idle;
    }
}
