//! Session cache - bounded store for live gateway sessions
//!
//! Connecting a Telegram session is expensive, so live sessions are kept
//! between sends. The cache is bounded two ways: entries idle past the TTL
//! are dropped, and inserting past capacity evicts the least recently used
//! entry first.

use std::collections::HashMap;
use std::sync::Arc;
use telereach_common::config::SessionConfig;
use telereach_common::types::AccountId;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry<S> {
    session: Arc<S>,
    last_used: Instant,
}

/// LRU session cache keyed by account
pub struct SessionCache<S> {
    entries: RwLock<HashMap<AccountId, CacheEntry<S>>>,
    ttl: Duration,
    capacity: usize,
}

impl<S> SessionCache<S> {
    /// Create a cache with the given idle TTL and capacity
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            // A zero-capacity cache could never hold the session being inserted
            capacity: capacity.max(1),
        }
    }

    /// Create a cache from configuration
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs), config.capacity)
    }

    /// Fetch a live session, refreshing its idle timer
    ///
    /// Entries idle past the TTL are dropped rather than returned.
    pub async fn get(&self, account_id: &AccountId) -> Option<Arc<S>> {
        let mut entries = self.entries.write().await;
        let expired = match entries.get_mut(account_id) {
            Some(entry) => {
                if entry.last_used.elapsed() <= self.ttl {
                    entry.last_used = Instant::now();
                    return Some(Arc::clone(&entry.session));
                }
                true
            }
            None => false,
        };
        if expired {
            entries.remove(account_id);
            debug!("Session for account {} expired from cache", account_id);
        }
        None
    }

    /// Store a session, evicting the least recently used entry when full
    pub async fn insert(&self, account_id: AccountId, session: S) -> Arc<S> {
        let session = Arc::new(session);
        let mut entries = self.entries.write().await;
        if !entries.contains_key(&account_id) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| *id);
            if let Some(id) = oldest {
                entries.remove(&id);
                debug!("Session for account {} evicted from cache", id);
            }
        }
        entries.insert(
            account_id,
            CacheEntry {
                session: Arc::clone(&session),
                last_used: Instant::now(),
            },
        );
        session
    }

    /// Drop a session, returning it if present
    ///
    /// Used when an account dies mid-run so a poisoned session is never reused.
    pub async fn remove(&self, account_id: &AccountId) -> Option<Arc<S>> {
        self.entries
            .write()
            .await
            .remove(account_id)
            .map(|entry| entry.session)
    }

    /// Sweep all entries idle past the TTL, returning how many were dropped
    pub async fn evict_idle(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.last_used.elapsed() <= self.ttl);
        before - entries.len()
    }

    /// Number of cached sessions
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no sessions
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
