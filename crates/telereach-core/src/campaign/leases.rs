//! Exclusive account leases across concurrent campaign runs
//!
//! Two runs sharing an account would race its rate-limit counters and its
//! underlying session, so a run leases each account before using it. Leases
//! release on drop, which covers early returns and cancelled runs without
//! any explicit cleanup path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use telereach_common::types::{AccountId, RunId};
use tracing::debug;

/// Tracks which run currently holds each account
#[derive(Default)]
pub struct AccountLeaseRegistry {
    held: Mutex<HashMap<AccountId, RunId>>,
}

impl AccountLeaseRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to lease an account for a run
    ///
    /// Returns `None` when any run, including the caller, already holds the
    /// account.
    pub fn try_acquire(
        self: &Arc<Self>,
        account_id: AccountId,
        run_id: RunId,
    ) -> Option<AccountLease> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if held.contains_key(&account_id) {
            return None;
        }
        held.insert(account_id, run_id);
        debug!("Account {} leased by run {}", account_id, run_id);
        Some(AccountLease {
            registry: Arc::clone(self),
            account_id,
            run_id,
        })
    }

    /// Run currently holding the account, if any
    pub fn holder(&self, account_id: &AccountId) -> Option<RunId> {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(account_id)
            .copied()
    }

    /// Number of accounts currently leased
    pub fn held_count(&self) -> usize {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, account_id: &AccountId, run_id: RunId) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the holding run may release; a stale guard must not evict a
        // newer lease.
        if held.get(account_id) == Some(&run_id) {
            held.remove(account_id);
            debug!("Account {} released by run {}", account_id, run_id);
        }
    }
}

/// Exclusive hold on one account, released on drop
pub struct AccountLease {
    registry: Arc<AccountLeaseRegistry>,
    account_id: AccountId,
    run_id: RunId,
}

impl AccountLease {
    /// The leased account
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }
}

impl Drop for AccountLease {
    fn drop(&mut self) {
        self.registry.release(&self.account_id, self.run_id);
    }
}
