//! Account selection for outreach sends
//!
//! The selector owns the working account pool for one run: which accounts
//! are still usable, how many attempts each has taken so far, and which are
//! resting after a flood-wait. Selection never fails loudly; an empty result
//! tells the caller no account is eligible right now.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use telereach_common::types::AccountId;
use telereach_storage::models::Account;

use super::limiter;

/// How the next account is picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Least-loaded account first, so sends spread across the pool
    Rotation,
    /// Fixed cyclical order regardless of load
    Static,
}

/// Working account pool for a single run
pub struct AccountSelector {
    mode: SelectionMode,
    respect_limits: bool,
    accounts: Vec<Account>,
    in_flight: HashMap<AccountId, u32>,
    paused_until: HashMap<AccountId, DateTime<Utc>>,
    cursor: usize,
}

impl AccountSelector {
    /// Build a selector over the given pool, preserving its order
    pub fn new(accounts: Vec<Account>, mode: SelectionMode, respect_limits: bool) -> Self {
        Self {
            mode,
            respect_limits,
            accounts,
            in_flight: HashMap::new(),
            paused_until: HashMap::new(),
            cursor: 0,
        }
    }

    /// Pick the next account for a send, or nothing if none qualifies
    ///
    /// Rotation chooses the lowest `sent_this_hour + in_flight`, breaking
    /// ties by the most hourly headroom and then by pool order. Static walks
    /// the pool in a fixed cycle. Both skip unauthorized and resting
    /// accounts; the limit check applies only under `respect_limits`.
    pub fn select(&mut self, now: DateTime<Utc>) -> Option<Account> {
        match self.mode {
            SelectionMode::Rotation => self.select_rotation(now),
            SelectionMode::Static => self.select_static(now),
        }
    }

    fn select_rotation(&mut self, now: DateTime<Utc>) -> Option<Account> {
        let mut best: Option<(usize, i64, i64)> = None;
        for (idx, account) in self.accounts.iter().enumerate() {
            if !self.eligible(account, now) {
                continue;
            }
            let in_flight = self.in_flight_for(account.id);
            let load = i64::from(account.sent_this_hour) + i64::from(in_flight);
            let headroom = limiter::hourly_headroom(account, in_flight);
            let better = match best {
                None => true,
                Some((_, best_load, best_headroom)) => {
                    load < best_load || (load == best_load && headroom > best_headroom)
                }
            };
            if better {
                best = Some((idx, load, headroom));
            }
        }
        best.map(|(idx, _, _)| self.accounts[idx].clone())
    }

    fn select_static(&mut self, now: DateTime<Utc>) -> Option<Account> {
        let len = self.accounts.len();
        if len == 0 {
            return None;
        }
        for offset in 0..len {
            let idx = (self.cursor + offset) % len;
            if self.eligible(&self.accounts[idx], now) {
                self.cursor = (idx + 1) % len;
                return Some(self.accounts[idx].clone());
            }
        }
        None
    }

    fn eligible(&self, account: &Account, now: DateTime<Utc>) -> bool {
        if !account.is_authorized() {
            return false;
        }
        if let Some(until) = self.paused_until.get(&account.id) {
            if *until > now {
                return false;
            }
        }
        if self.respect_limits && !limiter::can_send(account, self.in_flight_for(account.id)) {
            return false;
        }
        true
    }

    /// Count one delivery attempt against the account
    ///
    /// Attempts count whether or not they deliver, which keeps repeat
    /// selections honest while the durable counters lag behind the run.
    pub fn record_attempt(&mut self, account_id: AccountId) {
        *self.in_flight.entry(account_id).or_insert(0) += 1;
    }

    /// Rest the account until the given time, typically after a flood-wait
    pub fn pause_until(&mut self, account_id: AccountId, until: DateTime<Utc>) {
        self.paused_until.insert(account_id, until);
    }

    /// Drop an account from the pool for the rest of the run
    pub fn remove(&mut self, account_id: AccountId) -> Option<Account> {
        let idx = self.accounts.iter().position(|a| a.id == account_id)?;
        let removed = self.accounts.remove(idx);
        if idx < self.cursor {
            self.cursor -= 1;
        }
        if !self.accounts.is_empty() {
            self.cursor %= self.accounts.len();
        } else {
            self.cursor = 0;
        }
        Some(removed)
    }

    /// Attempts taken through this account so far in the run
    pub fn in_flight_for(&self, account_id: AccountId) -> u32 {
        self.in_flight.get(&account_id).copied().unwrap_or(0)
    }

    /// Whether the pool has no accounts left at all
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Accounts remaining in the pool
    pub fn len(&self) -> usize {
        self.accounts.len()
    }
}
