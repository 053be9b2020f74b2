//! Request-generation fencing for re-fetches.
//!
//! In-flight fetches are never cancelled, so a superseded request can still
//! resolve after a newer one. Each fetch takes a token before starting;
//! only the response holding the newest token may commit, so stale results
//! are discarded instead of racing last-write-wins.

use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque proof of which fetch generation a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

#[derive(Debug, Default)]
struct TokenIssuer(AtomicU64);

impl TokenIssuer {
    fn issue(&self) -> RequestToken {
        RequestToken(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.0.load(Ordering::SeqCst)
    }
}

/// Holds the value from the newest completed request only.
#[derive(Debug, Default)]
pub struct Latest<T> {
    issuer: TokenIssuer,
    value: Option<T>,
}

impl<T> Latest<T> {
    pub fn new() -> Self {
        Self {
            issuer: TokenIssuer::default(),
            value: None,
        }
    }

    /// Registers a new fetch attempt, superseding all earlier tokens.
    pub fn begin(&self) -> RequestToken {
        self.issuer.issue()
    }

    /// Stores `value` iff `token` is still the newest issued. Returns
    /// whether the commit took effect.
    pub fn commit(&mut self, token: RequestToken, value: T) -> bool {
        if !self.issuer.is_current(token) {
            return false;
        }
        self.value = Some(value);
        true
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_token_wins_regardless_of_arrival_order() {
        let mut latest = Latest::new();
        let first = latest.begin();
        let second = latest.begin();

        // Newer response lands first; the stale one must be discarded.
        assert!(latest.commit(second, "new"));
        assert!(!latest.commit(first, "old"));
        assert_eq!(latest.get(), Some(&"new"));
    }

    #[test]
    fn test_sequential_fetches_commit_normally() {
        let mut latest = Latest::new();

        let token = latest.begin();
        assert!(latest.commit(token, 1));

        let token = latest.begin();
        assert!(latest.commit(token, 2));
        assert_eq!(latest.take(), Some(2));
        assert_eq!(latest.get(), None);
    }

    #[test]
    fn test_begin_supersedes_uncommitted_token() {
        let mut latest: Latest<u32> = Latest::new();
        let stale = latest.begin();
        let _newer = latest.begin();

        assert!(!latest.commit(stale, 7));
        assert_eq!(latest.get(), None);
    }
}
