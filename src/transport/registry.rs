//! Active-session registry.
//!
//! Explicit map from session identifier to a live-session claim, owned by
//! the connection-routing layer; the relay core itself carries no global
//! state. A credential corresponds to one account nonce sequence, so at
//! most one live session may hold an address at a time.

use dashmap::DashMap;
use std::sync::Arc;

use crate::observability::metrics;

/// Registry of currently active sessions, keyed by lowercased address.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<String, ()>,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions,
        }
    }

    /// Claim an address for a new session.
    ///
    /// Returns `None` when the address already has a live session or the
    /// session limit is reached. The claim releases on drop.
    pub fn claim(self: &Arc<Self>, address: &str) -> Option<SessionClaim> {
        if self.sessions.len() >= self.max_sessions {
            tracing::warn!(
                active = self.sessions.len(),
                limit = self.max_sessions,
                "Session limit reached, refusing connection"
            );
            return None;
        }

        let key = address.to_lowercase();
        match self.sessions.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => None,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(());
                metrics::session_opened();
                Some(SessionClaim {
                    registry: Arc::clone(self),
                    key,
                })
            }
        }
    }

    /// Number of live sessions.
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Exclusive hold on an address for one session's lifetime.
/// Releases the address when dropped.
#[derive(Debug)]
pub struct SessionClaim {
    registry: Arc<SessionRegistry>,
    key: String,
}

impl Drop for SessionClaim {
    fn drop(&mut self) {
        self.registry.sessions.remove(&self.key);
        metrics::session_closed();
        tracing::trace!(session = %self.key, "Session claim released");
    }
}
