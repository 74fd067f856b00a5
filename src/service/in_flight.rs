use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::{AppError, Result};

/// At most one outstanding request per (user, action, target).
///
/// A second submission while the first is still waiting on the backend is
/// refused with [`AppError::InFlight`] instead of being sent twice.
#[derive(Clone, Default)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
}

/// Releases its key on drop, including when the request future is cancelled.
pub struct InFlightTicket {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, username: &str, action: &str, target: &str) -> Result<InFlightTicket> {
        let key = format!("{}:{}:{}", username, action, target);
        let mut keys = self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !keys.insert(key.clone()) {
            tracing::debug!(username, action, target, "duplicate submission refused");
            return Err(AppError::InFlight(format!("A {} request is already in progress", action)));
        }

        Ok(InFlightTicket { keys: self.keys.clone(), key })
    }

    pub fn len(&self) -> usize {
        self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.key);
    }
}
