#![forbid(unsafe_code)]

//! Exclusive access to the process-wide binding configuration.

use std::sync::{Mutex, MutexGuard, PoisonError};

use bindery_runtime::config::{self, BindConfig};

static LOCK: Mutex<()> = Mutex::new(());

/// Holds the configuration lock for the duration of a test.
///
/// The configuration is reset when the guard is acquired and again when it
/// is dropped, so tests never observe each other's loader or hook policy.
#[must_use = "the configuration is only reserved while the guard is alive"]
pub struct ConfigGuard {
    _lock: MutexGuard<'static, ()>,
}

impl ConfigGuard {
    /// Lock with the default configuration.
    pub fn acquire() -> Self {
        let lock = LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        config::reset();
        Self { _lock: lock }
    }

    /// Lock and install `config`.
    pub fn with(config: BindConfig) -> Self {
        let guard = Self::acquire();
        config::configure(config);
        guard
    }
}

impl Drop for ConfigGuard {
    fn drop(&mut self) {
        config::reset();
    }
}

impl std::fmt::Debug for ConfigGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigGuard").finish_non_exhaustive()
    }
}
