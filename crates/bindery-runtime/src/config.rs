#![forbid(unsafe_code)]

//! Process-wide binding configuration.
//!
//! Every bound component reads this on each render, so reads are lock-free
//! (`ArcSwap`). Configure once during application setup; later writes apply to
//! all subsequent renders of every bound component.
//!
//! # Example
//!
//! ```
//! use bindery_runtime::config::{self, BindConfig, LoadHookPolicy};
//! use bindery_runtime::Placeholder;
//!
//! config::configure(
//!     BindConfig::new()
//!         .with_loader(Placeholder::new("spinner"))
//!         .with_load_hooks(LoadHookPolicy::Once),
//! );
//! assert_eq!(config::loader().map(|p| p.name().to_string()), Some("spinner".into()));
//! # config::reset();
//! ```

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;

use crate::element::Placeholder;

/// When the `on_load`/`on_loaded` hooks fire within one mount cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadHookPolicy {
    /// The load phase only moves forward: `on_load` fires at most once
    /// (on the first incomplete render) and `on_loaded` at most once. A
    /// binding that becomes undefined again after loading shows the loader
    /// without re-firing either hook.
    #[default]
    Once,
    /// Fire `on_load` on every transition into incompleteness and
    /// `on_loaded` on every transition out of it.
    EveryTransition,
}

/// Configuration shared by all bound components.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindConfig {
    /// Element rendered while any binding is undefined. `None` renders
    /// [`Element::Empty`](crate::Element::Empty).
    pub loader: Option<Arc<Placeholder>>,
    pub load_hooks: LoadHookPolicy,
}

impl BindConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_loader(mut self, loader: Placeholder) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    #[must_use]
    pub fn with_load_hooks(mut self, policy: LoadHookPolicy) -> Self {
        self.load_hooks = policy;
        self
    }
}

static CONFIG: LazyLock<ArcSwap<BindConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(BindConfig::default()));

/// Replace the whole configuration.
pub fn configure(config: BindConfig) {
    CONFIG.store(Arc::new(config));
    tracing::debug!("bind configuration replaced");
}

/// Current configuration snapshot.
#[must_use]
pub fn config() -> Arc<BindConfig> {
    CONFIG.load_full()
}

/// Set the loading placeholder for every bound component.
pub fn set_loader(loader: Placeholder) {
    let loader = Arc::new(loader);
    CONFIG.rcu(|current| BindConfig {
        loader: Some(Arc::clone(&loader)),
        ..BindConfig::clone(current)
    });
}

/// Go back to rendering [`Element::Empty`](crate::Element::Empty) while loading.
pub fn clear_loader() {
    CONFIG.rcu(|current| BindConfig {
        loader: None,
        ..BindConfig::clone(current)
    });
}

/// The configured loading placeholder, if any.
#[must_use]
pub fn loader() -> Option<Arc<Placeholder>> {
    CONFIG.load().loader.clone()
}

/// Restore the defaults.
pub fn reset() {
    configure(BindConfig::default());
}

#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
