#![forbid(unsafe_code)]

//! Deterministic host for exercising bound components in tests.
//!
//! [`TestHost`] plays the role of a UI framework: it instantiates component
//! chains, drives their lifecycle, reconciles children by type identity, and
//! re-renders whenever a component asks for it. Futures spawned by
//! future-backed bindings run on a single-threaded [`LocalPool`] that the
//! host drains between render passes, so every run is reproducible.
//!
//! [`RenderTrace`] records what the host did as JSONL with a stable digest,
//! and [`ConfigGuard`] serializes tests that touch the process-wide binding
//! configuration.
//!
//! [`LocalPool`]: futures::executor::LocalPool

pub mod error;
pub mod guard;
pub mod host;
pub mod trace;

pub use error::HarnessError;
pub use guard::ConfigGuard;
pub use host::{DirtyFlag, TestHost};
pub use trace::{RenderTrace, TraceEvent};
