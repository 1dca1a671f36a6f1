#![forbid(unsafe_code)]

//! Errors raised by bound components.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BindError>;

/// Failures surfaced to the host.
///
/// Subscriber panics are not represented here: they are contained and logged
/// by the observable that notifies them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The props-update path ran on an instance that is not mounted.
    ///
    /// This is a host contract violation and is not recovered locally.
    #[error("illegalBindState:{component}")]
    IllegalBindState { component: String },
}

impl BindError {
    /// Display name of the component that raised the error.
    #[must_use]
    pub fn component(&self) -> &str {
        match self {
            Self::IllegalBindState { component } => component,
        }
    }
}
