#![forbid(unsafe_code)]

//! Errors raised while driving a [`TestHost`](crate::TestHost).

use bindery_runtime::BindError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    /// A component rejected a lifecycle call.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// Components kept requesting renders after the pass limit.
    #[error("host did not settle after {passes} render passes")]
    Unsettled { passes: usize },

    #[error("root component is already mounted")]
    AlreadyMounted,

    #[error("root component is not mounted")]
    NotMounted,
}
