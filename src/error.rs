use thiserror::Error;

use crate::route::RouteGroup;

/// NavigationError
///
/// Returned by a `Navigator` when it refuses to move to a target path.
/// The gate never retries a rejected navigation; the error is handed back to the host.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("navigation to '{target}' rejected: {reason}")]
    Rejected { target: String, reason: String },
}

/// GateError
///
/// Everything that can go wrong around the Access Gate. The decision function itself
/// is total; these errors come from its collaborators or from a bad route map.
#[derive(Debug, Error)]
pub enum GateError {
    /// A root path does not classify into the group it is supposed to lead to.
    /// Redirecting there would re-trigger the same redirect on the next evaluation.
    #[error("root '{path}' must belong to the {expected:?} group")]
    UnstableRoot { path: String, expected: RouteGroup },

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("session fetch failed: {0}")]
    SessionFetch(#[from] reqwest::Error),
}
