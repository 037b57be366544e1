use std::time::Duration;

use thiserror::Error;

use crate::key::{ResourceKind, ScopeTier};

/// A read-only collaborator (permission or hierarchy repository) failed.
#[derive(Debug, Error)]
#[error("{operation} lookup failed")]
pub struct LookupError {
    pub operation: &'static str,
    #[source]
    pub source: anyhow::Error,
}

impl LookupError {
    pub fn new(operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }
}

/// Failure while resolving a managed or own scope.
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// A scoped permission names a kind no provider was registered for.
    #[error("no {tier} scope provider registered for resource kind {resource}")]
    Unregistered {
        tier: ScopeTier,
        resource: ResourceKind,
    },
}

/// Errors surfaced by [`AccessDecisionEngine::check_access`](crate::AccessDecisionEngine::check_access).
///
/// Callers must treat every variant as a deny.
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("access check did not finish within {0:?}")]
    TimedOut(Duration),
}

pub type AuthzResult<T> = Result<T, AuthzError>;
