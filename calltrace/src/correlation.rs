//! Correlation id lifecycle.
//!
//! At most one correlation id is active per execution context. Inside a
//! [`scope`] (or [`sync_scope`]) the id lives in a tokio task-local cell and
//! follows the task across `.await` points and worker threads. Outside any
//! scope it falls back to a thread-local cell, which suits plain synchronous
//! callers.
//!
//! Async hosts should wrap each unit of work (an inbound request, a queue
//! message) in [`scope`] or [`scope_inbound`].
//! [`Interceptor::observe_async`](crate::Interceptor::observe_async) opens a
//! scope itself when none is active, so an observed future never writes the
//! fallback cell.
//!
//! # Example
//! ```rust,ignore
//! use calltrace::correlation::{self, CorrelationId};
//!
//! correlation::scope(Some(CorrelationId::from_string("abc")), async {
//!     assert_eq!(correlation::current().unwrap().as_str(), "abc");
//! })
//! .await;
//! ```

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::future::Future;

use crate::descriptor::MethodDescriptor;

tokio::task_local! {
    static TASK_CORRELATION: RefCell<Option<CorrelationId>>;
}

thread_local! {
    static THREAD_CORRELATION: RefCell<Option<CorrelationId>> = const { RefCell::new(None) };
}

/// Opaque correlation token. Generated ids are UUID v4 text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a new unique correlation ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create a correlation ID from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// Storage
// =============================================================================

fn with_store<R>(f: impl Fn(&RefCell<Option<CorrelationId>>) -> R) -> R {
    TASK_CORRELATION
        .try_with(|cell| f(cell))
        .unwrap_or_else(|_| THREAD_CORRELATION.with(|cell| f(cell)))
}

/// The active correlation id, if any.
pub fn current() -> Option<CorrelationId> {
    with_store(|cell| cell.borrow().clone())
}

/// Activates `id`, replacing any active id.
pub fn set(id: CorrelationId) {
    with_store(|cell| *cell.borrow_mut() = Some(id.clone()));
}

/// Removes the active id.
pub fn clear() {
    with_store(|cell| *cell.borrow_mut() = None);
}

/// Returns true if called inside a task-local correlation scope.
pub fn in_scope() -> bool {
    TASK_CORRELATION.try_with(|_| ()).is_ok()
}

/// Runs `future` with its own correlation cell, starting at `initial`.
pub fn scope<F: Future>(initial: Option<CorrelationId>, future: F) -> impl Future<Output = F::Output> {
    TASK_CORRELATION.scope(RefCell::new(initial), future)
}

/// Runs `f` synchronously with its own correlation cell, starting at `initial`.
pub fn sync_scope<R>(initial: Option<CorrelationId>, f: impl FnOnce() -> R) -> R {
    TASK_CORRELATION.sync_scope(RefCell::new(initial), f)
}

/// Resolves the id for an inbound request: a non-blank header value wins,
/// otherwise a fresh id is generated.
pub fn inbound(header_value: Option<&str>) -> CorrelationId {
    match header_value.map(str::trim) {
        Some(value) if !value.is_empty() => CorrelationId::from_string(value),
        _ => CorrelationId::new(),
    }
}

/// Runs `future` in a scope seeded from an inbound header value.
///
/// The id is dropped together with the scope when the future completes.
pub fn scope_inbound<F: Future>(
    header_value: Option<&str>,
    future: F,
) -> impl Future<Output = F::Output> {
    scope(Some(inbound(header_value)), future)
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Seeds and clears the correlation id around seeding methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationManager;

impl CorrelationManager {
    /// Creates a manager.
    pub fn new() -> Self {
        Self
    }

    /// On entry to a seeding method with no active id, activates a new one.
    ///
    /// Returns the id generated by this call, if any.
    pub fn on_enter(&self, method: &MethodDescriptor) -> Option<CorrelationId> {
        if !method.requests_correlation() {
            return None;
        }
        with_store(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.is_some() {
                return None;
            }
            let id = CorrelationId::new();
            *slot = Some(id.clone());
            Some(id)
        })
    }

    /// On exit from a seeding method, clears the active id.
    ///
    /// The id is cleared even when an outer seeding method created it.
    pub fn on_exit(&self, method: &MethodDescriptor) {
        if method.requests_correlation() {
            clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_unique() {
        let id1 = CorrelationId::new();
        let id2 = CorrelationId::new();
        assert_ne!(id1, id2);
        assert!(uuid::Uuid::parse_str(id1.as_str()).is_ok());
    }

    #[test]
    fn test_from_string_round_trips() {
        let id = CorrelationId::from_string("req-42");
        assert_eq!(id.as_str(), "req-42");
        assert_eq!(id.to_string(), "req-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"req-42\"");
    }

    #[test]
    fn test_inbound_prefers_header() {
        assert_eq!(inbound(Some("abc")).as_str(), "abc");
        assert_ne!(inbound(Some("   ")).as_str(), "   ");
        assert!(!inbound(None).as_str().is_empty());
    }

    #[test]
    fn test_sync_scope_isolates_thread_cell() {
        clear();
        set(CorrelationId::from_string("outer"));
        sync_scope(None, || {
            assert!(in_scope());
            assert_eq!(current(), None);
            set(CorrelationId::from_string("inner"));
            assert_eq!(current().unwrap().as_str(), "inner");
        });
        assert_eq!(current().unwrap().as_str(), "outer");
        clear();
    }
}
