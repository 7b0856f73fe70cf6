// ABOUTME: Task-scoped request context carrying the verified bearer token to nested outbound calls
// ABOUTME: Values are bound to a future's extent and restored on completion, error or cancellation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Request Context
//!
//! The auth gate stores the verified raw token here so that outbound clients
//! deep inside the handler can forward it without the token being threaded
//! through every function signature.
//!
//! The slot is a tokio task-local. [`RequestContext::scope`] binds a token to
//! one future: it is visible only while that future is being polled, and it
//! disappears when the future completes, returns an error or is dropped
//! mid-flight. Concurrent requests run in separate tasks and never see each
//! other's tokens.
//!
//! Work spawned onto another task does not inherit the slot; wrap it with
//! [`RequestContext::propagate`] to carry the caller's token over.

use std::cell::RefCell;
use std::future::Future;

use thiserror::Error;

use crate::auth::BearerToken;

tokio::task_local! {
    static CURRENT_TOKEN: RefCell<Option<BearerToken>>;
}

/// Misuse of the request context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// `set` was called outside any `scope`
    #[error("no request context scope is active on this task")]
    NoActiveScope,
}

/// Access to the current request's bearer token
pub struct RequestContext;

impl RequestContext {
    /// Token of the request being handled, if any
    #[must_use]
    pub fn get() -> Option<BearerToken> {
        CURRENT_TOKEN
            .try_with(|slot| slot.borrow().clone())
            .ok()
            .flatten()
    }

    /// Run `fut` with `token` as the current token
    ///
    /// Nested scopes shadow the outer value and the outer value is visible
    /// again once the inner future finishes.
    pub async fn scope<F>(token: BearerToken, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_TOKEN.scope(RefCell::new(Some(token)), fut).await
    }

    /// Run `fut` with an empty slot
    ///
    /// Useful for code that must not forward the caller's credentials.
    pub async fn detached<F>(fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_TOKEN.scope(RefCell::new(None), fut).await
    }

    /// Replace the token inside the active scope
    ///
    /// The previous value comes back when the returned guard is reset or
    /// dropped. Guards must be released in reverse order of creation.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveScope` when called outside [`RequestContext::scope`].
    pub fn set(token: BearerToken) -> Result<ContextGuard, ContextError> {
        let previous = CURRENT_TOKEN
            .try_with(|slot| slot.replace(Some(token)))
            .map_err(|_| ContextError::NoActiveScope)?;
        Ok(ContextGuard {
            previous: Some(previous),
        })
    }

    /// Carry the current token into a future that will run on another task
    ///
    /// ```rust,no_run
    /// # use assistant_gateway::context::RequestContext;
    /// # async fn example() {
    /// let handle = tokio::spawn(RequestContext::propagate(async {
    ///     RequestContext::get()
    /// }));
    /// # let _ = handle.await;
    /// # }
    /// ```
    pub fn propagate<F>(fut: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        CURRENT_TOKEN.scope(RefCell::new(Self::get()), fut)
    }
}

/// Restores the previous token when reset or dropped
#[must_use = "dropping the guard immediately restores the previous token"]
pub struct ContextGuard {
    previous: Option<Option<BearerToken>>,
}

impl ContextGuard {
    /// Restore the previous token now
    pub fn reset(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if let Some(previous) = self.previous.take() {
            // A scope that already ended has nothing left to restore
            let _ = CURRENT_TOKEN.try_with(|slot| *slot.borrow_mut() = previous);
        }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

impl std::fmt::Debug for ContextGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextGuard")
            .field("armed", &self.previous.is_some())
            .finish()
    }
}
