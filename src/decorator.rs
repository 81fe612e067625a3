// SPDX-License-Identifier: MIT OR Apache-2.0

//! Propagating diagnostic context across thread handoffs.
//!
//! Thread-local context does not follow work that is shipped to another
//! thread: a closure queued on a pool executes with whatever context that
//! worker happens to have, usually none. [`decorate`] closes the gap - it
//! snapshots the producing thread's store at decoration time and returns a
//! closure that installs the snapshot on the executing thread for exactly the
//! duration of the work, then restores whatever that thread held before.
//!
//! The worker may already carry context of its own (a long-lived pool thread
//! that leaked entries, or legitimately nested decoration). What happens then
//! is governed by [`OverwriteStrategy`], fixed at decoration time.
//!
//! Restoration is unconditional once the work begins: it is driven by a drop
//! guard, so a panicking workload still leaves the executing thread's store
//! exactly as it found it, and the panic propagates unchanged. Work that is
//! decorated but never run installs nothing and leaks nothing.
//!
//! ```rust
//! use scoped_mdc::{decorate, MdcContext, OverwriteStrategy, store};
//!
//! let _ctx = MdcContext::of("job", &"import");
//! let task = decorate(
//!     || store::get("job").is_some(),
//!     OverwriteStrategy::PreventOverwrite,
//! );
//!
//! let handle = std::thread::spawn(task);
//! assert!(handle.join().unwrap());
//! ```
//!
//! For futures polled on executor threads, [`ApplyMdc`] performs the same
//! install/restore bracket around every poll.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::Poll;

use crate::store;

/// What to do when decorated work executes on a thread that already has
/// context entries of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverwriteStrategy {
    /// Leave the executing thread's context untouched and run the work
    /// without the snapshot. Logs a WARN naming the keys that blocked
    /// installation.
    PreventOverwrite,
    /// Install the snapshot, logging a WARN naming the keys being overwritten.
    LogOverwrite,
    /// Install the snapshot silently.
    JustOverwrite,
}

/// Wraps `f` so that, wherever it eventually runs, it runs under the calling
/// thread's current context.
///
/// The snapshot is taken here, at decoration time; later mutation of the
/// producing thread's store does not affect it. An empty snapshot disables
/// propagation entirely - the executing thread's own context is left alone
/// and no restoration occurs.
///
/// The executing thread's prior contents are restored after `f` returns or
/// panics. Mutations `f` itself makes to the store are discarded with the
/// installed snapshot; only when nothing was installed (empty snapshot, or
/// [`PreventOverwrite`](OverwriteStrategy::PreventOverwrite) declining) do
/// they survive, mirroring undecorated execution.
pub fn decorate<F, R>(f: F, strategy: OverwriteStrategy) -> impl FnOnce() -> R + Send
where
    F: FnOnce() -> R + Send,
{
    let snapshot = store::snapshot();
    move || run_propagated(snapshot, strategy, f)
}

fn run_propagated<F, R>(parent: HashMap<String, String>, strategy: OverwriteStrategy, f: F) -> R
where
    F: FnOnce() -> R,
{
    let child = store::snapshot();
    let mut restore = None;
    if !parent.is_empty() {
        let child_keys = sorted_keys(&child);
        if strategy != OverwriteStrategy::PreventOverwrite || child_keys.is_empty() {
            if strategy == OverwriteStrategy::LogOverwrite && !child_keys.is_empty() {
                tracing::warn!(
                    "MDC context will be set despite MDC keys being present in target thread. \
                     MDC keys present: {child_keys:?}"
                );
            }
            store::install(parent);
            tracing::debug!("MDC context set for runnable.");
            restore = Some(child);
        } else {
            tracing::warn!(
                "MDC context was not set for runnable because it was run in a thread that \
                 already had a context. MDC keys present: {child_keys:?}"
            );
        }
    }
    // restores on unwind as well; the panic itself propagates unchanged
    let _guard = RestoreOnExit { prior: restore };
    f()
}

fn sorted_keys(contents: &HashMap<String, String>) -> Vec<&str> {
    let mut keys: Vec<&str> = contents.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

struct RestoreOnExit {
    prior: Option<HashMap<String, String>>,
}

impl Drop for RestoreOnExit {
    fn drop(&mut self) {
        if let Some(prior) = self.prior.take() {
            if prior.is_empty() {
                store::clear();
            } else {
                store::install(prior);
            }
        }
    }
}

/// A [`Future`] wrapper that applies a context snapshot around every poll.
///
/// Executors generally poll futures on whatever thread is free, so
/// thread-local context set when the future was created is not visible inside
/// it. `ApplyMdc` snapshots the store at construction and, on each poll,
/// installs the snapshot, polls the inner future, re-captures the store (so
/// entries the future added or updated survive to its next poll), and
/// restores the executor thread's prior contents.
///
/// ```rust
/// use scoped_mdc::{ApplyMdc, MdcContext, store};
///
/// async fn work() -> bool {
///     store::get("job").is_some()
/// }
///
/// # fn demo() -> impl std::future::Future<Output = bool> {
/// let _ctx = MdcContext::of("job", &1);
/// ApplyMdc::new(work())
/// # }
/// ```
#[derive(Debug)]
pub struct ApplyMdc<F> {
    snapshot: HashMap<String, String>,
    future: F,
}

impl<F> ApplyMdc<F> {
    /// Wraps `future`, capturing the calling thread's current context.
    pub fn new(future: F) -> Self {
        Self {
            snapshot: store::snapshot(),
            future,
        }
    }
}

impl<F> Future for ApplyMdc<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        //safety: `future` is never moved out of `this`
        let this = unsafe { self.get_unchecked_mut() };
        let future = unsafe { Pin::new_unchecked(&mut this.future) };
        let prior = store::snapshot();
        store::install(std::mem::take(&mut this.snapshot));
        let result = future.poll(cx);
        this.snapshot = store::snapshot();
        store::install(prior);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_leaves_executing_context_alone() {
        store::clear();
        let task = decorate(
            || {
                store::put("own", "entry");
                store::get("own").is_some()
            },
            OverwriteStrategy::JustOverwrite,
        );
        // empty parent snapshot: nothing installed, nothing restored
        assert!(task());
        assert_eq!(store::get("own").as_deref(), Some("entry"));
        store::clear();
    }

    #[test]
    fn snapshot_is_taken_at_decoration_time() {
        store::clear();
        store::put("k", "at-decoration");
        let task = decorate(
            || store::get("k"),
            OverwriteStrategy::JustOverwrite,
        );
        store::put("k", "mutated-later");
        let observed = std::thread::spawn(task).join().unwrap();
        assert_eq!(observed.as_deref(), Some("at-decoration"));
        store::clear();
    }
}
