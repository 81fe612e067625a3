// SPDX-License-Identifier: MIT OR Apache-2.0

//! The thread-local diagnostic context store.
//!
//! Each thread owns an independent key-to-payload map. Log formatters read it per
//! record; [`MdcContext`](crate::MdcContext) mutates it with scoped discipline;
//! [`decorate`](crate::decorate) copies it across thread handoffs.
//!
//! The store itself is deliberately dumb: it has no notion of scopes, sentinel
//! markers, or serialization. Entries written directly through [`put`] are
//! "unmanaged" - they are rendered as plain string fields and are the caller's
//! responsibility to remove.
//!
//! # Examples
//!
//! ```rust
//! use scoped_mdc::store;
//!
//! store::put("request_id", "abc-123");
//! assert_eq!(store::get("request_id").as_deref(), Some("abc-123"));
//!
//! let snapshot = store::snapshot();
//! store::clear();
//! assert!(store::is_empty());
//!
//! // A snapshot is a copy, unaffected by later mutation.
//! assert_eq!(snapshot.get("request_id").map(String::as_str), Some("abc-123"));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static STORE: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());
}

/// Returns the payload stored under `key` on the current thread, if any.
#[inline]
pub fn get(key: &str) -> Option<String> {
    STORE
        .try_with(|store| store.borrow().get(key).cloned())
        .unwrap_or(None)
}

/// Stores `payload` under `key`, returning the previous payload if one existed.
#[inline]
pub fn put(key: impl Into<String>, payload: impl Into<String>) -> Option<String> {
    STORE
        .try_with(|store| store.borrow_mut().insert(key.into(), payload.into()))
        .unwrap_or(None)
}

/// Removes `key` from the current thread's store, returning its payload.
#[inline]
pub fn remove(key: &str) -> Option<String> {
    STORE
        .try_with(|store| store.borrow_mut().remove(key))
        .unwrap_or(None)
}

/// Removes every entry from the current thread's store.
#[inline]
pub fn clear() {
    let _ = STORE.try_with(|store| store.borrow_mut().clear());
}

/// Returns true if the current thread's store holds no entries.
#[inline]
pub fn is_empty() -> bool {
    STORE
        .try_with(|store| store.borrow().is_empty())
        .unwrap_or(true)
}

/// Returns the keys currently present, sorted for deterministic output.
pub fn keys() -> Vec<String> {
    STORE
        .try_with(|store| {
            let mut keys: Vec<String> = store.borrow().keys().cloned().collect();
            keys.sort();
            keys
        })
        .unwrap_or_default()
}

/// Returns an independent copy of the current thread's store contents.
///
/// The copy is immutable with respect to the live store: later [`put`]s or
/// [`remove`]s do not affect it. This is the capture half of cross-thread
/// propagation.
pub fn snapshot() -> HashMap<String, String> {
    STORE
        .try_with(|store| store.borrow().clone())
        .unwrap_or_default()
}

/// Replaces the current thread's store contents wholesale.
///
/// This is the install half of cross-thread propagation: entries not present
/// in `contents` are dropped, everything in `contents` becomes live.
pub fn install(contents: HashMap<String, String>) {
    let _ = STORE.try_with(|store| *store.borrow_mut() = contents);
}
