// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoped diagnostic contexts.
//!
//! This module provides the core scope handle that attaches a serialized value
//! to the thread-local [store](crate::store) for the duration of a lexical
//! scope, and removes or restores it when the scope ends.
//!
//! # Overview
//!
//! The context system consists of two pieces:
//!
//! - [`MdcContext`]: an RAII handle created by the `of*` constructors. Its
//!   `Drop` impl restores whatever the store held for the key before the
//!   handle was created - a guaranteed-release contract that holds on normal
//!   return, early return, and unwind alike.
//! - [`MdcKeySupplier`]: a typed 1:1 type-to-key mapping for callers that want
//!   type-stable keys instead of ad hoc strings.
//!
//! # Scope discipline
//!
//! Handles for the same key must be dropped in reverse creation order (LIFO).
//! Each handle only guarantees correct restoration of *its own* prior value;
//! releasing out of order is a caller error the store does not guard against.
//! Creating a nested handle under an already-populated key is legal but almost
//! always a scoping bug, and is reported as such (see [`MdcContext::of`]).
//!
//! ```rust
//! use scoped_mdc::{MdcContext, store};
//!
//! {
//!     let _ctx = MdcContext::of("order", &42);
//!     // every log line emitted here can carry the order entry
//!     assert!(store::get("order").is_some());
//! }
//! assert!(store::get("order").is_none());
//! ```

mod key;
mod scope;


pub use key::MdcKeySupplier;
pub use scope::MdcContext;
