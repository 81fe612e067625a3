// SPDX-License-Identifier: MIT OR Apache-2.0

//! The RAII scope handle.

use serde::Serialize;
use std::marker::PhantomData;
use std::panic::Location;

use crate::provider::JSON_PREFIX;
use crate::serializer::serialize_payload;
use crate::store;

use super::key::{MdcKeySupplier, simple_type_name};

/// A scoped entry in the thread-local diagnostic context.
///
/// Creating an `MdcContext` serializes a value to JSON, tags it with the
/// sentinel marker, and writes it into the current thread's
/// [store](crate::store). Dropping the handle restores the store to its prior
/// state for that key: the previous payload if one existed, absence otherwise.
/// Because restoration lives in `Drop`, it runs on every exit path of the
/// owning scope - normal return, `?`, or unwind.
///
/// Creation never fails. A value that cannot be serialized is replaced with a
/// fixed error-marker object and the failure is logged; the handle is returned
/// regardless.
///
/// Handles are single-use and not `Send`: restoration must happen on the
/// thread that created the entry, exactly once.
///
/// # Examples
///
/// ```rust
/// use scoped_mdc::{MdcContext, store};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Job {
///     id: u32,
///     name: String,
/// }
///
/// let job = Job { id: 23, name: "import".to_string() };
///
/// {
///     let _ctx = MdcContext::of("job", &job);
///     // log lines emitted here can carry the serialized job
///     assert!(store::get("job").unwrap().contains("import"));
/// }
/// assert!(store::get("job").is_none());
/// ```
///
/// Nesting different keys composes freely; nesting the *same* key restores
/// the outer value on inner drop, but is reported as a scoping bug (see
/// [`of`](MdcContext::of)).
#[derive(Debug)]
#[must_use = "the entry is removed again when the handle is dropped"]
pub struct MdcContext {
    key: String,
    prior: Option<String>,
    // restoration must happen on the creating thread
    _not_send: PhantomData<*const ()>,
}

impl MdcContext {
    /// Creates a context entry under an explicit key.
    ///
    /// If the store already holds a payload under `key`, a diagnostic is
    /// emitted before overwriting: WARN when the new payload equals the old
    /// one (a superfluous nesting), ERROR when it differs (a scoping bug - a
    /// context should never nest under its own key). The operation proceeds
    /// either way, and dropping the returned handle restores the old payload.
    ///
    /// See [`of_type`](MdcContext::of_type) to derive the key from a
    /// [`MdcKeySupplier`], or [`of_value`](MdcContext::of_value) to fall back
    /// to the value's type name.
    #[track_caller]
    pub fn of<T: Serialize>(key: impl Into<String>, value: &T) -> MdcContext {
        Self::create(key.into(), value, Location::caller())
    }

    /// Creates a context entry whose key is supplied by `K`.
    ///
    /// Use this to guarantee that values of type `T` always land under the
    /// same field name.
    #[track_caller]
    pub fn of_type<K, T>(value: &T) -> MdcContext
    where
        K: MdcKeySupplier<T>,
        T: Serialize,
    {
        Self::create(K::mdc_key().to_string(), value, Location::caller())
    }

    /// Creates a context entry keyed by the simple type name of `T`.
    #[track_caller]
    pub fn of_value<T: Serialize>(value: &T) -> MdcContext {
        Self::create(simple_type_name::<T>().to_string(), value, Location::caller())
    }

    /// Re-serializes `value` into an existing entry.
    ///
    /// Only mutates the store if `key` is already present; otherwise emits a
    /// WARN and does nothing. Updating never touches the prior payload owned
    /// by an open handle, so scopes still restore the state they captured.
    #[track_caller]
    pub fn update<T: Serialize>(key: &str, value: &T) {
        Self::apply_update(key, value, Location::caller());
    }

    /// [`update`](MdcContext::update) with the key supplied by `K`.
    #[track_caller]
    pub fn update_type<K, T>(value: &T)
    where
        K: MdcKeySupplier<T>,
        T: Serialize,
    {
        Self::apply_update(K::mdc_key(), value, Location::caller());
    }

    /// [`update`](MdcContext::update) keyed by the simple type name of `T`.
    #[track_caller]
    pub fn update_value<T: Serialize>(value: &T) {
        Self::apply_update(simple_type_name::<T>(), value, Location::caller());
    }

    /// The key this handle owns.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Consumes the handle, restoring the store's prior state for the key.
    ///
    /// Equivalent to dropping the handle; exists for call sites where an
    /// explicit end of scope reads better than a closing brace.
    #[inline]
    pub fn release(self) {}

    fn create<T: Serialize>(
        key: String,
        value: &T,
        location: &'static Location<'static>,
    ) -> MdcContext {
        let payload = format!("{JSON_PREFIX}{}", serialize_payload(&key, value));
        let prior = store::get(&key);
        if let Some(old) = &prior {
            log_overwrite(&key, old, &payload, location);
        }
        store::put(key.clone(), payload);
        MdcContext {
            key,
            prior,
            _not_send: PhantomData,
        }
    }

    fn apply_update<T: Serialize>(key: &str, value: &T, location: &'static Location<'static>) {
        let payload = format!("{JSON_PREFIX}{}", serialize_payload(key, value));
        if store::get(key).is_some() {
            store::put(key.to_string(), payload);
        } else {
            tracing::warn!(
                "Cannot update content of MDC key {key} in {location} because it does not exist."
            );
        }
    }
}

impl Drop for MdcContext {
    fn drop(&mut self) {
        match self.prior.take() {
            None => {
                store::remove(&self.key);
            }
            Some(prior) => {
                store::put(self.key.as_str(), prior);
            }
        }
    }
}

/// Payloads are compared with the sentinel prefix attached; both sides always
/// carry it for entries created through this type.
fn log_overwrite(key: &str, old: &str, new: &str, location: &'static Location<'static>) {
    if old != new {
        tracing::error!(
            "Overwriting MDC key {key} in {location} - a context with a certain key should never \
             contain another context with the same one. The old value differs from new value. \
             This should never happen, because it messes up the MDC context. \
             Old value: {old} - new value: {new}"
        );
    } else {
        tracing::warn!(
            "Overwriting MDC key {key} in {location} - a context with a certain key should never \
             contain another context with the same one. The value is overwritten with the same \
             value. This is superfluous and should be removed."
        );
    }
}
