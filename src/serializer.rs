// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON serialization for context payloads.
//!
//! Values handed to [`MdcContext`](crate::MdcContext) are converted to JSON
//! text in two stages: `serde_json::to_value` maps the value into a
//! [`serde_json::Value`] tree (per-type behavior belongs to the value's
//! [`serde::Serialize`] impl - chrono's types, for example, already render as
//! ISO 8601 strings, and `Option` as `null`/value), then the active
//! [`Serializer`] renders that tree to text.
//!
//! The rendering stage is the pluggable part. A process-wide override can be
//! installed with [`set_serializer`] and removed with [`reset_serializer`];
//! when no override is installed, compact `serde_json` output is used. The
//! override affects only serializations performed after the call.
//!
//! Serialization failure is never surfaced to callers of the context API.
//! The payload is replaced with a fixed error-marker object and the failure is
//! logged at ERROR, so the entry still renders as a JSON *object* downstream -
//! a log indexer that expects an object field must not receive a string.
//!
//! # Examples
//!
//! ```rust
//! use scoped_mdc::{Serializer, SerializeError, set_serializer, reset_serializer};
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct PrettySerializer;
//!
//! impl Serializer for PrettySerializer {
//!     fn to_json(&self, value: serde_json::Value) -> Result<String, SerializeError> {
//!         Ok(serde_json::to_string_pretty(&value)?)
//!     }
//! }
//!
//! set_serializer(Arc::new(PrettySerializer));
//! // ... contexts created here render pretty-printed ...
//! reset_serializer();
//! ```

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Payload substituted when a value cannot be serialized.
///
/// An object, not a string: downstream JSON log consumers index these fields
/// as objects and drop records whose field has the wrong type.
pub const JSON_ERROR_PAYLOAD: &str = r#"{"json_error":"Unserializable Object."}"#;

/// Error produced by the serialization pipeline.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// The value could not be converted to or rendered as JSON.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    /// A custom [`Serializer`] rejected the value.
    #[error("serializer error: {0}")]
    Render(String),
}

/// Renders an already-converted JSON value tree to text.
///
/// Implementations must be cheap to call and thread-safe; a single instance
/// serves every context creation in the process while installed.
pub trait Serializer: Send + Sync {
    /// Renders `value` as JSON text.
    fn to_json(&self, value: serde_json::Value) -> Result<String, SerializeError>;
}

/// The fixed default: compact `serde_json` output.
#[derive(Debug, Default)]
struct DefaultSerializer;

impl Serializer for DefaultSerializer {
    fn to_json(&self, value: serde_json::Value) -> Result<String, SerializeError> {
        Ok(serde_json::to_string(&value)?)
    }
}

static SERIALIZER_OVERRIDE: RwLock<Option<Arc<dyn Serializer>>> = RwLock::new(None);

/// Installs a process-wide serializer override.
///
/// Replaces any previously installed override. Only serializations performed
/// after this call are affected; payloads already in a store keep the text
/// they were created with.
pub fn set_serializer(serializer: Arc<dyn Serializer>) {
    *SERIALIZER_OVERRIDE.write() = Some(serializer);
}

/// Removes the serializer override, restoring the default.
///
/// Tests that install an override must call this between cases.
pub fn reset_serializer() {
    *SERIALIZER_OVERRIDE.write() = None;
}

/// Serializes `value` with the active serializer, falling back to
/// [`JSON_ERROR_PAYLOAD`] on failure.
///
/// The returned text is unprefixed; callers add the sentinel marker. `key` is
/// only used to identify the entry in the failure diagnostic.
pub(crate) fn serialize_payload<T: Serialize>(key: &str, value: &T) -> String {
    match try_serialize(value) {
        Ok(json) => json,
        Err(error) => {
            tracing::error!(
                "Value for MDC key {key} cannot be serialized. ({error})"
            );
            JSON_ERROR_PAYLOAD.to_string()
        }
    }
}

fn try_serialize<T: Serialize>(value: &T) -> Result<String, SerializeError> {
    let tree = serde_json::to_value(value)?;
    let active = SERIALIZER_OVERRIDE.read().clone();
    match active {
        Some(serializer) => serializer.to_json(tree),
        None => DefaultSerializer.to_json(tree),
    }
}
