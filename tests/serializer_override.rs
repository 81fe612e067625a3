// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle of the process-wide serializer override.
//!
//! The override is global state, so these tests serialize themselves with a
//! lock and reset the registry before releasing it.

use parking_lot::Mutex;
use scoped_mdc::provider::JSON_PREFIX;
use scoped_mdc::{
    MdcContext, SerializeError, Serializer, reset_serializer, set_serializer, store,
};
use std::sync::Arc;

static REGISTRY_LOCK: Mutex<()> = Mutex::new(());

#[derive(Debug)]
struct PrettySerializer;

impl Serializer for PrettySerializer {
    fn to_json(&self, value: serde_json::Value) -> Result<String, SerializeError> {
        Ok(serde_json::to_string_pretty(&value)?)
    }
}

#[derive(Debug)]
struct RefusingSerializer;

impl Serializer for RefusingSerializer {
    fn to_json(&self, _value: serde_json::Value) -> Result<String, SerializeError> {
        Err(SerializeError::Render("refused".to_string()))
    }
}

fn stored_payload(key: &str) -> String {
    store::get(key).expect("key not present in store")
}

#[test]
fn override_affects_only_future_serializations() {
    let _lock = REGISTRY_LOCK.lock();

    let value = serde_json::json!({"a": 1, "b": 2});

    let compact_before = MdcContext::of("compact_before", &value);
    assert_eq!(
        stored_payload("compact_before"),
        format!("{JSON_PREFIX}{}", r#"{"a":1,"b":2}"#)
    );

    set_serializer(Arc::new(PrettySerializer));
    {
        let _ctx = MdcContext::of("pretty", &value);
        // pretty output spans lines; the earlier payload is untouched
        assert!(stored_payload("pretty").contains('\n'));
        assert!(!stored_payload("compact_before").contains('\n'));
    }

    reset_serializer();
    {
        let _ctx = MdcContext::of("compact_after", &value);
        assert_eq!(
            stored_payload("compact_after"),
            format!("{JSON_PREFIX}{}", r#"{"a":1,"b":2}"#)
        );
    }

    compact_before.release();
    assert!(store::is_empty());
}

#[test]
fn failing_override_falls_back_to_the_error_marker() {
    let _lock = REGISTRY_LOCK.lock();

    set_serializer(Arc::new(RefusingSerializer));
    {
        let _ctx = MdcContext::of("refused", &1);
        assert_eq!(
            stored_payload("refused"),
            format!("{JSON_PREFIX}{}", r#"{"json_error":"Unserializable Object."}"#)
        );
    }
    reset_serializer();
}
