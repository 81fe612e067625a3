// SPDX-License-Identifier: MIT OR Apache-2.0

//! Type-stable diagnostic context keys.

/// Maps a value type to a fixed diagnostic context key.
///
/// Implement this on a marker type to guarantee that a given payload type is
/// always logged under the same field name, instead of repeating an ad hoc
/// string at every call site:
///
/// ```rust
/// use scoped_mdc::{MdcContext, MdcKeySupplier};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct OrderInfo {
///     id: u64,
/// }
///
/// struct OrderInfoKey;
///
/// impl MdcKeySupplier<OrderInfo> for OrderInfoKey {
///     fn mdc_key() -> &'static str {
///         "order_info"
///     }
/// }
///
/// let order = OrderInfo { id: 17 };
/// let _ctx = MdcContext::of_type::<OrderInfoKey, _>(&order);
/// assert!(scoped_mdc::store::get("order_info").is_some());
/// ```
///
/// The type parameter `T` is not used by the trait itself; it ties the key to
/// exactly one payload type so the compiler rejects
/// `MdcContext::of_type::<OrderInfoKey, _>(&something_else)`.
pub trait MdcKeySupplier<T> {
    /// The diagnostic context field name to log `T` under.
    fn mdc_key() -> &'static str;
}

/// The last path segment of `T`'s type name, generic parameters stripped.
///
/// `my_crate::api::OrderInfo` becomes `OrderInfo`, `Vec<String>` becomes
/// `Vec`. Used as the key when the caller supplies neither a key string nor a
/// supplier.
pub(crate) fn simple_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_module_path() {
        struct Plain;
        assert_eq!(simple_type_name::<Plain>(), "Plain");
        assert_eq!(simple_type_name::<String>(), "String");
    }

    #[test]
    fn strips_generic_parameters() {
        assert_eq!(simple_type_name::<Vec<String>>(), "Vec");
        assert_eq!(
            simple_type_name::<std::collections::HashMap<String, Vec<u8>>>(),
            "HashMap"
        );
    }
}
