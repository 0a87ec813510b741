//! Newtype IDs for type-safe entity references.
//!
//! The commerce service identifies every entity with an opaque GUID string.
//! Use the `define_id!` macro to create wrappers that prevent accidentally
//! passing a cart ID where a product ID is expected.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use headless_demo_core::define_id;
/// define_id!(WidgetId);
/// define_id!(GadgetId);
///
/// let widget = WidgetId::new("b7e1");
/// let gadget = GadgetId::new("b7e1");
///
/// // These are different types, so this won't compile:
/// // let _: WidgetId = gadget;
/// assert_eq!(widget.as_str(), gadget.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

define_id!(ProductId);
define_id!(CartId);
define_id!(LineItemId);
define_id!(CheckoutId);
define_id!(DataItemId);
define_id!(MemberId);
define_id!(AppId);

/// App ID of the stores catalog, used in cart catalog references.
pub const STORES_APP_ID: &str = "1380b703-ce81-ff05-f115-39571d94dfcd";

impl AppId {
    /// The stores catalog app.
    #[must_use]
    pub fn stores() -> Self {
        Self::new(STORES_APP_ID)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_transparently() {
        let id = ProductId::new("df19c1f7-07d8-a265-42f8-e8dfa824cc6e");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"df19c1f7-07d8-a265-42f8-e8dfa824cc6e\"");

        let back: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_stores_app_id() {
        assert_eq!(AppId::stores().to_string(), STORES_APP_ID);
    }
}
