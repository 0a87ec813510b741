//! Status enums for the shopping flow.

use serde::{Deserialize, Serialize};

/// Where the visitor's cart currently stands.
///
/// Checkout and login are redirects to hosted pages, so they are terminal
/// from this application's point of view and have no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    /// No cart, or a cart without line items.
    #[default]
    Empty,
    /// At least one line item.
    HasItems,
}

impl CartStatus {
    /// Derive the status from a line item count.
    #[must_use]
    pub const fn from_line_count(count: usize) -> Self {
        if count == 0 { Self::Empty } else { Self::HasItems }
    }

    /// Whether checkout and login actions should be offered.
    #[must_use]
    pub const fn can_checkout(self) -> bool {
        matches!(self, Self::HasItems)
    }
}

/// Sales channel reported when creating a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelType {
    #[default]
    Web,
    Pos,
    OtherPlatform,
}

impl std::fmt::Display for CartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::HasItems => write!(f, "has_items"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_status_from_count() {
        assert_eq!(CartStatus::from_line_count(0), CartStatus::Empty);
        assert_eq!(CartStatus::from_line_count(3), CartStatus::HasItems);
        assert!(!CartStatus::Empty.can_checkout());
    }

    #[test]
    fn test_channel_type_wire_name() {
        assert_eq!(serde_json::to_string(&ChannelType::Web).unwrap(), "\"WEB\"");
    }
}
