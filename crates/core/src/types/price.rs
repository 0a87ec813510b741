//! Prices as returned by the commerce service.
//!
//! Amounts arrive as decimal strings alongside a pre-formatted display value
//! in the site currency and, optionally, a converted currency.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price in the site currency with an optional converted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MultiCurrencyPrice {
    /// Amount in the site currency.
    #[serde(default)]
    pub amount: Decimal,
    /// Amount after currency conversion.
    #[serde(default)]
    pub converted_amount: Option<Decimal>,
    /// Display string for `amount`, e.g. `"$12.50"`.
    #[serde(default)]
    pub formatted_amount: Option<String>,
    /// Display string for `converted_amount`.
    #[serde(default)]
    pub formatted_converted_amount: Option<String>,
}

impl MultiCurrencyPrice {
    /// Format for display.
    ///
    /// Prefers the converted display string, then the site display string,
    /// then the raw amount with two decimals.
    #[must_use]
    pub fn display(&self) -> String {
        self.formatted_converted_amount
            .as_deref()
            .or(self.formatted_amount.as_deref())
            .filter(|s| !s.is_empty())
            .map_or_else(|| format!("{:.2}", self.amount), str::to_owned)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_string_amounts() {
        let price: MultiCurrencyPrice = serde_json::from_str(
            r#"{"amount":"12.5","convertedAmount":"12.5","formattedAmount":"$12.50","formattedConvertedAmount":"$12.50"}"#,
        )
        .unwrap();
        assert_eq!(price.amount, Decimal::new(125, 1));
        assert_eq!(price.display(), "$12.50");
    }

    #[test]
    fn test_display_falls_back_to_amount() {
        let price = MultiCurrencyPrice {
            amount: Decimal::new(7, 0),
            ..Default::default()
        };
        assert_eq!(price.display(), "7.00");
    }
}
