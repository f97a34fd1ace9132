//! Catalog data: products and their customization options.
//!
//! Field names follow the backend's row shape so rows deserialize directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A sellable product. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Price before option adjustments.
    pub base_price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// How an option is presented and priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Color,
    Numeric,
    Select,
}

/// One entry of a color/select option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub value: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub price_adjustment: Option<f64>,
}

/// Bounds of a numeric option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl NumericRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A selected value: text for color/select, a number for numeric options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Number(f64),
    Text(String),
}

impl OptionValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            OptionValue::Number(n) => Some(*n),
            OptionValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            OptionValue::Number(_) => None,
        }
    }

    /// Empty text counts as "not selected".
    pub fn is_empty(&self) -> bool {
        match self {
            OptionValue::Text(s) => s.trim().is_empty(),
            OptionValue::Number(n) => n.is_nan(),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Number(n) => write!(f, "{}", n),
            OptionValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Number(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

/// A configurable attribute of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomizationOption {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    /// Ordered choices for color/select options.
    #[serde(default)]
    pub choices: Vec<OptionChoice>,
    /// Bounds for numeric options.
    #[serde(default)]
    pub range: Option<NumericRange>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<OptionValue>,
    /// Flat adjustment applied when a numeric option has a value.
    #[serde(default)]
    pub price_adjustment: Option<f64>,
    #[serde(default)]
    pub group: Option<String>,
    /// Presentation order; ties keep load order.
    #[serde(default)]
    pub order: i32,
    /// Owning product, `None` for options shared across the catalog.
    #[serde(default)]
    pub product_id: Option<String>,
    /// Name of the quantization profile snapping this option's values.
    #[serde(default)]
    pub quantization_profile: Option<String>,
}

impl CustomizationOption {
    /// Find the choice with `value`.
    pub fn choice(&self, value: &str) -> Option<&OptionChoice> {
        self.choices.iter().find(|c| c.value == value)
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == OptionKind::Numeric
    }
}

/// Sort options by `order` ascending, keeping load order for ties.
pub fn sort_by_order(options: &mut [CustomizationOption]) {
    // `sort_by_key` is stable.
    options.sort_by_key(|o| o.order);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_row_deserializes() {
        let option: CustomizationOption = serde_json::from_str(
            r#"{
                "id": "power",
                "name": "Nearsightedness Power",
                "type": "numeric",
                "range": {"min": 0, "max": 1500, "step": 25, "unit": "°"},
                "required": true,
                "default_value": 0,
                "order": 2,
                "quantization_profile": "lens_power"
            }"#,
        )
        .unwrap();

        assert_eq!(option.kind, OptionKind::Numeric);
        assert_eq!(option.default_value, Some(OptionValue::Number(0.0)));
        assert_eq!(option.range.as_ref().unwrap().step, Some(25.0));
        assert!(option.choices.is_empty());
    }

    #[test]
    fn test_option_value_untagged() {
        let values: Vec<OptionValue> = serde_json::from_str(r#"[512, "blue", 12.5]"#).unwrap();
        assert_eq!(
            values,
            vec![
                OptionValue::Number(512.0),
                OptionValue::Text("blue".to_string()),
                OptionValue::Number(12.5),
            ]
        );
    }

    #[test]
    fn test_numeric_text_parses() {
        assert_eq!(OptionValue::from(" 525 ").as_number(), Some(525.0));
        assert_eq!(OptionValue::from("blue").as_number(), None);
        assert!(OptionValue::from("  ").is_empty());
    }

    #[test]
    fn test_sort_is_stable() {
        let make = |id: &str, order| CustomizationOption {
            id: id.to_string(),
            name: id.to_string(),
            kind: OptionKind::Select,
            choices: vec![],
            range: None,
            required: false,
            default_value: None,
            price_adjustment: None,
            group: None,
            order,
            product_id: None,
            quantization_profile: None,
        };
        let mut options = vec![make("c", 2), make("a", 1), make("b", 1), make("d", 0)];
        sort_by_order(&mut options);
        let ids: Vec<_> = options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "a", "b", "c"]);
    }
}
