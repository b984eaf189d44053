//! Consumption input model
//!
//! User-supplied activity quantities keyed by (category, subcategory).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::footprint::Category;

/// Sanitized quantities, the serialized shape of a ConsumptionInput
pub type QuantityMap = BTreeMap<Category, BTreeMap<String, f64>>;

/// Unvalidated JSON input, as received from a caller
///
/// Values are either nested objects (`{"transportation": {"car": 1000}}`) or
/// scalars under a dotted key (`{"transportation.car": 1000}`).
pub type RawConsumption = BTreeMap<String, Value>;

/// Activity quantities for one footprint calculation
///
/// Every stored quantity is finite and >= 0. Missing keys read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawConsumption", into = "QuantityMap")]
pub struct ConsumptionInput {
    quantities: QuantityMap,
}

impl ConsumptionInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a quantity, coercing negative or non-finite values to 0
    pub fn set(&mut self, category: Category, subcategory: impl Into<String>, quantity: f64) {
        self.quantities
            .entry(category)
            .or_default()
            .insert(subcategory.into(), sanitize_quantity(quantity));
    }

    /// Builder form of [`ConsumptionInput::set`]
    pub fn with(mut self, category: Category, subcategory: impl Into<String>, quantity: f64) -> Self {
        self.set(category, subcategory, quantity);
        self
    }

    /// Set a quantity from a dotted key like `energy.electricity`
    ///
    /// Returns false if the key doesn't name a known category and a subcategory.
    pub fn set_dotted(&mut self, key: &str, value: &Value) -> bool {
        match parse_key(key) {
            Some((category, subcategory)) => {
                self.set(category, subcategory, coerce_quantity(value));
                true
            }
            None => false,
        }
    }

    /// Quantity for a (category, subcategory) pair; missing keys are 0
    pub fn quantity(&self, category: Category, subcategory: &str) -> f64 {
        self.quantities
            .get(&category)
            .and_then(|subs| subs.get(subcategory))
            .copied()
            .unwrap_or(0.0)
    }

    /// All quantities entered for one category
    pub fn category(&self, category: Category) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.quantities
            .get(&category)
            .into_iter()
            .flat_map(|subs| subs.iter().map(|(name, qty)| (name.as_str(), *qty)))
    }

    /// Whether every entered quantity is zero (or nothing was entered)
    pub fn is_empty(&self) -> bool {
        self.quantities
            .values()
            .all(|subs| subs.values().all(|qty| *qty == 0.0))
    }

    pub fn as_map(&self) -> &QuantityMap {
        &self.quantities
    }
}

impl From<RawConsumption> for ConsumptionInput {
    fn from(raw: RawConsumption) -> Self {
        let mut input = ConsumptionInput::new();

        for (key, value) in raw {
            match value {
                Value::Object(fields) => {
                    let Some(category) = Category::from_str(&key) else {
                        tracing::warn!("Ignoring unknown footprint category '{}'", key);
                        continue;
                    };
                    for (subcategory, qty) in fields {
                        if subcategory.trim().is_empty() {
                            continue;
                        }
                        input.set(category, subcategory, coerce_quantity(&qty));
                    }
                }
                scalar => {
                    if !input.set_dotted(&key, &scalar) {
                        tracing::warn!("Ignoring unrecognized consumption key '{}'", key);
                    }
                }
            }
        }

        input
    }
}

impl From<ConsumptionInput> for QuantityMap {
    fn from(input: ConsumptionInput) -> Self {
        input.quantities
    }
}

/// Split a dotted key into its category and subcategory
pub fn parse_key(key: &str) -> Option<(Category, &str)> {
    let (category, subcategory) = key.split_once('.')?;
    let subcategory = subcategory.trim();
    if subcategory.is_empty() {
        return None;
    }
    Some((Category::from_str(category)?, subcategory))
}

/// Largest accepted activity quantity (km, kWh, kg or items)
///
/// Keeps quantity x factor sums well inside f64 range for any sane factor.
pub const MAX_QUANTITY: f64 = 1e12;

/// Clamp a quantity to a finite value in `0..=MAX_QUANTITY`
pub fn sanitize_quantity(quantity: f64) -> f64 {
    if quantity.is_finite() && quantity > 0.0 {
        quantity.min(MAX_QUANTITY)
    } else {
        0.0
    }
}

/// Parse-or-zero coercion for a JSON value
///
/// Numbers and numeric strings are accepted; anything else becomes 0.
pub fn coerce_quantity(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    sanitize_quantity(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_key_is_zero() {
        let input = ConsumptionInput::new();
        assert_eq!(input.quantity(Category::Food, "meat"), 0.0);
        assert!(input.is_empty());
    }

    #[test]
    fn test_negative_clamped() {
        let input = ConsumptionInput::new().with(Category::Transportation, "car", -50.0);
        assert_eq!(input.quantity(Category::Transportation, "car"), 0.0);
        assert!(input.is_empty());
    }

    #[test]
    fn test_non_finite_clamped() {
        let input = ConsumptionInput::new()
            .with(Category::Energy, "electricity", f64::NAN)
            .with(Category::Energy, "heating", f64::INFINITY);
        assert_eq!(input.quantity(Category::Energy, "electricity"), 0.0);
        assert_eq!(input.quantity(Category::Energy, "heating"), 0.0);
    }

    #[test]
    fn test_huge_quantity_capped() {
        let input = ConsumptionInput::new().with(Category::Lifestyle, "electronics", 1e307);
        assert_eq!(input.quantity(Category::Lifestyle, "electronics"), MAX_QUANTITY);
        assert_eq!(coerce_quantity(&json!("1e400")), 0.0);
        assert_eq!(coerce_quantity(&json!(1e300)), MAX_QUANTITY);
    }

    #[test]
    fn test_coerce_quantity() {
        assert_eq!(coerce_quantity(&json!(12.5)), 12.5);
        assert_eq!(coerce_quantity(&json!("300")), 300.0);
        assert_eq!(coerce_quantity(&json!(" 4.2 ")), 4.2);
        assert_eq!(coerce_quantity(&json!("abc")), 0.0);
        assert_eq!(coerce_quantity(&json!("")), 0.0);
        assert_eq!(coerce_quantity(&json!(null)), 0.0);
        assert_eq!(coerce_quantity(&json!(true)), 0.0);
        assert_eq!(coerce_quantity(&json!(-7)), 0.0);
        assert_eq!(coerce_quantity(&json!([1, 2])), 0.0);
    }

    #[test]
    fn test_deserialize_nested() {
        let input: ConsumptionInput = serde_json::from_value(json!({
            "transportation": {"car": 1000, "bus": "250"},
            "food": {"meat": "lots", "dairy": -3}
        }))
        .unwrap();

        assert_eq!(input.quantity(Category::Transportation, "car"), 1000.0);
        assert_eq!(input.quantity(Category::Transportation, "bus"), 250.0);
        assert_eq!(input.quantity(Category::Food, "meat"), 0.0);
        assert_eq!(input.quantity(Category::Food, "dairy"), 0.0);
    }

    #[test]
    fn test_deserialize_dotted_keys() {
        let input: ConsumptionInput = serde_json::from_value(json!({
            "energy.electricity": 300,
            "food.meat": "10"
        }))
        .unwrap();

        assert_eq!(input.quantity(Category::Energy, "electricity"), 300.0);
        assert_eq!(input.quantity(Category::Food, "meat"), 10.0);
    }

    #[test]
    fn test_deserialize_ignores_unknown_categories() {
        let input: ConsumptionInput = serde_json::from_value(json!({
            "water": {"tap": 12},
            "water.tap": 12,
            "nonsense": 4,
            "lifestyle": {"clothing": 3}
        }))
        .unwrap();

        assert_eq!(input.quantity(Category::Lifestyle, "clothing"), 3.0);
        assert_eq!(input.as_map().len(), 1);
    }

    #[test]
    fn test_serialize_is_nested_numbers() {
        let input = ConsumptionInput::new()
            .with(Category::Energy, "electricity", 300.0)
            .with(Category::Food, "meat", 10.0);
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(
            value,
            json!({"energy": {"electricity": 300.0}, "food": {"meat": 10.0}})
        );

        let back: ConsumptionInput = serde_json::from_value(value).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("transportation.car"), Some((Category::Transportation, "car")));
        assert_eq!(parse_key("energy.naturalGas"), Some((Category::Energy, "naturalGas")));
        assert_eq!(parse_key("energy."), None);
        assert_eq!(parse_key("car"), None);
        assert_eq!(parse_key("water.tap"), None);
    }
}
