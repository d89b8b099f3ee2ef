//! Upstream and processed item types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An item as returned by an upstream price source.
///
/// Upstream data is untrusted: any field may be missing, null or of the wrong
/// type, so the raw JSON object is kept as-is and read through the lookup
/// helpers below. Interpretation lives in the refresh crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawItem(pub Value);

impl RawItem {
    /// Field spellings that carry the identifying item name.
    pub const NAME_FIELDS: &'static [&'static str] = &["market_hash_name", "name"];

    /// Field spellings that carry the lowest tradable listing price.
    pub const TRADABLE_PRICE_FIELDS: &'static [&'static str] =
        &["min_price", "tradablePrice", "tradable_price"];

    /// Field spellings that carry the suggested (non-tradable) price.
    pub const SUGGESTED_PRICE_FIELDS: &'static [&'static str] =
        &["suggested_price", "suggestedPrice"];

    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Whether the underlying value is a JSON object.
    pub fn is_object(&self) -> bool {
        self.0.is_object()
    }

    /// First non-null value among the candidate field names.
    pub fn field(&self, candidates: &[&str]) -> Option<&Value> {
        let object = self.0.as_object()?;
        candidates
            .iter()
            .find_map(|name| object.get(*name).filter(|value| !value.is_null()))
    }

    pub fn name(&self) -> Option<&Value> {
        self.field(Self::NAME_FIELDS)
    }

    pub fn tradable_price(&self) -> Option<&Value> {
        self.field(Self::TRADABLE_PRICE_FIELDS)
    }

    pub fn suggested_price(&self) -> Option<&Value> {
        self.field(Self::SUGGESTED_PRICE_FIELDS)
    }
}

impl From<Value> for RawItem {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// An item reduced to the shape consumed by the purchase service.
///
/// The wire shape (`name`, `minPriceTradable`, `minPriceNonTradable`) is a
/// compatibility boundary and must not change on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedItem {
    pub name: String,
    pub min_price_tradable: Option<f64>,
    pub min_price_non_tradable: Option<f64>,
}

impl ProcessedItem {
    pub fn new(
        name: impl Into<String>,
        min_price_tradable: Option<f64>,
        min_price_non_tradable: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            min_price_tradable,
            min_price_non_tradable,
        }
    }
}
