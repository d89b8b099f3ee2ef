//! Raw item interpretation.
//!
//! Upstream data is untrusted. An item without a usable name is dropped; a
//! price that is absent, null, zero, negative, non-finite or non-numeric is
//! recorded as "no price". Neither case aborts a batch.

use serde_json::Value;

use skinport_core::{ItemError, ProcessedItem, RawItem};

/// Result of processing one upstream batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessedBatch {
    pub items: Vec<ProcessedItem>,
    pub dropped: usize,
}

impl ProcessedBatch {
    pub fn total(&self) -> usize {
        self.items.len() + self.dropped
    }
}

pub fn process_item(raw: &RawItem) -> Result<ProcessedItem, ItemError> {
    if !raw.is_object() {
        return Err(ItemError::NotAnObject);
    }

    let name = item_name(raw.name().ok_or(ItemError::MissingName)?)?;

    Ok(ProcessedItem::new(
        name,
        parse_price(raw.tradable_price()),
        parse_price(raw.suggested_price()),
    ))
}

/// Map every raw item, dropping (and logging) the unusable ones.
pub fn process_items(raw_items: &[RawItem]) -> ProcessedBatch {
    let mut batch = ProcessedBatch {
        items: Vec::with_capacity(raw_items.len()),
        dropped: 0,
    };

    for (index, raw) in raw_items.iter().enumerate() {
        match process_item(raw) {
            Ok(item) => batch.items.push(item),
            Err(e) => {
                tracing::debug!(index, error = %e, "Skipping invalid upstream item");
                batch.dropped += 1;
            }
        }
    }

    batch
}

fn item_name(value: &Value) -> Result<String, ItemError> {
    match value {
        Value::String(s) if s.trim().is_empty() => Err(ItemError::InvalidName {
            reason: "name is blank".to_string(),
        }),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(_) => Err(ItemError::InvalidName {
            reason: "expected a string, got a boolean".to_string(),
        }),
        Value::Array(_) | Value::Object(_) => Err(ItemError::InvalidName {
            reason: "expected a string, got a structured value".to_string(),
        }),
        Value::Null => Err(ItemError::MissingName),
    }
}

fn parse_price(value: Option<&Value>) -> Option<f64> {
    let price = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    (price.is_finite() && price > 0.0).then_some(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawItem {
        RawItem::new(value)
    }

    #[test]
    fn test_filters_unnamed_items() {
        let batch = process_items(&[
            raw(json!({"name": "A", "min_price": 10})),
            raw(json!({"name": null, "min_price": 5})),
            raw(json!({"name": "B", "min_price": null, "suggested_price": 3})),
        ]);

        assert_eq!(
            batch.items,
            vec![
                ProcessedItem::new("A", Some(10.0), None),
                ProcessedItem::new("B", None, Some(3.0)),
            ]
        );
        assert_eq!(batch.dropped, 1);
        assert_eq!(batch.total(), 3);
    }

    #[test]
    fn test_market_hash_name_takes_precedence() {
        let item = process_item(&raw(json!({
            "market_hash_name": "AK-47 | Redline (Field-Tested)",
            "name": "ignored",
            "min_price": 11.5
        })))
        .unwrap();
        assert_eq!(item.name, "AK-47 | Redline (Field-Tested)");
        assert_eq!(item.min_price_tradable, Some(11.5));
    }

    #[test]
    fn test_alternate_price_spellings() {
        let item = process_item(&raw(json!({
            "name": "A",
            "tradablePrice": 4.5,
            "suggestedPrice": "7.25"
        })))
        .unwrap();
        assert_eq!(item.min_price_tradable, Some(4.5));
        assert_eq!(item.min_price_non_tradable, Some(7.25));
    }

    #[test]
    fn test_unusable_prices_become_none() {
        for bad in [json!(0), json!(-3), json!("abc"), json!(true), json!([1]), json!({})] {
            let item = process_item(&raw(json!({"name": "A", "min_price": bad.clone()}))).unwrap();
            assert_eq!(item.min_price_tradable, None, "price {:?}", bad);
        }
        let item = process_item(&raw(json!({"name": "A", "min_price": " 12.5 "}))).unwrap();
        assert_eq!(item.min_price_tradable, Some(12.5));
    }

    #[test]
    fn test_non_finite_string_prices_become_none() {
        for bad in ["NaN", "inf", "-inf"] {
            let item = process_item(&raw(json!({"name": "A", "min_price": bad}))).unwrap();
            assert_eq!(item.min_price_tradable, None, "price {:?}", bad);
        }
    }

    #[test]
    fn test_name_edge_cases() {
        assert_eq!(
            process_item(&raw(json!({"min_price": 1}))),
            Err(ItemError::MissingName)
        );
        assert!(matches!(
            process_item(&raw(json!({"name": "   "}))),
            Err(ItemError::InvalidName { .. })
        ));
        assert!(matches!(
            process_item(&raw(json!({"name": {"en": "A"}}))),
            Err(ItemError::InvalidName { .. })
        ));
        assert_eq!(process_item(&raw(json!({"name": 42}))).unwrap().name, "42");
        assert_eq!(
            process_item(&raw(json!("just a string"))),
            Err(ItemError::NotAnObject)
        );
    }
}
