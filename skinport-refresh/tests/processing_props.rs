use proptest::prelude::*;
use serde_json::{json, Value};

use skinport_core::RawItem;
use skinport_refresh::{process_item, process_items};

fn arb_json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        any::<f64>().prop_map(|f| json!(f)),
        ".{0,12}".prop_map(Value::String),
    ]
}

fn arb_raw_item() -> impl Strategy<Value = RawItem> {
    prop_oneof![
        arb_json_leaf().prop_map(RawItem::new),
        (arb_json_leaf(), arb_json_leaf(), arb_json_leaf()).prop_map(|(name, min, suggested)| {
            RawItem::new(json!({
                "market_hash_name": name,
                "min_price": min,
                "suggested_price": suggested,
            }))
        }),
    ]
}

proptest! {
    #[test]
    fn processing_never_panics_and_keeps_counts(items in prop::collection::vec(arb_raw_item(), 0..40)) {
        let batch = process_items(&items);
        prop_assert_eq!(batch.total(), items.len());
        for item in &batch.items {
            prop_assert!(!item.name.trim().is_empty());
            for price in [item.min_price_tradable, item.min_price_non_tradable].into_iter().flatten() {
                prop_assert!(price.is_finite() && price > 0.0);
            }
        }
    }

    #[test]
    fn named_items_are_always_kept(name in "[A-Za-z][A-Za-z0-9 |-]{0,30}", price in 0.01f64..10_000.0) {
        let raw = RawItem::new(json!({"market_hash_name": name, "min_price": price}));
        let item = process_item(&raw).unwrap();
        prop_assert_eq!(item.name, name);
        prop_assert_eq!(item.min_price_tradable, Some(price));
        prop_assert_eq!(item.min_price_non_tradable, None);
    }
}
