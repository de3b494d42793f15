//! Property-based tests for cache key identity using proptest.

use proptest::prelude::*;
use serde_json::Value;
use skein_cache::SuspenseCache;
use skein_core::{Document, Variables};
use skein_reactive::ManualObservableQuery;
use std::collections::BTreeMap;
use std::convert::Infallible;

fn arb_entries() -> impl Strategy<Value = BTreeMap<String, i64>> {
    prop::collection::btree_map("[a-e]{1,3}", any::<i64>(), 0..6)
}

fn insert_in_order(entries: &BTreeMap<String, i64>, order: &[usize]) -> Variables {
    let pairs: Vec<_> = entries.iter().collect();
    let mut variables = Variables::new();
    for &index in order {
        let (key, value) = pairs[index];
        variables.insert(key.clone(), Value::from(*value));
    }
    variables
}

fn watch(doc: &Document) -> Result<ManualObservableQuery<Value>, Infallible> {
    Ok(ManualObservableQuery::loading(doc.clone()))
}

proptest! {
    /// Insertion order of variables never affects which subscription is returned.
    #[test]
    fn insertion_order_is_irrelevant(
        (entries, order) in arb_entries().prop_flat_map(|entries| {
            let len = entries.len();
            (Just(entries), Just((0..len).collect::<Vec<_>>()).prop_shuffle())
        })
    ) {
        let doc = Document::parse("query Search { search { id } }").unwrap();
        let cache = SuspenseCache::new(());

        let sorted_order: Vec<usize> = (0..entries.len()).collect();
        let sorted = insert_in_order(&entries, &sorted_order);
        let shuffled = insert_in_order(&entries, &order);

        let first = cache.get_subscription(&doc, Some(&sorted), |_| watch(&doc)).unwrap();
        let second = cache.get_subscription(&doc, Some(&shuffled), |_| watch(&doc)).unwrap();

        prop_assert!(first.ptr_eq(&second));
        prop_assert_eq!(cache.len(), 1);
    }

    /// Distinct variable sets always map to distinct subscriptions.
    #[test]
    fn distinct_variables_are_distinct_entries(a in arb_entries(), b in arb_entries()) {
        let doc = Document::parse("query Search { search { id } }").unwrap();
        let cache = SuspenseCache::new(());

        let to_vars = |entries: &BTreeMap<String, i64>| -> Variables {
            entries.iter().map(|(k, v)| (k.clone(), Value::from(*v))).collect()
        };

        let first = cache.get_subscription(&doc, Some(&to_vars(&a)), |_| watch(&doc)).unwrap();
        let second = cache.get_subscription(&doc, Some(&to_vars(&b)), |_| watch(&doc)).unwrap();

        prop_assert_eq!(first.ptr_eq(&second), a == b);
    }
}
