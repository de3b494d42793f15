//! Property-based tests for result deduplication using proptest.

use proptest::prelude::*;
use serde_json::{json, Value};
use skein_core::{Document, QueryResult};
use skein_reactive::{ManualObservableQuery, ObservableQuerySubscription, SubscriptionOptions};
use std::cell::RefCell;
use std::rc::Rc;

fn result_for(n: u8) -> QueryResult<Value> {
    QueryResult::ready(json!({ "counter": { "value": n, "even": n % 2 == 0 } }))
}

proptest! {
    /// Listeners see exactly the emissions that differ from the previous result.
    #[test]
    fn deliveries_match_distinct_runs(values in prop::collection::vec(0u8..4, 0..40)) {
        let doc = Document::parse("query Counter { counter { value even } }").unwrap();
        let query = ManualObservableQuery::loading(doc);
        let subscription =
            ObservableQuerySubscription::new(query.clone(), SubscriptionOptions::new());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let _handle =
            subscription.subscribe(move |result| seen_clone.borrow_mut().push(result.clone()));

        let mut expected = Vec::new();
        let mut previous = QueryResult::loading();
        for n in values {
            let next = result_for(n);
            if next != previous {
                expected.push(next.clone());
                previous = next.clone();
            }
            query.emit(next);
        }

        prop_assert_eq!(&*seen.borrow(), &expected);
        prop_assert_eq!(subscription.result(), previous);
    }

    /// Every listener registered for the whole run sees the same sequence.
    #[test]
    fn listeners_agree(values in prop::collection::vec(0u8..3, 1..20), listeners in 1usize..5) {
        let doc = Document::parse("query Counter { counter { value even } }").unwrap();
        let query = ManualObservableQuery::loading(doc);
        let subscription =
            ObservableQuerySubscription::new(query.clone(), SubscriptionOptions::new());

        let logs: Vec<_> = (0..listeners).map(|_| Rc::new(RefCell::new(Vec::new()))).collect();
        let _handles: Vec<_> = logs
            .iter()
            .map(|log| {
                let log = log.clone();
                subscription.subscribe(move |result| log.borrow_mut().push(result.clone()))
            })
            .collect();

        for n in values {
            query.emit(result_for(n));
        }

        for log in &logs[1..] {
            prop_assert_eq!(&*log.borrow(), &*logs[0].borrow());
        }
    }
}
