//! Property tests for the filter combination laws

use proptest::prelude::*;
use quarry_query::{Degeneration, Filter, and, not, or};
use quarry_value::named_values;

/// A filter of known degeneration over column `X`
fn filter_strategy() -> impl Strategy<Value = Filter> {
    prop_oneof![
        Just(Filter::dummy(true)),
        Just(Filter::dummy(false)),
        (0i64..5).prop_map(|v| Filter::value("X", v).unwrap()),
        (1i64..5).prop_map(|v| Filter::ids("X", [v]).unwrap()),
        Just(Filter::is_null("X").unwrap()),
    ]
}

fn optional_filter() -> impl Strategy<Value = Option<Filter>> {
    prop_oneof![Just(None), filter_strategy().prop_map(Some)]
}

/// Truth of an optional filter for `X = x`; `None` accepts everything
fn holds(filter: &Option<Filter>, x: Option<i64>) -> bool {
    let row = named_values([("X", x.map_or(quarry_value::Value::Null, quarry_value::Value::I64))]);
    filter.as_ref().is_none_or(|f| f.test(&row).unwrap())
}

proptest! {
    #[test]
    fn and_matches_boolean_and(a in optional_filter(), b in optional_filter(), x in proptest::option::of(0i64..5)) {
        let expected = holds(&a, x) && holds(&b, x);
        let combined = and(a, b);
        prop_assert_eq!(holds(&combined, x), expected);
    }

    #[test]
    fn or_matches_boolean_or(a in optional_filter(), b in optional_filter(), x in proptest::option::of(0i64..5)) {
        let expected = holds(&a, x) || holds(&b, x);
        let combined = or(a, b);
        prop_assert_eq!(holds(&combined, x), expected);
    }

    #[test]
    fn not_matches_boolean_not(a in optional_filter(), x in proptest::option::of(0i64..5)) {
        let expected = !holds(&a, x);
        let negated = Some(not(a));
        prop_assert_eq!(holds(&negated, x), expected);
    }

    #[test]
    fn double_negation_is_identity(a in filter_strategy()) {
        prop_assume!(!a.is_degenerate());
        prop_assert_eq!(!!a.clone(), a);
    }

    #[test]
    fn combined_results_are_never_nested_degenerate(a in filter_strategy(), b in filter_strategy()) {
        let combined = a & b;
        if let Filter::And(and) = &combined {
            for child in and.filters() {
                prop_assert_eq!(child.degeneration(), Degeneration::Unconstrained);
                prop_assert!(!matches!(child, Filter::And(_)));
            }
        }
    }

    #[test]
    fn bytes_round_trip(a in filter_strategy(), b in filter_strategy()) {
        let filter = a & b;
        let decoded = Filter::from_bytes(&filter.to_bytes().unwrap()).unwrap();
        prop_assert_eq!(decoded.to_string(), filter.to_string());
        prop_assert_eq!(decoded, filter);
    }
}
