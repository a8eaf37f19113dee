//! Property-based round-trip invariants for keys, entities and filter
//! expressions.

use chrono::DateTime;
use proptest::prelude::*;

use crate::entity::Entity;
use crate::filter::{FilterExpr, Operator};
use crate::key::{Key, KeyID, PathElement};
use crate::value::{PropertyValue, Value};

fn key_id() -> impl Strategy<Value = KeyID> {
    prop_oneof![
        (1i64..1_000_000).prop_map(KeyID::IntID),
        "[a-z][a-z0-9]{0,7}".prop_map(KeyID::StringID),
    ]
}

fn key(last_complete: bool) -> impl Strategy<Value = Key> {
    let element = ("[A-Z][a-z]{0,7}", key_id()).prop_map(|(kind, id)| PathElement { kind, id });
    let last = ("[A-Z][a-z]{0,7}", any::<bool>()).prop_flat_map(move |(kind, complete)| {
        if complete || last_complete {
            key_id()
                .prop_map(move |id| PathElement {
                    kind: kind.clone(),
                    id,
                })
                .boxed()
        } else {
            Just(PathElement {
                kind,
                id: KeyID::Incomplete,
            })
            .boxed()
        }
    });
    ("[a-z]{1,8}", prop::collection::vec(element, 0..3), last).prop_map(
        |(app, mut path, last)| {
            path.push(last);
            Key { app, path }
        },
    )
}

fn scalar(variant: usize) -> BoxedStrategy<Value> {
    match variant {
        0 => any::<bool>().prop_map(Value::BooleanValue).boxed(),
        1 => any::<i64>().prop_map(Value::IntegerValue).boxed(),
        2 => any::<i32>()
            .prop_map(|x| Value::DoubleValue(f64::from(x) / 4.0))
            .boxed(),
        3 => (0i64..4_102_444_800_000_000)
            .prop_map(|us| {
                Value::TimestampValue(DateTime::from_timestamp_micros(us).unwrap().naive_utc())
            })
            .boxed(),
        4 => key(true).prop_map(Value::KeyValue).boxed(),
        5 => "[a-z ]{0,40}".prop_map(Value::StringValue).boxed(),
        6 => "[a-z ]{0,40}".prop_map(Value::TextValue).boxed(),
        7 => prop::collection::vec(any::<u8>(), 0..32)
            .prop_map(Value::BlobValue)
            .boxed(),
        _ => ((-90i16..=90), (-180i16..=180))
            .prop_map(|(lat, lng)| Value::GeoPointValue(f64::from(lat), f64::from(lng)))
            .boxed(),
    }
}

fn property_value() -> impl Strategy<Value = PropertyValue> {
    (0usize..9).prop_flat_map(|variant| {
        prop_oneof![
            scalar(variant).prop_map(PropertyValue::Single),
            prop::collection::vec(scalar(variant), 1..4).prop_map(PropertyValue::List),
        ]
    })
}

fn entity() -> impl Strategy<Value = Entity> {
    (
        key(true),
        prop::collection::btree_map("[a-z][a-z0-9]{0,9}", property_value(), 0..6),
    )
        .prop_map(|(key, properties)| Entity { key, properties })
}

proptest! {
    /// Every key survives the wire round trip, complete or not.
    #[test]
    fn key_wire_round_trip(key in key(false)) {
        let decoded = Key::from_wire(key.to_wire()).unwrap();
        prop_assert_eq!(decoded, key);
    }

    /// Complete keys survive the readable text form.
    #[test]
    fn key_text_round_trip(key in key(true)) {
        let parsed: Key = key.to_string().parse().unwrap();
        // The text form carries no application id; compare paths.
        prop_assert_eq!(parsed.path(), key.path());
    }

    /// Every valid entity's property map survives the wire round trip,
    /// scalar vs list shape included.
    #[test]
    fn entity_wire_round_trip(entity in entity()) {
        let decoded = Entity::from_wire(entity.to_wire().unwrap()).unwrap();
        prop_assert_eq!(decoded, entity);
    }

    /// Every expression the canonical form prints parses back to itself.
    #[test]
    fn filter_expr_text_round_trip(
        property in "[a-zA-Z_][a-zA-Z0-9_]{0,11}",
        operator in prop_oneof![
            Just(Operator::LessThan),
            Just(Operator::LessThanOrEqual),
            Just(Operator::GreaterThan),
            Just(Operator::GreaterThanOrEqual),
            Just(Operator::Equal),
        ],
    ) {
        let expr = FilterExpr::new(property, operator);
        let parsed: FilterExpr = expr.to_string().parse().unwrap();
        prop_assert_eq!(parsed, expr);
    }
}
