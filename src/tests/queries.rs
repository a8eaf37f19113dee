use crate::api;
use crate::error::Error;
use crate::query::{Order, Query};
use crate::tests::fake_store::FakeStore;
use crate::value::{PropertyValue, Value};
use crate::{Client, Entity};

fn person(name: &str, age: i64) -> api::EntityProto {
    let mut person = Entity::with_name("Person", name).unwrap();
    person.set("age", age).unwrap();
    person.to_wire().unwrap()
}

#[test]
fn fetch_pushes_the_bound_down_and_decodes_results() {
    let store = FakeStore::new();
    let client = Client::new(&store);
    store.seed_results(vec![person("ken", 25), person("ryan", 28)]);

    let mut query = Query::new("Person").unwrap();
    query.set_filter("age >", 21).unwrap();
    query.order([Order::from("age")]).unwrap();

    let results = client.fetch(&query, 3).unwrap();
    // Fewer matches than asked for: the list is just shorter.
    assert_eq!(results.len(), 2);
    assert_eq!(
        results[0].get("age"),
        Some(&PropertyValue::Single(Value::IntegerValue(25)))
    );
    assert_eq!(store.calls(), ["RunQuery", "Next"]);

    // The wire query carries the filter, the ordering and the bound.
    let wire = store.queries().remove(0);
    assert_eq!(wire.kind, "Person");
    assert_eq!(wire.limit, Some(3));
    assert_eq!(wire.filter.len(), 1);
    assert_eq!(wire.filter[0].op, api::query::Operator::GreaterThan as i32);
    assert_eq!(wire.filter[0].property[0].name, "age");
    assert_eq!(
        wire.filter[0].property[0].value.as_ref().unwrap().int64_value,
        Some(21)
    );
    assert_eq!(wire.order.len(), 1);
    assert_eq!(wire.order[0].property, "age");
    assert_eq!(
        wire.order[0].direction,
        Some(api::query::Direction::Ascending as i32)
    );
}

#[test]
fn ancestor_restricts_the_wire_query() {
    let store = FakeStore::new();
    let client = Client::new(&store);

    let root = Entity::with_name("Person", "ryan").unwrap();
    let mut query = Query::new("Pet").unwrap();
    query.ancestor(&root).unwrap();
    client.run_query(&query).unwrap();

    let wire = store.queries().remove(0);
    assert_eq!(wire.ancestor, Some(root.key().to_wire()));
}

#[test]
fn count_is_cached_until_the_query_changes() {
    let store = FakeStore::new();
    let client = Client::new(&store);
    store.seed_count(42);

    let mut query = Query::new("Person").unwrap();
    assert_eq!(client.count(&query, None).unwrap(), 42);
    assert_eq!(client.count(&query, None).unwrap(), 42);
    assert_eq!(store.count_calls("Count"), 1);

    // Any mutation invalidates the cache.
    query.set_filter("age >", 21).unwrap();
    store.seed_count(7);
    assert_eq!(client.count(&query, None).unwrap(), 7);
    assert_eq!(store.count_calls("Count"), 2);

    // The optional bound rides along on the wire query.
    query.remove_filter("age >");
    assert_eq!(client.count(&query, Some(10)).unwrap(), 7);
    let wire = store.queries().pop().unwrap();
    assert_eq!(wire.limit, Some(10));
}

#[test]
fn count_rejects_a_nonpositive_bound() {
    let store = FakeStore::new();
    let client = Client::new(&store);
    let query = Query::new("Person").unwrap();

    assert!(matches!(
        client.count(&query, Some(0)),
        Err(Error::BadQuery(_))
    ));
    assert!(matches!(
        client.count(&query, Some(-1)),
        Err(Error::BadQuery(_))
    ));
    // Rejected before any wire call, and nothing gets cached.
    assert_eq!(store.count_calls("Count"), 0);

    store.seed_count(42);
    assert_eq!(client.count(&query, Some(1)).unwrap(), 42);
}

#[test]
fn list_valued_equality_filters_expand_on_the_wire() {
    let store = FakeStore::new();
    let client = Client::new(&store);

    let mut query = Query::new("Person").unwrap();
    query.set_filter("name in", vec!["ryan"]).unwrap_err();
    query.set_filter("name", vec!["ryan"]).unwrap();
    client.run_query(&query).unwrap();

    let wire = store.queries().remove(0);
    assert_eq!(wire.filter.len(), 1);
    assert_eq!(wire.filter[0].property.len(), 1);
    assert_eq!(wire.filter[0].property[0].multiple, Some(true));
}
