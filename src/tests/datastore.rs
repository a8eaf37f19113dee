use crate::api;
use crate::dispatch::{Dispatch, RpcError};
use crate::error::Error;
use crate::key::{Key, KeyID};
use crate::tests::fake_store::FakeStore;
use crate::value::{PropertyValue, Value};
use crate::{Client, Entity};

use prost::Message;

#[test]
fn put_then_get_round_trips() {
    let store = FakeStore::new();
    let client = Client::new(&store);

    //? Store an entity under a named key.
    let mut person = Entity::with_name("Person", "ryan").unwrap();
    person.set("age", 28).unwrap();
    let key = client.put(&mut person).unwrap();
    assert_eq!(key.to_string(), "/Person:ryan");

    //? Get it back through the readable key form.
    let fetched = client.get("/Person:ryan").unwrap();
    assert_eq!(
        fetched.get("age"),
        Some(&PropertyValue::Single(Value::IntegerValue(28)))
    );
    assert_eq!(fetched.key(), &key);
}

#[test]
fn put_completes_incomplete_keys() {
    let store = FakeStore::new();
    let client = Client::new(&store);

    let mut first = Entity::new("Person").unwrap();
    let mut second = Entity::new("Person").unwrap();
    assert!(!first.key().is_complete());

    let keys = client.put_all(std::slice::from_mut(&mut first)).unwrap();
    client.put(&mut second).unwrap();

    // The store-assigned ids are copied back into the entities.
    assert!(first.key().is_complete());
    assert!(second.key().is_complete());
    assert_eq!(first.key(), &keys[0]);
    assert_eq!(first.key().key_id(), &KeyID::IntID(1));
    assert_eq!(second.key().key_id(), &KeyID::IntID(2));

    assert!(client.get(keys[0].clone()).is_ok());
}

#[test]
fn cross_group_put_is_rejected() {
    let store = FakeStore::new();
    let client = Client::new(&store);

    let mut entities = vec![
        Entity::with_name("A", "one").unwrap(),
        Entity::with_name("B", "two").unwrap(),
    ];
    assert!(matches!(
        client.put_all(&mut entities),
        Err(Error::BadRequest(_))
    ));
    // Rejected before any wire call.
    assert_eq!(store.calls(), Vec::<String>::new());

    // Same group is fine, parent and child included.
    let parent = Key::new("A").unwrap().name("one").unwrap();
    let mut entities = vec![
        Entity::with_name("A", "one").unwrap(),
        Entity::with_parent("B", &parent).unwrap(),
    ];
    client.put_all(&mut entities).unwrap();
}

#[test]
fn get_preserves_argument_shape() {
    let store = FakeStore::new();
    let client = Client::new(&store);

    let mut person = Entity::with_name("Person", "ryan").unwrap();
    client.put(&mut person).unwrap();

    // Scalar get of a missing entity is an error...
    assert!(matches!(
        client.get("/Person:ghost"),
        Err(Error::EntityNotFound)
    ));

    // ...while a batch get returns positional holes.
    let results = client.get_all(["/Person:ryan", "/Person:ghost"]).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_some());
    assert!(results[1].is_none());

    // Batches may span entity groups outside a transaction.
    let mut other = Entity::with_name("Town", "paris").unwrap();
    client.put(&mut other).unwrap();
    let results = client.get_all(["/Person:ryan", "/Town:paris"]).unwrap();
    assert!(results.iter().all(Option::is_some));
}

#[test]
fn incomplete_keys_are_rejected_at_the_door() {
    let store = FakeStore::new();
    let client = Client::new(&store);

    let incomplete = Key::new("Person").unwrap();
    assert!(matches!(client.get(incomplete.clone()), Err(Error::BadKey(_))));
    assert!(matches!(client.delete(incomplete), Err(Error::BadKey(_))));
    assert_eq!(store.calls(), Vec::<String>::new());
}

#[test]
fn delete_requires_one_entity_group() {
    let store = FakeStore::new();
    let client = Client::new(&store);

    let mut person = Entity::with_name("Person", "ryan").unwrap();
    let mut town = Entity::with_name("Town", "paris").unwrap();
    client.put(&mut person).unwrap();
    client.put(&mut town).unwrap();

    assert!(matches!(
        client.delete_all(["/Person:ryan", "/Town:paris"]),
        Err(Error::BadRequest(_))
    ));
    assert_eq!(store.count_calls("Delete"), 0);
    assert!(store.contains(person.key()));

    client.delete("/Person:ryan").unwrap();
    assert!(!store.contains(person.key()));
    assert!(matches!(client.get("/Person:ryan"), Err(Error::EntityNotFound)));
}

/// A transport that answers every `Put` with an empty response.
struct LyingStore;

impl Dispatch for LyingStore {
    fn call(&self, _service: &str, method: &str, _request: &[u8]) -> Result<Vec<u8>, RpcError> {
        match method {
            "Put" => Ok(api::PutResponse::default().encode_to_vec()),
            other => panic!("unexpected call to {other}"),
        }
    }
}

#[test]
fn put_arity_mismatch_is_an_internal_error() {
    let client = Client::new(LyingStore);
    let mut person = Entity::with_name("Person", "ryan").unwrap();
    assert!(matches!(client.put(&mut person), Err(Error::Internal(_))));
}

/// A transport that reports a fixed application error.
struct FailingStore(i32);

impl Dispatch for FailingStore {
    fn call(&self, _service: &str, _method: &str, _request: &[u8]) -> Result<Vec<u8>, RpcError> {
        Err(RpcError::new(self.0, "injected"))
    }
}

#[test]
fn wire_errors_map_to_the_client_taxonomy() {
    let cases = [
        (api::ErrorCode::BadRequest as i32, "bad request"),
        (api::ErrorCode::Timeout as i32, "timeout"),
        (api::ErrorCode::NeedIndex as i32, "need index"),
        (api::ErrorCode::InternalError as i32, "internal error"),
        (99, "internal error"),
    ];
    for (code, prefix) in cases {
        let client = Client::new(FailingStore(code));
        let err = client.get("/Person:ryan").unwrap_err();
        assert!(
            err.to_string().starts_with(prefix),
            "code {code} mapped to {err}"
        );
    }
}
