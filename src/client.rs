use prost::Message;

use crate::api;
use crate::config::Config;
use crate::dispatch::{Dispatch, RpcError, DATASTORE_SERVICE};
use crate::entity::Entity;
use crate::error::Error;
use crate::iter::QueryIter;
use crate::key::{Key, ToKey};
use crate::query::Query;
use crate::transaction::{in_transaction, Transaction};

/// The datastore client: the facade binding entities, keys and queries to
/// the wire service behind a [`Dispatch`] channel.
///
/// ```no_run
/// # use datastore3::{Client, Dispatch, Entity, Error};
/// # fn demo(dispatch: impl Dispatch) -> Result<(), Error> {
/// let client = Client::new(dispatch);
/// let mut person = Entity::with_name("Person", "ryan")?;
/// person.set("age", 28)?;
/// client.put(&mut person)?;
/// let fetched = client.get("/Person:ryan")?;
/// assert_eq!(fetched.key(), person.key());
/// # Ok(())
/// # }
/// ```
pub struct Client<D: Dispatch> {
    dispatch: D,
    config: Config,
}

impl<D: Dispatch> Client<D> {
    /// Creates a client over the given transport with default settings.
    pub fn new(dispatch: D) -> Client<D> {
        Client::with_config(dispatch, Config::default())
    }

    /// Creates a client over the given transport with explicit settings.
    pub fn with_config(dispatch: D, config: Config) -> Client<D> {
        Client { dispatch, config }
    }

    /// The client's settings.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// One raw exchange with the wire service; application errors come back
    /// unmapped so callers can inspect the wire code.
    pub(crate) fn call_checked<Req: Message>(
        &self,
        method: &str,
        request: &Req,
    ) -> Result<Vec<u8>, RpcError> {
        self.dispatch
            .call(DATASTORE_SERVICE, method, &request.encode_to_vec())
    }

    /// One exchange with the wire service, decoding the response and mapping
    /// application errors to the client taxonomy.
    pub(crate) fn call<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, Error>
    where
        Req: Message,
        Resp: Message + Default,
    {
        let bytes = self.call_checked(method, request).map_err(Error::from_rpc)?;
        Resp::decode(bytes.as_slice())
            .map_err(|err| Error::Internal(format!("malformed {method} response: {err}")))
    }

    /// Stores one entity. New entities get their key completed with the
    /// store-assigned id; the completed key is also returned.
    pub fn put(&self, entity: &mut Entity) -> Result<Key, Error> {
        self.put_with(std::slice::from_mut(entity), None)
            .map(|mut keys| keys.remove(0))
    }

    /// Stores multiple entities, which must all belong to one entity group.
    /// Returns their completed keys, in order.
    pub fn put_all(&self, entities: &mut [Entity]) -> Result<Vec<Key>, Error> {
        self.put_with(entities, None)
    }

    pub(crate) fn put_with(
        &self,
        entities: &mut [Entity],
        tx: Option<&Transaction<'_, D>>,
    ) -> Result<Vec<Key>, Error> {
        if entities.is_empty() {
            return Err(Error::BadArgument("put expects at least one entity".into()));
        }
        let entity_group = entities[0].entity_group();
        for entity in entities.iter() {
            if entity.kind().is_empty() || entity.app().is_empty() {
                return Err(Error::BadRequest(format!(
                    "app and kind must not be empty, in entity {}",
                    entity.key()
                )));
            }
            if entity.entity_group() != entity_group {
                return Err(Error::BadRequest(
                    "all entities must be in the same entity group".into(),
                ));
            }
        }

        let request = api::PutRequest {
            entity: entities
                .iter()
                .map(Entity::to_wire)
                .collect::<Result<_, _>>()?,
            transaction: match tx {
                Some(tx) => Some(tx.attach(entity_group)?),
                None => None,
            },
        };
        let response: api::PutResponse = self.call("Put", &request)?;

        if response.key.len() != entities.len() {
            return Err(Error::Internal(format!(
                "put accepted {} entities but returned {} keys",
                entities.len(),
                response.key.len()
            )));
        }
        let keys = response
            .key
            .into_iter()
            .map(Key::from_wire)
            .collect::<Result<Vec<Key>, Error>>()?;
        for (entity, key) in entities.iter_mut().zip(&keys) {
            entity.set_key(key.clone());
        }
        Ok(keys)
    }

    /// Gets the entity matching `key`, which may be a [`Key`], a readable
    /// key string, or an entity. Fails with
    /// [`Error::EntityNotFound`] when no entity exists.
    pub fn get(&self, key: impl ToKey) -> Result<Entity, Error> {
        self.get_with(key, None)
    }

    pub(crate) fn get_with(
        &self,
        key: impl ToKey,
        tx: Option<&Transaction<'_, D>>,
    ) -> Result<Entity, Error> {
        let mut results = self.get_all_with(Some(key), tx)?;
        results.remove(0).ok_or(Error::EntityNotFound)
    }

    /// Gets multiple entities. The result is positional: one slot per key,
    /// `None` for keys without an entity.
    pub fn get_all<K, I>(&self, keys: I) -> Result<Vec<Option<Entity>>, Error>
    where
        I: IntoIterator<Item = K>,
        K: ToKey,
    {
        self.get_all_with(keys, None)
    }

    pub(crate) fn get_all_with<K, I>(
        &self,
        keys: I,
        tx: Option<&Transaction<'_, D>>,
    ) -> Result<Vec<Option<Entity>>, Error>
    where
        I: IntoIterator<Item = K>,
        K: ToKey,
    {
        let keys = normalize_keys(keys)?;
        let request = api::GetRequest {
            key: keys.iter().map(Key::to_wire).collect(),
            // Cross-group gets are allowed outside a transaction; inside one
            // the whole batch must sit in the pinned group.
            transaction: match tx {
                Some(tx) => {
                    let entity_group = single_entity_group(&keys, "keys")?;
                    Some(tx.attach(entity_group)?)
                }
                None => None,
            },
        };
        let response: api::GetResponse = self.call("Get", &request)?;
        if response.entity.len() != keys.len() {
            return Err(Error::Internal(format!(
                "get looked up {} keys but returned {} slots",
                keys.len(),
                response.entity.len()
            )));
        }
        response
            .entity
            .into_iter()
            .map(|slot| slot.entity.map(Entity::from_wire).transpose())
            .collect()
    }

    /// Deletes the entity matching `key`. Use with care!
    pub fn delete(&self, key: impl ToKey) -> Result<(), Error> {
        self.delete_with(vec![key.to_key()?], None)
    }

    /// Deletes the entities matching `keys`, which must all belong to one
    /// entity group.
    pub fn delete_all<K, I>(&self, keys: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = K>,
        K: ToKey,
    {
        let keys = keys
            .into_iter()
            .map(|key| key.to_key())
            .collect::<Result<Vec<Key>, Error>>()?;
        self.delete_with(keys, None)
    }

    pub(crate) fn delete_with(
        &self,
        keys: Vec<Key>,
        tx: Option<&Transaction<'_, D>>,
    ) -> Result<(), Error> {
        let keys = normalize_keys(keys)?;
        let entity_group = single_entity_group(&keys, "keys")?;
        let request = api::DeleteRequest {
            key: keys.iter().map(Key::to_wire).collect(),
            transaction: match tx {
                Some(tx) => Some(tx.attach(entity_group)?),
                None => None,
            },
        };
        let _: api::Void = self.call("Delete", &request)?;
        Ok(())
    }

    /// Runs `query` and returns an iterator over its results.
    ///
    /// Queries are not transactional and are rejected inside a transaction.
    pub fn run_query<'a>(&'a self, query: &Query) -> Result<QueryIter<'a, D>, Error> {
        self.run_query_with_limit(query, None)
    }

    fn run_query_with_limit<'a>(
        &'a self,
        query: &Query,
        limit: Option<i32>,
    ) -> Result<QueryIter<'a, D>, Error> {
        if in_transaction() {
            return Err(Error::BadRequest("can't query inside a transaction".into()));
        }
        let request = query.to_wire(limit)?;
        let result: api::QueryResult = self.call("RunQuery", &request)?;
        let cursor = result
            .cursor
            .ok_or_else(|| Error::Internal("query response is missing its cursor".into()))?;
        Ok(QueryIter::new(self, cursor.cursor))
    }

    /// Fetches and returns up to `count` results of `query`. More efficient
    /// than [`Client::run_query`] when the result count is known up front,
    /// since the bound is pushed down into the scan.
    pub fn fetch(&self, query: &Query, count: usize) -> Result<Vec<Entity>, Error> {
        if count == 0 {
            return Err(Error::BadArgument(
                "fetch count must be greater than 0".into(),
            ));
        }
        let mut results = self.run_query_with_limit(query, Some(count as i32))?;
        results.next_batch(count)
    }

    /// Returns the number of entities matching `query`, at most `limit` when
    /// one is given. The count is cached on the query; successive calls do
    /// not re-scan the store unless the query changed.
    pub fn count(&self, query: &Query, limit: Option<i32>) -> Result<i64, Error> {
        if matches!(limit, Some(bound) if bound <= 0) {
            return Err(Error::BadQuery(
                "count limit must be greater than 0 when given".into(),
            ));
        }
        if let Some(count) = query.cached_count() {
            return Ok(count);
        }
        let response: api::Integer64Proto = self.call("Count", &query.to_wire(limit)?)?;
        query.store_count(response.value);
        Ok(response.value)
    }
}

/// Normalizes key arguments and requires each to be complete.
fn normalize_keys<K, I>(keys: I) -> Result<Vec<Key>, Error>
where
    I: IntoIterator<Item = K>,
    K: ToKey,
{
    let keys = keys
        .into_iter()
        .map(|key| key.to_key())
        .collect::<Result<Vec<Key>, Error>>()?;
    if keys.is_empty() {
        return Err(Error::BadArgument("expected at least one key".into()));
    }
    for key in &keys {
        if !key.is_complete() {
            return Err(Error::BadKey(format!("key {key} is not complete")));
        }
    }
    Ok(keys)
}

/// Requires every key to share the first key's entity group and returns it.
fn single_entity_group(keys: &[Key], what: &str) -> Result<Key, Error> {
    let entity_group = keys[0].entity_group();
    for key in keys {
        if key.entity_group() != entity_group {
            return Err(Error::BadRequest(format!(
                "all {what} must be in the same entity group"
            )));
        }
    }
    Ok(entity_group)
}
