use std::cell::{Cell, RefCell};

use crate::api;
use crate::client::Client;
use crate::dispatch::Dispatch;
use crate::entity::Entity;
use crate::error::Error;
use crate::key::{Key, KeyID, ToKey};

thread_local! {
    /// Set while a transaction runner is live on this thread. Detects nested
    /// runners and queries issued from inside a transaction; cleared by the
    /// scope guard on every exit path.
    static IN_TRANSACTION: Cell<bool> = const { Cell::new(false) };
}

pub(crate) fn in_transaction() -> bool {
    IN_TRANSACTION.with(Cell::get)
}

struct TxScope;

impl TxScope {
    fn enter() -> Result<TxScope, Error> {
        IN_TRANSACTION.with(|flag| {
            if flag.get() {
                return Err(Error::BadRequest(
                    "nested transactions are not supported".into(),
                ));
            }
            flag.set(true);
            Ok(TxScope)
        })
    }
}

impl Drop for TxScope {
    fn drop(&mut self) {
        IN_TRANSACTION.with(|flag| flag.set(false));
    }
}

struct TxState {
    handle: api::Transaction,
    entity_group: Key,
}

enum Commit {
    Applied,
    Conflict,
}

fn id_or_name(key: &Key) -> String {
    match key.key_id() {
        KeyID::StringID(name) => format!("name={name:?}"),
        KeyID::IntID(id) => format!("id={id}"),
        KeyID::Incomplete => "unassigned".to_string(),
    }
}

/// The dynamic extent of one transaction attempt.
///
/// Handed to the user function by [`Client::run_in_transaction`]; every store
/// call made through it is part of the transaction. No wire transaction
/// exists until the first call: `BeginTransaction` is sent lazily on first
/// touch, which also pins the transaction's entity group. Every later call
/// must stay within that group.
pub struct Transaction<'a, D: Dispatch> {
    client: &'a Client<D>,
    state: RefCell<Option<TxState>>,
}

impl<'a, D: Dispatch> Transaction<'a, D> {
    fn new(client: &'a Client<D>) -> Transaction<'a, D> {
        Transaction {
            client,
            state: RefCell::new(None),
        }
    }

    /// Gets the entity matching `key`; the transaction observes a snapshot
    /// of its entity group.
    pub fn get(&self, key: impl ToKey) -> Result<Entity, Error> {
        self.client.get_with(key, Some(self))
    }

    /// Gets multiple entities; one positional slot per key, `None` for keys
    /// without an entity. All keys must share the transaction's entity
    /// group.
    pub fn get_all<K, I>(&self, keys: I) -> Result<Vec<Option<Entity>>, Error>
    where
        I: IntoIterator<Item = K>,
        K: ToKey,
    {
        self.client.get_all_with(keys, Some(self))
    }

    /// Stores one entity inside the transaction and completes its key.
    pub fn put(&self, entity: &mut Entity) -> Result<Key, Error> {
        self.client.put_with(std::slice::from_mut(entity), Some(self))
            .map(|mut keys| keys.remove(0))
    }

    /// Stores multiple entities inside the transaction.
    pub fn put_all(&self, entities: &mut [Entity]) -> Result<Vec<Key>, Error> {
        self.client.put_with(entities, Some(self))
    }

    /// Deletes the entity matching `key`.
    pub fn delete(&self, key: impl ToKey) -> Result<(), Error> {
        self.client.delete_with(vec![key.to_key()?], Some(self))
    }

    /// Deletes the entities matching `keys`.
    pub fn delete_all<K, I>(&self, keys: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = K>,
        K: ToKey,
    {
        let keys = keys
            .into_iter()
            .map(|key| key.to_key())
            .collect::<Result<Vec<Key>, Error>>()?;
        self.client.delete_with(keys, Some(self))
    }

    /// Returns the wire handle to attach to a request touching
    /// `entity_group`, beginning the transaction on first touch.
    pub(crate) fn attach(&self, entity_group: Key) -> Result<api::Transaction, Error> {
        let mut state = self.state.borrow_mut();
        match state.as_ref() {
            None => {
                let handle: api::Transaction =
                    self.client.call("BeginTransaction", &api::Void {})?;
                *state = Some(TxState {
                    handle,
                    entity_group,
                });
                Ok(handle)
            }
            Some(held) if held.entity_group == entity_group => Ok(held.handle),
            Some(held) => Err(Error::BadRequest(format!(
                "cannot operate on different entity groups in a transaction: \
                 (kind={:?}, {}) and (kind={:?}, {})",
                held.entity_group.kind(),
                id_or_name(&held.entity_group),
                entity_group.kind(),
                id_or_name(&entity_group),
            ))),
        }
    }

    /// Commits the transaction, if one was begun. A commit race reports
    /// [`Commit::Conflict`] so the runner can retry; other failures
    /// propagate.
    fn commit(&self) -> Result<Commit, Error> {
        let state = match self.state.borrow_mut().take() {
            Some(state) => state,
            None => return Ok(Commit::Applied),
        };
        match self.client.call_checked("Commit", &state.handle) {
            Ok(_) => Ok(Commit::Applied),
            Err(rpc) if rpc.code == api::ErrorCode::ConcurrentTransaction as i32 => {
                tracing::warn!(
                    entity_group = %state.entity_group,
                    "transaction collision, retrying"
                );
                Ok(Commit::Conflict)
            }
            Err(rpc) => Err(Error::from_rpc(rpc)),
        }
    }

    /// Best-effort rollback on the failure paths; a rollback that itself
    /// fails is logged and swallowed so the original error is what the
    /// caller sees.
    fn rollback_quietly(&self) {
        let state = match self.state.borrow_mut().take() {
            Some(state) => state,
            None => return,
        };
        if let Err(err) = self.client.call::<_, api::Void>("Rollback", &state.handle) {
            tracing::info!(error = %err, "exception sending rollback");
        }
    }
}

impl<D: Dispatch> Client<D> {
    /// Runs a function inside a full-featured, ACID datastore transaction.
    ///
    /// Every store call made through the [`Transaction`] handed to the
    /// function is made within the transaction, and all entities involved
    /// must belong to one entity group. Queries are not supported inside a
    /// transaction, and transactions do not nest.
    ///
    /// The function may be run more than once when the store reports a
    /// commit race, up to the configured retry budget, so it should be
    /// idempotent. Returning an error rolls the transaction back and
    /// propagates the error; returning the [`Error::Rollback`] sentinel
    /// rolls back and yields `Ok(None)` instead. On commit the function's
    /// value is returned as `Ok(Some(value))`.
    ///
    /// ```no_run
    /// # use datastore3::{Client, Dispatch, Error};
    /// # fn demo(client: &Client<impl Dispatch>) -> Result<(), Error> {
    /// let spent = client.run_in_transaction(|tx| {
    ///     let mut counter = tx.get("/Counter:pints")?;
    ///     let count = counter.get("count").cloned();
    ///     counter.set("count", 0)?;
    ///     tx.put(&mut counter)?;
    ///     Ok(count)
    /// })?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn run_in_transaction<T, F>(&self, mut function: F) -> Result<Option<T>, Error>
    where
        F: FnMut(&Transaction<'_, D>) -> Result<T, Error>,
    {
        let _scope = TxScope::enter()?;

        for _attempt in 0..=self.config().transaction_retries {
            let tx = Transaction::new(self);
            match function(&tx) {
                Ok(value) => match tx.commit()? {
                    Commit::Applied => return Ok(Some(value)),
                    Commit::Conflict => continue,
                },
                Err(Error::Rollback) => {
                    tx.rollback_quietly();
                    return Ok(None);
                }
                Err(err) => {
                    tx.rollback_quietly();
                    return Err(err);
                }
            }
        }

        Err(Error::TransactionFailed(
            "the transaction could not be committed; please try again".into(),
        ))
    }
}
