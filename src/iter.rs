use std::collections::VecDeque;

use crate::api;
use crate::client::Client;
use crate::dispatch::Dispatch;
use crate::entity::Entity;
use crate::error::Error;

/// An iterator over the results of a datastore query.
///
/// Obtained by building a [`Query`](crate::Query) and running it through
/// [`Client::run_query`]. Wraps an opaque server-side cursor and streams
/// results in bounded batches.
///
/// Two access styles exist and must not be mixed: [`QueryIter::next_batch`]
/// pulls an explicit batch, while the [`Iterator`] implementation yields one
/// entity at a time from a prefetch buffer of
/// [`BUFFER_SIZE`](crate::BUFFER_SIZE) entities.
pub struct QueryIter<'a, D: Dispatch> {
    client: &'a Client<D>,
    cursor: u64,
    buffer: VecDeque<Entity>,
    more_results: bool,
}

impl<'a, D: Dispatch> QueryIter<'a, D> {
    pub(crate) fn new(client: &'a Client<D>, cursor: u64) -> QueryIter<'a, D> {
        QueryIter {
            client,
            cursor,
            buffer: VecDeque::new(),
            more_results: true,
        }
    }

    /// Returns up to `count` further results of the query.
    ///
    /// `count` must be at least 1. Once the server reports the stream
    /// exhausted, returns an empty list. Must not be mixed with the
    /// one-at-a-time iteration style: a non-empty prefetch buffer is
    /// rejected.
    pub fn next_batch(&mut self, count: usize) -> Result<Vec<Entity>, Error> {
        if count == 0 {
            return Err(Error::BadArgument(
                "batch count must be greater than 0".into(),
            ));
        }
        if !self.buffer.is_empty() {
            return Err(Error::BadRequest(
                "can't mix next() and next_batch()".into(),
            ));
        }
        self.fetch(count)
    }

    fn fetch(&mut self, count: usize) -> Result<Vec<Entity>, Error> {
        if !self.more_results {
            return Ok(Vec::new());
        }
        let request = api::NextRequest {
            cursor: Some(api::Cursor { cursor: self.cursor }),
            count: Some(count as i32),
        };
        let result: api::QueryResult = self.client.call("Next", &request)?;
        self.more_results = result.more_results;
        result.result.into_iter().map(Entity::from_wire).collect()
    }
}

impl<'a, D: Dispatch> Iterator for QueryIter<'a, D> {
    type Item = Result<Entity, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entity) = self.buffer.pop_front() {
                return Some(Ok(entity));
            }
            if !self.more_results {
                return None;
            }
            let prefetch = self.client.config().prefetch_size.max(1);
            match self.fetch(prefetch) {
                Ok(batch) => self.buffer.extend(batch),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
