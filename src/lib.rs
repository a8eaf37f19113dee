#![warn(missing_docs)]
//! Synchronous Rust client bindings for the datastore_v3 entity store API.
//!
//! Defines the [`Entity`], [`Key`], [`Query`] and [`QueryIter`] types, the
//! [`Client`] facade for the store's calls, and the conversions between these
//! types and their wire counterparts. The transport itself is abstract: every
//! call goes through a caller-supplied [`Dispatch`] channel.

/// Wire-level message definitions for the datastore_v3 protocol.
pub mod api;
/// Error handling utilities.
pub mod error;

mod client;
mod codec;
mod config;
mod dispatch;
mod entity;
mod filter;
mod iter;
mod key;
mod query;
mod transaction;
mod value;

pub use self::client::*;
pub use self::config::*;
pub use self::dispatch::*;
pub use self::entity::*;
pub use self::error::Error;
pub use self::filter::*;
pub use self::iter::*;
pub use self::key::*;
pub use self::query::*;
pub use self::transaction::*;
pub use self::value::*;

#[cfg(test)]
mod tests;
