use serde::{Deserialize, Serialize};

/// How many times a transaction is retried after a commit race before
/// [`Error::TransactionFailed`](crate::Error::TransactionFailed) is reported.
pub const TRANSACTION_RETRIES: u32 = 10;

/// How many entities the one-at-a-time iterator prefetches per `Next` call.
pub const BUFFER_SIZE: usize = 20;

/// Client tunables. The defaults match the store's recommended settings;
/// embed this in your own configuration if you need to override them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Retry budget for transactions losing a commit race.
    pub transaction_retries: u32,
    /// Prefetch batch size of the one-at-a-time query iterator.
    pub prefetch_size: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            transaction_retries: TRANSACTION_RETRIES,
            prefetch_size: BUFFER_SIZE,
        }
    }
}
