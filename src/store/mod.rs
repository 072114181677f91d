//! Store-facing primitives consumed by the stream engine.
//!
//! A [`StreamStore`] executes single [`StoreCommand`]s and atomic batches of them. Two back-ends
//! are provided: [`InMemoryStore`], an in-process keyspace with Redis stream semantics, and
//! [`RemoteStore`], a RESP connection to a Redis-family server.

mod memory;
mod remote;

use thiserror::Error;

use crate::resp::{RespError, RespValue};

pub use memory::InMemoryStore;
pub use remote::RemoteStore;

/// Failures reported by a store back-end.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum StoreError {
    /// Error reply produced by the store itself, e.g. `WRONGTYPE ...`.
    #[error("{0}")]
    Reply(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("connection closed")]
    ConnectionClosed,
}

impl StoreError {
    /// The message used when classifying the failure.
    pub fn message(&self) -> String {
        match self {
            StoreError::Reply(message) | StoreError::Io(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<RespError> for StoreError {
    fn from(error: RespError) -> Self {
        StoreError::Protocol(error.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        StoreError::Io(error.to_string())
    }
}

/// One store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    Exists {
        key: String,
    },
    XInfoStream {
        key: String,
    },
    XRange {
        key: String,
        start: String,
        end: String,
        count: Option<u64>,
    },
    /// Arguments are in the store's native order: `end` first, then `start`.
    XRevRange {
        key: String,
        end: String,
        start: String,
        count: Option<u64>,
    },
    XAdd {
        key: String,
        id: String,
        fields: Vec<(String, String)>,
    },
    XDel {
        key: String,
        ids: Vec<String>,
    },
    Expire {
        key: String,
        seconds: u64,
    },
    Del {
        key: String,
    },
}

impl StoreCommand {
    pub fn name(&self) -> &'static str {
        match self {
            StoreCommand::Exists { .. } => "EXISTS",
            StoreCommand::XInfoStream { .. } => "XINFO",
            StoreCommand::XRange { .. } => "XRANGE",
            StoreCommand::XRevRange { .. } => "XREVRANGE",
            StoreCommand::XAdd { .. } => "XADD",
            StoreCommand::XDel { .. } => "XDEL",
            StoreCommand::Expire { .. } => "EXPIRE",
            StoreCommand::Del { .. } => "DEL",
        }
    }

    /// Renders the command as the argument vector sent over the wire.
    pub fn to_arguments(&self) -> Vec<String> {
        let mut arguments = vec![self.name().to_string()];

        match self {
            StoreCommand::Exists { key } | StoreCommand::Del { key } => {
                arguments.push(key.clone());
            }
            StoreCommand::XInfoStream { key } => {
                arguments.push("STREAM".to_string());
                arguments.push(key.clone());
            }
            StoreCommand::XRange {
                key,
                start,
                end,
                count,
            } => {
                arguments.extend([key.clone(), start.clone(), end.clone()]);
                if let Some(count) = count {
                    arguments.extend(["COUNT".to_string(), count.to_string()]);
                }
            }
            StoreCommand::XRevRange {
                key,
                end,
                start,
                count,
            } => {
                arguments.extend([key.clone(), end.clone(), start.clone()]);
                if let Some(count) = count {
                    arguments.extend(["COUNT".to_string(), count.to_string()]);
                }
            }
            StoreCommand::XAdd { key, id, fields } => {
                arguments.extend([key.clone(), id.clone()]);
                for (field, value) in fields {
                    arguments.extend([field.clone(), value.clone()]);
                }
            }
            StoreCommand::XDel { key, ids } => {
                arguments.push(key.clone());
                arguments.extend(ids.iter().cloned());
            }
            StoreCommand::Expire { key, seconds } => {
                arguments.extend([key.clone(), seconds.to_string()]);
            }
        }

        arguments
    }

    pub fn to_resp(&self) -> RespValue {
        RespValue::command(self.to_arguments())
    }
}

/// Outcome of each command of an atomic batch, in submission order.
pub type BatchResult = Vec<Result<RespValue, StoreError>>;

/// Backing store of stream data.
///
/// `execute_multi` runs every command as one atomic unit: an observer sees either none or all of
/// them. Per-command failures are reported in the returned vector; the outer error is reserved for
/// failures of the batch as a whole (transport errors, aborted transactions).
#[allow(async_fn_in_trait)]
pub trait StreamStore {
    async fn execute(&self, command: StoreCommand) -> Result<RespValue, StoreError>;

    async fn execute_multi(&self, commands: Vec<StoreCommand>) -> Result<BatchResult, StoreError>;
}

/// Returns the first per-command error of a batch, or the successful replies.
pub fn catch_transaction_error(results: BatchResult) -> Result<Vec<RespValue>, StoreError> {
    results.into_iter().collect()
}
