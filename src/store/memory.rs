use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime, SystemTimeError},
};

use tokio::{sync::Mutex, time::Instant};
use tracing::debug;

use crate::{
    key_value_store::{DataType, EntryFields, KeyValueStore, StreamData, Value},
    resp::RespValue,
    store::{BatchResult, StoreCommand, StoreError, StreamStore},
    stream::{IdRequest, RangeBound, StreamId, INVALID_STREAM_ID},
};

pub const WRONG_TYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";
pub const NO_SUCH_KEY: &str = "ERR no such key";

/// In-process keyspace that answers [`StoreCommand`]s the way a Redis server would.
///
/// The keyspace is shared behind an `Arc<Mutex<_>>`; cloning the store clones the handle. A batch
/// holds the lock from its first command to its last.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    store: Arc<Mutex<KeyValueStore>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_store(store: Arc<Mutex<KeyValueStore>>) -> Self {
        Self { store }
    }

    /// Handle on the underlying keyspace, for seeding and inspection.
    pub fn keyspace(&self) -> Arc<Mutex<KeyValueStore>> {
        Arc::clone(&self.store)
    }
}

impl StreamStore for InMemoryStore {
    async fn execute(&self, command: StoreCommand) -> Result<RespValue, StoreError> {
        let mut store_guard = self.store.lock().await;
        debug!(command = command.name(), "executing in-memory command");

        apply(&mut store_guard, command)
    }

    async fn execute_multi(&self, commands: Vec<StoreCommand>) -> Result<BatchResult, StoreError> {
        let mut store_guard = self.store.lock().await;
        debug!(commands = commands.len(), "executing in-memory batch");

        Ok(commands
            .into_iter()
            .map(|command| apply(&mut store_guard, command))
            .collect())
    }
}

fn get_timestamp_in_milliseconds() -> Result<u64, SystemTimeError> {
    let duration_since_epoch = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH)?;

    Ok(duration_since_epoch.as_millis() as u64)
}

fn reply_error(message: &str) -> StoreError {
    StoreError::Reply(message.to_string())
}

/// Drops the key if its deadline has passed, then returns it.
fn live_value<'a>(store: &'a mut KeyValueStore, key: &str) -> Option<&'a mut Value> {
    if store.get(key).map(Value::is_expired).unwrap_or(false) {
        store.remove(key);
    }

    store.get_mut(key)
}

fn stream_mut<'a>(
    store: &'a mut KeyValueStore,
    key: &str,
) -> Result<Option<&'a mut StreamData>, StoreError> {
    match live_value(store, key) {
        None => Ok(None),
        Some(Value {
            data: DataType::Stream(stream),
            ..
        }) => Ok(Some(stream)),
        Some(_) => Err(reply_error(WRONG_TYPE)),
    }
}

fn entry_to_resp(id: &StreamId, fields: &EntryFields) -> RespValue {
    let mut values = Vec::with_capacity(fields.len() * 2);
    for (field, value) in fields {
        values.push(RespValue::BulkString(field.clone()));
        values.push(RespValue::BulkString(value.clone()));
    }

    RespValue::Array(vec![
        RespValue::BulkString(id.to_string()),
        RespValue::Array(values),
    ])
}

fn apply(store: &mut KeyValueStore, command: StoreCommand) -> Result<RespValue, StoreError> {
    match command {
        StoreCommand::Exists { key } => {
            let exists = live_value(store, &key).is_some();
            Ok(RespValue::Integer(exists as i64))
        }
        StoreCommand::Del { key } => {
            let removed = live_value(store, &key).is_some() && store.remove(&key).is_some();
            Ok(RespValue::Integer(removed as i64))
        }
        StoreCommand::Expire { key, seconds } => match live_value(store, &key) {
            Some(value) => {
                value.expiration = Some(Instant::now() + Duration::from_secs(seconds));
                Ok(RespValue::Integer(1))
            }
            None => Ok(RespValue::Integer(0)),
        },
        StoreCommand::XInfoStream { key } => {
            let Some(stream) = stream_mut(store, &key)? else {
                return Err(reply_error(NO_SUCH_KEY));
            };

            let first_entry = stream
                .first_entry()
                .map(|(id, fields)| entry_to_resp(id, fields))
                .unwrap_or(RespValue::NullBulkString);
            let last_entry = stream
                .last_entry()
                .map(|(id, fields)| entry_to_resp(id, fields))
                .unwrap_or(RespValue::NullBulkString);

            Ok(RespValue::Array(vec![
                RespValue::BulkString("length".to_string()),
                RespValue::Integer(stream.entries.len() as i64),
                RespValue::BulkString("last-generated-id".to_string()),
                RespValue::BulkString(stream.last_generated_id.to_string()),
                RespValue::BulkString("entries-added".to_string()),
                RespValue::Integer(stream.entries_added as i64),
                RespValue::BulkString("first-entry".to_string()),
                first_entry,
                RespValue::BulkString("last-entry".to_string()),
                last_entry,
            ]))
        }
        StoreCommand::XRange {
            key,
            start,
            end,
            count,
        } => range(store, &key, &start, &end, count, false),
        StoreCommand::XRevRange {
            key,
            end,
            start,
            count,
        } => range(store, &key, &start, &end, count, true),
        StoreCommand::XAdd { key, id, fields } => {
            let request = id
                .parse::<IdRequest>()
                .map_err(|_| reply_error(INVALID_STREAM_ID))?;
            let now_ms = get_timestamp_in_milliseconds()
                .map_err(|_| reply_error("ERR system time is before unix epoch"))?;

            if stream_mut(store, &key)?.is_none() {
                store.insert(
                    key.clone(),
                    Value {
                        data: DataType::Stream(StreamData::default()),
                        expiration: None,
                    },
                );
            }
            let stream = stream_mut(store, &key)?
                .ok_or_else(|| reply_error("ERR stream could not be created"))?;

            let assigned_id = match stream.next_id(request, now_ms) {
                Ok(assigned_id) => assigned_id,
                Err(message) => {
                    // a rejected first append must not leave an empty stream behind
                    if stream.entries_added == 0 {
                        store.remove(&key);
                    }
                    return Err(StoreError::Reply(message));
                }
            };
            stream.append(assigned_id, fields);

            Ok(RespValue::BulkString(assigned_id.to_string()))
        }
        StoreCommand::XDel { key, ids } => {
            let parsed_ids = ids
                .iter()
                .map(|id| id.parse::<StreamId>())
                .collect::<Result<Vec<StreamId>, String>>()
                .map_err(StoreError::Reply)?;

            match stream_mut(store, &key)? {
                Some(stream) => Ok(RespValue::Integer(stream.delete(&parsed_ids) as i64)),
                None => Ok(RespValue::Integer(0)),
            }
        }
    }
}

fn range(
    store: &mut KeyValueStore,
    key: &str,
    start: &str,
    end: &str,
    count: Option<u64>,
    reverse: bool,
) -> Result<RespValue, StoreError> {
    let lower = RangeBound::parse(start, true).map_err(StoreError::Reply)?;
    let upper = RangeBound::parse(end, false).map_err(StoreError::Reply)?;

    let Some(stream) = stream_mut(store, key)? else {
        return Ok(RespValue::Array(Vec::new()));
    };

    let (Some(lower), Some(upper)) = (lower.as_lower(), upper.as_upper()) else {
        return Ok(RespValue::Array(Vec::new()));
    };

    if count == Some(0) {
        return Ok(RespValue::Array(Vec::new()));
    }

    let entries = stream
        .range(lower, upper, count, reverse)
        .into_iter()
        .map(|(id, fields)| entry_to_resp(id, fields))
        .collect::<Vec<RespValue>>();

    Ok(RespValue::Array(entries))
}
