use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
};

use tokio::time::Instant;

use crate::stream::{IdRequest, StreamId};

pub const ID_NOT_ABOVE_ZERO: &str = "ERR The ID specified in XADD must be greater than 0-0";
pub const ID_NOT_GREATER: &str =
    "ERR The ID specified in XADD is equal or smaller than the target stream top item";

/// Field/value pairs of a stored entry, in the order they were appended.
pub type EntryFields = Vec<(String, String)>;

#[derive(Debug, PartialEq, Clone, Default)]
pub struct StreamData {
    pub entries: BTreeMap<StreamId, EntryFields>,
    /// Highest id ever assigned, kept when that entry is deleted.
    pub last_generated_id: StreamId,
    pub entries_added: u64,
}

impl StreamData {
    /// Resolves the id an `XADD` call would assign, given the current time in milliseconds.
    pub fn next_id(&self, request: IdRequest, now_ms: u64) -> Result<StreamId, String> {
        let last = self.last_generated_id;

        match request {
            IdRequest::Auto => {
                if now_ms > last.timestamp {
                    Ok(StreamId::new(now_ms, 0))
                } else {
                    last.successor().ok_or_else(|| ID_NOT_GREATER.to_string())
                }
            }
            IdRequest::AutoSequence(timestamp) => {
                if timestamp < last.timestamp {
                    return Err(ID_NOT_GREATER.to_string());
                }

                if timestamp == last.timestamp && self.entries_added > 0 {
                    return last
                        .sequence
                        .checked_add(1)
                        .map(|sequence| StreamId::new(timestamp, sequence))
                        .ok_or_else(|| ID_NOT_GREATER.to_string());
                }

                Ok(StreamId::new(timestamp, if timestamp == 0 { 1 } else { 0 }))
            }
            IdRequest::Explicit(id) => {
                if id == StreamId::MIN {
                    return Err(ID_NOT_ABOVE_ZERO.to_string());
                }
                if id <= last {
                    return Err(ID_NOT_GREATER.to_string());
                }

                Ok(id)
            }
        }
    }

    pub fn append(&mut self, id: StreamId, fields: EntryFields) {
        self.entries.insert(id, fields);
        self.last_generated_id = id;
        self.entries_added += 1;
    }

    /// Entries with ids in `[lower, upper]`, walked backwards when `reverse` is set.
    pub fn range(
        &self,
        lower: StreamId,
        upper: StreamId,
        count: Option<u64>,
        reverse: bool,
    ) -> Vec<(&StreamId, &EntryFields)> {
        if lower > upper {
            return Vec::new();
        }

        let limit = count.map(|c| c as usize).unwrap_or(usize::MAX);
        let range = self
            .entries
            .range((Bound::Included(lower), Bound::Included(upper)));

        if reverse {
            range.rev().take(limit).collect()
        } else {
            range.take(limit).collect()
        }
    }

    /// Removes the given ids and returns how many existed.
    pub fn delete(&mut self, ids: &[StreamId]) -> u64 {
        ids.iter()
            .filter(|id| self.entries.remove(*id).is_some())
            .count() as u64
    }

    pub fn first_entry(&self) -> Option<(&StreamId, &EntryFields)> {
        self.entries.iter().next()
    }

    pub fn last_entry(&self) -> Option<(&StreamId, &EntryFields)> {
        self.entries.iter().next_back()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum DataType {
    String(String),
    Stream(StreamData),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Value {
    pub data: DataType,
    pub expiration: Option<Instant>,
}

impl Value {
    pub fn is_expired(&self) -> bool {
        self.expiration
            .map(|expiration| Instant::now() >= expiration)
            .unwrap_or(false)
    }
}

pub type KeyValueStore = HashMap<String, Value>;
