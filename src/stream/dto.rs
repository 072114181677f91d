use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::stream::stream_error::StreamError;

/// Default page size of a stream range query.
pub const SCAN_COUNT_DEFAULT: u64 = 500;
/// Largest accepted expiration, in seconds.
pub const MAX_TTL_NUMBER: u64 = 2_147_483_647;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ASC")]
    Asc,
    #[default]
    #[serde(rename = "DESC")]
    Desc,
}

/// Field/value pairs of one entry, kept in wire order.
///
/// Serializes as a JSON object. Assigning an existing field overwrites its value in place, so the
/// position of the first occurrence is kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamFields(Vec<(String, String)>);

impl StreamFields {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();

        match self.0.iter_mut().find(|(existing, _)| *existing == field) {
            Some(pair) => pair.1 = value,
            None => self.0.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(f, v)| (f.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<F: Into<String>, V: Into<String>> FromIterator<(F, V)> for StreamFields {
    fn from_iter<I: IntoIterator<Item = (F, V)>>(iter: I) -> Self {
        let mut fields = StreamFields::new();
        for (field, value) in iter {
            fields.insert(field, value);
        }
        fields
    }
}

impl Serialize for StreamFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, value) in &self.0 {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

struct StreamFieldsVisitor;

impl<'de> Visitor<'de> for StreamFieldsVisitor {
    type Value = StreamFields;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of stream field names to values")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
        let mut fields = StreamFields::new();
        while let Some((field, value)) = access.next_entry::<String, String>()? {
            fields.insert(field, value);
        }
        Ok(fields)
    }
}

impl<'de> Deserialize<'de> for StreamFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StreamFieldsVisitor)
    }
}

fn default_entry_id() -> String {
    "*".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEntryDto {
    #[serde(default = "default_entry_id")]
    pub id: String,
    pub fields: StreamFields,
}

impl StreamEntryDto {
    pub fn new(id: impl Into<String>, fields: StreamFields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

fn default_start() -> String {
    "-".to_string()
}

fn default_end() -> String {
    "+".to_string()
}

fn default_count() -> u64 {
    SCAN_COUNT_DEFAULT
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetStreamEntriesRequest {
    pub key_name: String,
    #[serde(default = "default_start")]
    pub start: String,
    #[serde(default = "default_end")]
    pub end: String,
    #[serde(default = "default_count")]
    pub count: u64,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl GetStreamEntriesRequest {
    /// Whole-stream request with default page size and descending order.
    pub fn new(key_name: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            start: default_start(),
            end: default_end(),
            count: SCAN_COUNT_DEFAULT,
            sort_order: SortOrder::default(),
        }
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        validate_key_name(&self.key_name)?;

        if self.count < 1 {
            return Err(StreamError::BadRequest(
                "count must not be less than 1".to_string(),
            ));
        }
        if self.start.is_empty() || self.end.is_empty() {
            return Err(StreamError::BadRequest(
                "start and end should not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetStreamEntriesResponse {
    pub key_name: String,
    pub total: u64,
    pub last_generated_id: String,
    pub first_entry: Option<StreamEntryDto>,
    pub last_entry: Option<StreamEntryDto>,
    pub entries: Vec<StreamEntryDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStreamRequest {
    pub key_name: String,
    pub entries: Vec<StreamEntryDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire: Option<u64>,
}

impl CreateStreamRequest {
    pub fn validate(&self) -> Result<(), StreamError> {
        validate_key_name(&self.key_name)?;
        validate_entries(&self.entries)?;

        if let Some(expire) = self.expire {
            if !(1..=MAX_TTL_NUMBER).contains(&expire) {
                return Err(StreamError::BadRequest(format!(
                    "expire must be between 1 and {}",
                    MAX_TTL_NUMBER
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStreamEntriesRequest {
    pub key_name: String,
    pub entries: Vec<StreamEntryDto>,
}

impl AddStreamEntriesRequest {
    pub fn validate(&self) -> Result<(), StreamError> {
        validate_key_name(&self.key_name)?;
        validate_entries(&self.entries)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStreamEntriesResponse {
    pub key_name: String,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteStreamEntriesRequest {
    pub key_name: String,
    pub entries: Vec<String>,
}

impl DeleteStreamEntriesRequest {
    pub fn validate(&self) -> Result<(), StreamError> {
        validate_key_name(&self.key_name)?;

        if self.entries.is_empty() {
            return Err(StreamError::BadRequest(
                "entries must contain at least 1 element".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteStreamEntriesResponse {
    pub affected: u64,
}

fn validate_key_name(key_name: &str) -> Result<(), StreamError> {
    if key_name.is_empty() {
        return Err(StreamError::BadRequest(
            "keyName should not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_entries(entries: &[StreamEntryDto]) -> Result<(), StreamError> {
    if entries.is_empty() {
        return Err(StreamError::BadRequest(
            "entries must contain at least 1 element".to_string(),
        ));
    }

    if entries.iter().any(|entry| entry.fields.is_empty()) {
        return Err(StreamError::BadRequest(
            "fields must contain at least 1 element".to_string(),
        ));
    }

    Ok(())
}
