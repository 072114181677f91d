use std::collections::HashMap;

use tracing::debug;

use crate::{
    resp::RespValue,
    stream::dto::{StreamEntryDto, StreamFields},
};

/// Converts a range-scan reply into entry DTOs.
///
/// The store answers with one array per entry, each holding the id and a flat field/value list:
///
/// ```text
/// [
///   [ "1650985323741-0", [ "field", "value" ] ],
///   [ "1650985351882-0", [ "field", "value2" ] ],
/// ]
/// ```
///
/// which becomes
///
/// ```text
/// [
///   { id: "1650985323741-0", fields: { field: "value" } },
///   { id: "1650985351882-0", fields: { field: "value2" } },
/// ]
/// ```
///
/// Entries that do not decode are skipped and logged. A reply that is not an array yields no
/// entries.
pub fn format_reply_to_dto(reply: &RespValue) -> Vec<StreamEntryDto> {
    let RespValue::Array(entries) = reply else {
        debug!(reply = ?reply, "Range reply is not an array, no entries formatted.");
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let dto = format_array_to_dto(entry);
            if dto.is_none() {
                debug!(index, entry = ?entry, "Skipping malformed stream entry in range reply.");
            }
            dto
        })
        .collect()
}

/// Formats a single `[id, [field, value, ...]]` reply entry.
///
/// Returns `None` for an empty or missing entry, e.g. the `first-entry` of an empty stream. A
/// trailing field without a value is dropped.
///
/// # Examples
///
/// ```
/// use redis_stream_browser::{resp::RespValue, stream::format_array_to_dto};
///
/// let entry = RespValue::Array(vec![
///     RespValue::BulkString("1000-0".to_string()),
///     RespValue::Array(vec![
///         RespValue::BulkString("temperature".to_string()),
///         RespValue::BulkString("37".to_string()),
///     ]),
/// ]);
///
/// let dto = format_array_to_dto(&entry).unwrap();
/// assert_eq!(dto.id, "1000-0");
/// assert_eq!(dto.fields.get("temperature"), Some("37"));
/// assert_eq!(format_array_to_dto(&RespValue::NullBulkString), None);
/// ```
pub fn format_array_to_dto(entry: &RespValue) -> Option<StreamEntryDto> {
    let RespValue::Array(parts) = entry else {
        return None;
    };

    let id = parts.first()?.as_str()?.to_string();
    let mut fields = StreamFields::new();

    if let Some(RespValue::Array(values)) = parts.get(1) {
        for pair in values.chunks(2) {
            if let [field, value] = pair {
                if let (Some(field), Some(value)) = (field.as_str(), value.as_str()) {
                    fields.insert(field, value);
                }
            }
        }
    }

    Some(StreamEntryDto { id, fields })
}

/// Inverse of [`format_array_to_dto`]: rebuilds the `[id, [field, value, ...]]` reply shape.
pub fn entry_to_reply(entry: &StreamEntryDto) -> RespValue {
    RespValue::Array(vec![
        RespValue::BulkString(entry.id.clone()),
        RespValue::Array(
            flatten_fields(&entry.fields)
                .into_iter()
                .map(RespValue::BulkString)
                .collect(),
        ),
    ])
}

/// Owned `(field, value)` pairs in insertion order, as an append takes them.
pub fn field_pairs(fields: &StreamFields) -> Vec<(String, String)> {
    fields
        .iter()
        .map(|(field, value)| (field.to_string(), value.to_string()))
        .collect()
}

/// Flattens fields into the `field, value, field, value, ...` argument order of an append.
pub fn flatten_fields(fields: &StreamFields) -> Vec<String> {
    field_pairs(fields)
        .into_iter()
        .flat_map(|(field, value)| [field, value])
        .collect()
}

/// Turns a flat `[name, value, name, value, ...]` reply into a lookup table.
pub fn convert_strings_array_to_object(reply: &RespValue) -> HashMap<String, RespValue> {
    let mut object = HashMap::new();

    if let RespValue::Array(items) = reply {
        for pair in items.chunks(2) {
            if let [name, value] = pair {
                if let Some(name) = name.as_str() {
                    object.insert(name.to_string(), value.clone());
                }
            }
        }
    }

    object
}
