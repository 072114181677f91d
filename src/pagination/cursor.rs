use crate::stream::SortOrder;

/// Millisecond timestamp part of an entry id (`"1650985323741-5"` gives `1650985323741`).
pub fn get_timestamp_from_id(id: &str) -> Option<u64> {
    id.split('-').next()?.parse::<u64>().ok()
}

/// Cursor that continues a scan past `id` in the given direction without repeating it.
///
/// - ascending: the sequence is incremented (`ts-5` gives `ts-6`);
/// - descending: the sequence is decremented (`ts-5` gives `ts-4`), and `ts-0` gives `ts-1` with
///   no sequence, i.e. anything up to the end of the previous millisecond;
/// - an id without a sequence gives `<id>-1`.
///
/// Returns `None` when no further cursor exists in that direction or the id is malformed.
///
/// # Examples
///
/// ```
/// use redis_stream_browser::{pagination::get_next_id, stream::SortOrder};
///
/// assert_eq!(get_next_id("1650985323741-5", SortOrder::Asc).as_deref(), Some("1650985323741-6"));
/// assert_eq!(get_next_id("1650985323741-0", SortOrder::Desc).as_deref(), Some("1650985323740"));
/// ```
pub fn get_next_id(id: &str, sort_order: SortOrder) -> Option<String> {
    let parts = id.split('-').collect::<Vec<&str>>();

    match parts.as_slice() {
        [timestamp] => {
            timestamp.parse::<u64>().ok()?;
            Some(format!("{}-1", id))
        }
        [timestamp, sequence] => {
            let timestamp = timestamp.parse::<u64>().ok()?;
            let sequence = sequence.parse::<u64>().ok()?;

            match sort_order {
                SortOrder::Desc if sequence == 0 => {
                    timestamp.checked_sub(1).map(|previous| previous.to_string())
                }
                SortOrder::Desc => Some(format!("{}-{}", timestamp, sequence - 1)),
                SortOrder::Asc => match sequence.checked_add(1) {
                    Some(next) => Some(format!("{}-{}", timestamp, next)),
                    None => timestamp.checked_add(1).map(|next| format!("{}-0", next)),
                },
            }
        }
        _ => None,
    }
}
