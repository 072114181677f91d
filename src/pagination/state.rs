use crate::{
    pagination::cursor::{get_next_id, get_timestamp_from_id},
    stream::{GetStreamEntriesRequest, GetStreamEntriesResponse, SortOrder, SCAN_COUNT_DEFAULT},
};

/// Visible time-range slice of the stream. Empty strings mean "up to the stream boundary".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RangeWindow {
    pub start: String,
    pub end: String,
}

impl RangeWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Timestamps of the whole stream's first and last entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamBounds {
    pub first: Option<u64>,
    pub last: Option<u64>,
}

impl StreamBounds {
    pub fn of(data: &GetStreamEntriesResponse) -> Self {
        Self {
            first: data
                .first_entry
                .as_ref()
                .and_then(|entry| get_timestamp_from_id(&entry.id)),
            last: data
                .last_entry
                .as_ref()
                .and_then(|entry| get_timestamp_from_id(&entry.id)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Replaces the loaded page with the start of the current window.
    Fresh,
    /// Appends the page following the last loaded entry.
    More,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamViewState {
    pub key_name: String,
    /// Page size of every range request.
    pub count: u64,
    pub loading: bool,
    pub error: Option<String>,
    pub sort_order: SortOrder,
    pub range: RangeWindow,
    pub data: GetStreamEntriesResponse,
    /// Id of the latest issued request; replies carrying another id are stale.
    pub generation: u64,
    /// Set once a page came back shorter than `count`.
    pub exhausted: bool,
}

impl Default for StreamViewState {
    fn default() -> Self {
        Self::new("", SCAN_COUNT_DEFAULT)
    }
}

impl StreamViewState {
    pub fn new(key_name: impl Into<String>, count: u64) -> Self {
        let key_name = key_name.into();

        Self {
            data: GetStreamEntriesResponse {
                key_name: key_name.clone(),
                ..GetStreamEntriesResponse::default()
            },
            key_name,
            count,
            loading: false,
            error: None,
            sort_order: SortOrder::Desc,
            range: RangeWindow::default(),
            generation: 0,
            exhausted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    FetchStarted(FetchKind),
    FetchSucceeded {
        generation: u64,
        kind: FetchKind,
        response: GetStreamEntriesResponse,
    },
    FetchFailed {
        generation: u64,
        error: String,
    },
    StartUpdated(String),
    EndUpdated(String),
    SortOrderChanged(SortOrder),
    FilterReset,
    KeyDeleted,
}

/// Applies one event and returns the next state.
pub fn reduce(state: StreamViewState, event: StreamEvent) -> StreamViewState {
    match event {
        StreamEvent::FetchStarted(_) => StreamViewState {
            loading: true,
            error: None,
            generation: state.generation + 1,
            ..state
        },
        StreamEvent::FetchSucceeded {
            generation,
            kind,
            response,
        } => {
            if generation != state.generation {
                return state;
            }

            let previous_bounds = StreamBounds::of(&state.data);
            let current_bounds = StreamBounds::of(&response);
            let exhausted = (response.entries.len() as u64) < state.count;
            let range = sync_window(&state.range, previous_bounds, current_bounds);

            let data = match kind {
                FetchKind::Fresh => response,
                FetchKind::More => {
                    let mut entries = state.data.entries;
                    entries.extend(response.entries);
                    GetStreamEntriesResponse {
                        entries,
                        ..response
                    }
                }
            };

            StreamViewState {
                loading: false,
                error: None,
                range,
                data,
                exhausted,
                ..state
            }
        }
        StreamEvent::FetchFailed { generation, error } => {
            if generation != state.generation {
                return state;
            }

            StreamViewState {
                loading: false,
                error: Some(error),
                ..state
            }
        }
        StreamEvent::StartUpdated(start) => {
            let start = clamp_side(start, &state.range.end, u64::min);
            StreamViewState {
                range: RangeWindow {
                    start,
                    ..state.range
                },
                ..state
            }
        }
        StreamEvent::EndUpdated(end) => {
            let end = clamp_side(end, &state.range.start, u64::max);
            StreamViewState {
                range: RangeWindow { end, ..state.range },
                ..state
            }
        }
        StreamEvent::SortOrderChanged(sort_order) => {
            let mut data = state.data;
            data.entries.clear();

            StreamViewState {
                sort_order,
                data,
                exhausted: false,
                ..state
            }
        }
        StreamEvent::FilterReset => {
            let bounds = StreamBounds::of(&state.data);
            let side = |bound: Option<u64>| bound.map(|t| t.to_string()).unwrap_or_default();

            StreamViewState {
                range: RangeWindow::new(side(bounds.first), side(bounds.last)),
                ..state
            }
        }
        StreamEvent::KeyDeleted => StreamViewState {
            loading: false,
            exhausted: true,
            ..StreamViewState::new(state.key_name, state.count)
        },
    }
}

/// Keeps `start <= end` when one side is moved: the moved side is limited by the other one.
fn clamp_side(value: String, other: &str, limit: fn(u64, u64) -> u64) -> String {
    match (value.parse::<u64>(), other.parse::<u64>()) {
        (Ok(value), Ok(other)) => limit(value, other).to_string(),
        _ => value,
    }
}

/// Re-anchors the window after the stream's global bounds moved.
///
/// A side still pinned to the previous global bound (or unset) follows the new bound; a side the
/// user narrowed is kept. A side whose bound disappeared (empty stream) is cleared.
pub fn sync_window(
    window: &RangeWindow,
    previous: StreamBounds,
    current: StreamBounds,
) -> RangeWindow {
    RangeWindow {
        start: sync_side(&window.start, previous.first, current.first),
        end: sync_side(&window.end, previous.last, current.last),
    }
}

fn sync_side(value: &str, previous: Option<u64>, current: Option<u64>) -> String {
    let Some(current) = current else {
        return String::new();
    };

    if value.is_empty() {
        return current.to_string();
    }

    match previous {
        Some(previous) if previous != current && value == previous.to_string() => {
            current.to_string()
        }
        _ => value.to_string(),
    }
}

fn bound_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Request for the first page of the current window in the current order.
pub fn fresh_request(state: &StreamViewState) -> GetStreamEntriesRequest {
    GetStreamEntriesRequest {
        key_name: state.key_name.clone(),
        start: bound_or(&state.range.start, "-"),
        end: bound_or(&state.range.end, "+"),
        count: state.count,
        sort_order: state.sort_order,
    }
}

/// Request for the page after the last loaded entry, if the scan should continue.
///
/// The scan continues while the last loaded timestamp is still inside the window on the side the
/// scan moves toward: at or before `end` when ascending, at or after `start` when descending. An
/// unset side falls back to the whole stream's last (first) entry.
pub fn next_page_request(state: &StreamViewState) -> Option<GetStreamEntriesRequest> {
    if state.loading || state.exhausted {
        return None;
    }

    let last_loaded_id = &state.data.entries.last()?.id;
    let last_loaded_timestamp = get_timestamp_from_id(last_loaded_id)?;
    let bounds = StreamBounds::of(&state.data);

    let within_window = match state.sort_order {
        SortOrder::Asc => {
            let end = state.range.end.parse::<u64>().ok().or(bounds.last)?;
            last_loaded_timestamp <= end
        }
        SortOrder::Desc => {
            let start = state.range.start.parse::<u64>().ok().or(bounds.first)?;
            last_loaded_timestamp >= start
        }
    };
    if !within_window {
        return None;
    }

    let next_id = get_next_id(last_loaded_id, state.sort_order)?;
    let (start, end) = match state.sort_order {
        SortOrder::Asc => (next_id, bound_or(&state.range.end, "+")),
        SortOrder::Desc => (bound_or(&state.range.start, "-"), next_id),
    };

    Some(GetStreamEntriesRequest {
        key_name: state.key_name.clone(),
        start,
        end,
        count: state.count,
        sort_order: state.sort_order,
    })
}

pub fn should_load_more(state: &StreamViewState) -> bool {
    next_page_request(state).is_some()
}
