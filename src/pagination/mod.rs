//! Incremental browsing of a stream.
//!
//! Cursor arithmetic lives in [`cursor`], the view state and its transitions in [`state`], and
//! [`StreamPaginator`] ties them to a [`StreamService`](crate::stream::StreamService).

pub mod cursor;
pub mod state;

mod controller;

pub use controller::{DeleteOutcome, PendingFetch, StreamPaginator};
pub use cursor::{get_next_id, get_timestamp_from_id};
pub use state::{
    fresh_request, next_page_request, reduce, should_load_more, sync_window, FetchKind,
    RangeWindow, StreamBounds, StreamEvent, StreamViewState,
};
