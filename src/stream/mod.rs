//! Stream query engine.
//!
//! [`StreamService`] turns browse requests into range scans against a [`StreamStore`], validates
//! that the key exists and holds a stream, and normalizes the store's reply shape into DTOs. It
//! also appends entries transactionally and deletes entries by id.
//!
//! [`StreamStore`]: crate::store::StreamStore

mod dto;
mod format;
mod service;
mod stream_error;
mod stream_id;

pub use dto::{
    AddStreamEntriesRequest, AddStreamEntriesResponse, CreateStreamRequest,
    DeleteStreamEntriesRequest, DeleteStreamEntriesResponse, GetStreamEntriesRequest,
    GetStreamEntriesResponse, SortOrder, StreamEntryDto, StreamFields, MAX_TTL_NUMBER,
    SCAN_COUNT_DEFAULT,
};
pub use format::{
    convert_strings_array_to_object, entry_to_reply, field_pairs, flatten_fields,
    format_array_to_dto, format_reply_to_dto,
};
pub use service::StreamService;
pub use stream_error::{StreamError, KEY_NAME_EXIST, KEY_NOT_EXIST};
pub use stream_id::{validate_stream_id, IdRequest, RangeBound, StreamId, INVALID_STREAM_ID};
