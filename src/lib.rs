//! Browsing core for Redis streams.
//!
//! This crate reads and edits the entries of a single Redis stream key and pages through them
//! in either id order:
//!
//! - Range queries with stream metadata (XRANGE, XREVRANGE, XINFO STREAM)
//! - Transactional appends with optional expiration (MULTI, XADD, EXPIRE, EXEC)
//! - Deletion of entries and of the emptied key (XDEL, DEL)
//! - Cursor-based pagination within a time-range window
//!
//! Commands reach Redis through the [`store::StreamStore`] trait, implemented by a RESP client
//! over TCP and by an in-memory keyspace used in tests.

pub mod config;
pub mod key_value_store;
pub mod pagination;
pub mod resp;
pub mod store;
pub mod stream;
