use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    pagination::state::{
        fresh_request, next_page_request, reduce, FetchKind, StreamEvent, StreamViewState,
    },
    store::StreamStore,
    stream::{
        AddStreamEntriesRequest, AddStreamEntriesResponse, DeleteStreamEntriesRequest,
        GetStreamEntriesRequest, GetStreamEntriesResponse, SortOrder, StreamEntryDto, StreamError,
        StreamService,
    },
};

/// A range request that has been issued but not yet answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub generation: u64,
    pub kind: FetchKind,
    pub request: GetStreamEntriesRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Every entry was removed, so the key itself was deleted.
    KeyDeleted,
    /// This many entries were removed and the view was reloaded.
    EntriesDeleted(u64),
}

/// Drives incremental browsing of one stream key.
///
/// Every state change goes through [`reduce`]. Fetches are split into [`begin_fetch`] and
/// [`complete_fetch`] so that a reply can be matched against the request that produced it: a
/// reply for anything but the latest request is dropped.
///
/// [`begin_fetch`]: StreamPaginator::begin_fetch
/// [`complete_fetch`]: StreamPaginator::complete_fetch
#[derive(Debug)]
pub struct StreamPaginator<S> {
    service: Arc<StreamService<S>>,
    state: StreamViewState,
}

impl<S: StreamStore> StreamPaginator<S> {
    pub fn new(service: Arc<StreamService<S>>, key_name: impl Into<String>, count: u64) -> Self {
        Self {
            service,
            state: StreamViewState::new(key_name, count),
        }
    }

    pub fn state(&self) -> &StreamViewState {
        &self.state
    }

    pub fn entries(&self) -> &[StreamEntryDto] {
        &self.state.data.entries
    }

    pub fn apply(&mut self, event: StreamEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, event);
    }

    /// Marks a fetch as in flight and returns the request to send.
    ///
    /// Returns `None` for [`FetchKind::More`] when there is nothing more to load.
    pub fn begin_fetch(&mut self, kind: FetchKind) -> Option<PendingFetch> {
        let request = match kind {
            FetchKind::Fresh => fresh_request(&self.state),
            FetchKind::More => next_page_request(&self.state)?,
        };

        self.apply(StreamEvent::FetchStarted(kind));

        Some(PendingFetch {
            generation: self.state.generation,
            kind,
            request,
        })
    }

    /// Applies the reply of a fetch started with [`StreamPaginator::begin_fetch`].
    ///
    /// Returns `Ok(false)` when the reply was stale and left the state untouched. Errors are handed
    /// back unchanged whether or not the reply was stale.
    pub fn complete_fetch(
        &mut self,
        pending: PendingFetch,
        result: Result<GetStreamEntriesResponse, StreamError>,
    ) -> Result<bool, StreamError> {
        let is_current = pending.generation == self.state.generation;
        if !is_current {
            warn!(
                key = %self.state.key_name,
                generation = pending.generation,
                current = self.state.generation,
                "Discarding reply of a superseded stream request."
            );
        }

        match result {
            Ok(response) => {
                self.apply(StreamEvent::FetchSucceeded {
                    generation: pending.generation,
                    kind: pending.kind,
                    response,
                });
                Ok(is_current)
            }
            Err(e) => {
                self.apply(StreamEvent::FetchFailed {
                    generation: pending.generation,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn fetch(&mut self, kind: FetchKind) -> Result<bool, StreamError> {
        let Some(pending) = self.begin_fetch(kind) else {
            return Ok(false);
        };

        let result = self.service.get_entries(&pending.request).await;
        self.complete_fetch(pending, result)
    }

    /// Replaces the loaded page with the first page of the current window.
    pub async fn load_entries(&mut self) -> Result<(), StreamError> {
        self.fetch(FetchKind::Fresh).await.map(|_| ())
    }

    /// Appends the next page. Returns whether a page was requested.
    pub async fn load_more(&mut self) -> Result<bool, StreamError> {
        self.fetch(FetchKind::More).await
    }

    /// Keeps loading pages until the window is covered or the stream is exhausted.
    pub async fn load_all(&mut self) -> Result<(), StreamError> {
        while self.load_more().await? {}

        info!(
            key = %self.state.key_name,
            loaded = self.state.data.entries.len(),
            "Loaded every entry of the selected range."
        );
        Ok(())
    }

    pub async fn change_sort_order(&mut self, sort_order: SortOrder) -> Result<(), StreamError> {
        self.apply(StreamEvent::SortOrderChanged(sort_order));
        self.load_entries().await
    }

    /// Moves the window start (milliseconds) and reloads from the beginning of the window.
    pub async fn update_start(&mut self, start: u64) -> Result<(), StreamError> {
        self.apply(StreamEvent::StartUpdated(start.to_string()));
        self.load_entries().await
    }

    /// Moves the window end (milliseconds) and reloads from the beginning of the window.
    pub async fn update_end(&mut self, end: u64) -> Result<(), StreamError> {
        self.apply(StreamEvent::EndUpdated(end.to_string()));
        self.load_entries().await
    }

    /// Widens the window back to the whole stream and reloads.
    pub async fn reset_filter(&mut self) -> Result<(), StreamError> {
        self.apply(StreamEvent::FilterReset);
        self.load_entries().await
    }

    /// Appends entries to the browsed key, then reloads. A failed append leaves the view as is.
    pub async fn add_entries(
        &mut self,
        entries: Vec<StreamEntryDto>,
    ) -> Result<AddStreamEntriesResponse, StreamError> {
        let request = AddStreamEntriesRequest {
            key_name: self.state.key_name.clone(),
            entries,
        };
        let response = self.service.add_entries(&request).await?;

        self.load_entries().await?;
        Ok(response)
    }

    /// Deletes entries of the browsed key.
    ///
    /// When the stream is left without entries, the key is deleted as well and the view is
    /// emptied. Otherwise the view is reloaded. The remaining length is read from the store after
    /// the deletion, so entries never loaded into the view still count.
    pub async fn delete_entries(&mut self, ids: Vec<String>) -> Result<DeleteOutcome, StreamError> {
        let request = DeleteStreamEntriesRequest {
            key_name: self.state.key_name.clone(),
            entries: ids,
        };
        let response = self.service.delete_entries(&request).await?;
        let remaining = self.service.get_length(&self.state.key_name).await?;

        if remaining == 0 {
            self.service.delete_key(&self.state.key_name).await?;
            self.apply(StreamEvent::KeyDeleted);
            return Ok(DeleteOutcome::KeyDeleted);
        }

        self.load_entries().await?;
        Ok(DeleteOutcome::EntriesDeleted(response.affected))
    }
}
