use tracing::{error, info};

use crate::{
    resp::RespValue,
    store::{catch_transaction_error, StoreCommand, StreamStore},
    stream::{
        dto::{
            AddStreamEntriesRequest, AddStreamEntriesResponse, CreateStreamRequest,
            DeleteStreamEntriesRequest, DeleteStreamEntriesResponse, GetStreamEntriesRequest,
            GetStreamEntriesResponse, SortOrder, StreamEntryDto,
        },
        format::{
            convert_strings_array_to_object, field_pairs, format_array_to_dto,
            format_reply_to_dto,
        },
        stream_error::StreamError,
    },
};

/// Stream query engine: range scans, metadata and transactional mutations of one stream key.
///
/// The store is passed in at construction; the service keeps no state of its own between calls.
#[derive(Debug)]
pub struct StreamService<S> {
    store: S,
}

impl<S: StreamStore> StreamService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Gets stream entries together with the stream metadata.
    ///
    /// Supports lazy loading through `start`, `end` and `count`, in either sort order. The
    /// `first_entry`/`last_entry` of the response describe the whole stream, not the requested
    /// slice.
    pub async fn get_entries(
        &self,
        request: &GetStreamEntriesRequest,
    ) -> Result<GetStreamEntriesResponse, StreamError> {
        info!(key = %request.key_name, "Getting entries of the Stream data type stored at key.");

        match self.try_get_entries(request).await {
            Ok(response) => {
                info!(key = %request.key_name, "Succeed to get entries from the stream.");
                Ok(response)
            }
            Err(e) => {
                error!(key = %request.key_name, error = %e, "Failed to get entries from the stream.");
                Err(e)
            }
        }
    }

    async fn try_get_entries(
        &self,
        request: &GetStreamEntriesRequest,
    ) -> Result<GetStreamEntriesResponse, StreamError> {
        request.validate()?;
        self.ensure_exists(&request.key_name).await?;

        let info = self
            .store
            .execute(StoreCommand::XInfoStream {
                key: request.key_name.clone(),
            })
            .await?;
        let info = convert_strings_array_to_object(&info);

        let entries = match request.sort_order {
            SortOrder::Asc => self.get_range(request).await?,
            SortOrder::Desc => self.get_rev_range(request).await?,
        };

        Ok(GetStreamEntriesResponse {
            key_name: request.key_name.clone(),
            total: info
                .get("length")
                .and_then(RespValue::as_integer)
                .map(|length| length.max(0) as u64)
                .unwrap_or(0),
            last_generated_id: info
                .get("last-generated-id")
                .and_then(RespValue::as_str)
                .unwrap_or_default()
                .to_string(),
            first_entry: info.get("first-entry").and_then(format_array_to_dto),
            last_entry: info.get("last-entry").and_then(format_array_to_dto),
            entries,
        })
    }

    /// Returns up to `count` entries of the range in ascending id order.
    pub async fn get_range(
        &self,
        request: &GetStreamEntriesRequest,
    ) -> Result<Vec<StreamEntryDto>, StreamError> {
        let reply = self
            .store
            .execute(StoreCommand::XRange {
                key: request.key_name.clone(),
                start: request.start.clone(),
                end: request.end.clone(),
                count: Some(request.count),
            })
            .await?;

        Ok(format_reply_to_dto(&reply))
    }

    /// Returns up to `count` entries of the range in descending id order.
    pub async fn get_rev_range(
        &self,
        request: &GetStreamEntriesRequest,
    ) -> Result<Vec<StreamEntryDto>, StreamError> {
        let reply = self
            .store
            .execute(StoreCommand::XRevRange {
                key: request.key_name.clone(),
                end: request.end.clone(),
                start: request.start.clone(),
                count: Some(request.count),
            })
            .await?;

        Ok(format_reply_to_dto(&reply))
    }

    /// Creates a stream, with or without expiration, appending every entry in one transaction.
    pub async fn create_stream(&self, request: &CreateStreamRequest) -> Result<(), StreamError> {
        info!(key = %request.key_name, "Creating stream data type.");

        match self.try_create_stream(request).await {
            Ok(()) => {
                info!(key = %request.key_name, "Succeed to create stream.");
                Ok(())
            }
            Err(e) => {
                error!(key = %request.key_name, error = %e, "Failed to create stream.");
                Err(e)
            }
        }
    }

    async fn try_create_stream(&self, request: &CreateStreamRequest) -> Result<(), StreamError> {
        request.validate()?;

        if self.exists(&request.key_name).await? {
            return Err(StreamError::Conflict);
        }

        let mut commands = append_commands(&request.key_name, &request.entries);
        if let Some(seconds) = request.expire {
            commands.push(StoreCommand::Expire {
                key: request.key_name.clone(),
                seconds,
            });
        }

        let results = self.store.execute_multi(commands).await?;
        catch_transaction_error(results)?;

        Ok(())
    }

    /// Appends entries to an existing stream and returns the ids assigned to them, in input order.
    pub async fn add_entries(
        &self,
        request: &AddStreamEntriesRequest,
    ) -> Result<AddStreamEntriesResponse, StreamError> {
        info!(key = %request.key_name, "Adding entries to stream.");

        match self.try_add_entries(request).await {
            Ok(response) => {
                info!(key = %request.key_name, "Succeed to add entries to the stream.");
                Ok(response)
            }
            Err(e) => {
                error!(key = %request.key_name, error = %e, "Failed to add entries to the stream.");
                Err(e)
            }
        }
    }

    async fn try_add_entries(
        &self,
        request: &AddStreamEntriesRequest,
    ) -> Result<AddStreamEntriesResponse, StreamError> {
        request.validate()?;
        self.ensure_exists(&request.key_name).await?;

        let results = self
            .store
            .execute_multi(append_commands(&request.key_name, &request.entries))
            .await?;
        let replies = catch_transaction_error(results)?;

        Ok(AddStreamEntriesResponse {
            key_name: request.key_name.clone(),
            entries: replies
                .iter()
                .map(|reply| reply.as_str().unwrap_or_default().to_string())
                .collect(),
        })
    }

    /// Deletes entries by id and returns how many were removed.
    ///
    /// The stream may still hold entries the caller never saw. Read [`StreamService::get_length`]
    /// afterwards before deciding to drop the key with [`StreamService::delete_key`].
    pub async fn delete_entries(
        &self,
        request: &DeleteStreamEntriesRequest,
    ) -> Result<DeleteStreamEntriesResponse, StreamError> {
        info!(key = %request.key_name, "Deleting entries from the Stream data type.");

        match self.try_delete_entries(request).await {
            Ok(response) => {
                info!(key = %request.key_name, affected = response.affected, "Succeed to delete entries from the Stream data type.");
                Ok(response)
            }
            Err(e) => {
                error!(key = %request.key_name, error = %e, "Failed to delete entries from the Stream data type.");
                Err(e)
            }
        }
    }

    async fn try_delete_entries(
        &self,
        request: &DeleteStreamEntriesRequest,
    ) -> Result<DeleteStreamEntriesResponse, StreamError> {
        request.validate()?;
        self.ensure_exists(&request.key_name).await?;

        let reply = self
            .store
            .execute(StoreCommand::XDel {
                key: request.key_name.clone(),
                ids: request.entries.clone(),
            })
            .await?;

        Ok(DeleteStreamEntriesResponse {
            affected: reply.as_integer().map(|n| n.max(0) as u64).unwrap_or(0),
        })
    }

    /// Current number of entries in the stream. A missing key has length `0`.
    pub async fn get_length(&self, key_name: &str) -> Result<u64, StreamError> {
        if !self.exists(key_name).await? {
            return Ok(0);
        }

        let info = self
            .store
            .execute(StoreCommand::XInfoStream {
                key: key_name.to_string(),
            })
            .await?;

        Ok(convert_strings_array_to_object(&info)
            .get("length")
            .and_then(RespValue::as_integer)
            .map(|length| length.max(0) as u64)
            .unwrap_or(0))
    }

    /// Removes the whole key. Returns whether a key was removed.
    pub async fn delete_key(&self, key_name: &str) -> Result<bool, StreamError> {
        info!(key = %key_name, "Deleting key.");

        let reply = self
            .store
            .execute(StoreCommand::Del {
                key: key_name.to_string(),
            })
            .await
            .map_err(|e| {
                error!(key = %key_name, error = %e, "Failed to delete key.");
                StreamError::from(e)
            })?;

        Ok(reply.as_integer().unwrap_or(0) > 0)
    }

    async fn exists(&self, key_name: &str) -> Result<bool, StreamError> {
        let reply = self
            .store
            .execute(StoreCommand::Exists {
                key: key_name.to_string(),
            })
            .await?;

        Ok(reply.as_integer().unwrap_or(0) > 0)
    }

    async fn ensure_exists(&self, key_name: &str) -> Result<(), StreamError> {
        if self.exists(key_name).await? {
            Ok(())
        } else {
            Err(StreamError::NotFound)
        }
    }
}

/// One append per entry, in input order.
fn append_commands(key_name: &str, entries: &[StreamEntryDto]) -> Vec<StoreCommand> {
    entries
        .iter()
        .map(|entry| StoreCommand::XAdd {
            key: key_name.to_string(),
            id: entry.id.clone(),
            fields: field_pairs(&entry.fields),
        })
        .collect()
}
