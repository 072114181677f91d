use std::{collections::HashMap, sync::Arc};

use bytes::BytesMut;
use redis_stream_browser::{
    key_value_store::{DataType, KeyValueStore, Value},
    pagination::StreamPaginator,
    resp::RespValue,
    store::{InMemoryStore, RemoteStore, StoreCommand, StreamStore},
    stream::{StreamEntryDto, StreamFields, StreamService},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::{Mutex, MutexGuard},
    task::JoinHandle,
};

/// Test utilities for building entries and replies
pub struct TestUtils;

impl TestUtils {
    pub fn entry(id: &str, fields: &[(&str, &str)]) -> StreamEntryDto {
        StreamEntryDto::new(id, fields.iter().copied().collect::<StreamFields>())
    }

    pub fn ids(entries: &[StreamEntryDto]) -> Vec<&str> {
        entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    pub fn bulk(value: &str) -> RespValue {
        RespValue::BulkString(value.to_string())
    }

    pub fn simple(value: &str) -> RespValue {
        RespValue::SimpleString(value.to_string())
    }

    /// `[id, [field, value, ...]]`, the shape of one range reply entry
    pub fn reply_entry(id: &str, fields: &[(&str, &str)]) -> RespValue {
        RespValue::Array(vec![
            Self::bulk(id),
            RespValue::Array(
                fields
                    .iter()
                    .flat_map(|(field, value)| [Self::bulk(field), Self::bulk(value)])
                    .collect(),
            ),
        ])
    }
}

/// Test environment backed by an in-memory keyspace
pub struct TestEnv {
    pub keyspace: Arc<Mutex<KeyValueStore>>,
    pub store: InMemoryStore,
    pub service: Arc<StreamService<InMemoryStore>>,
}

impl TestEnv {
    pub fn new() -> Self {
        let keyspace = Arc::new(Mutex::new(HashMap::new()));
        let store = InMemoryStore::with_store(Arc::clone(&keyspace));

        Self {
            keyspace,
            service: Arc::new(StreamService::new(store.clone())),
            store,
        }
    }

    /// Appends entries with explicit ids, bypassing the service
    pub async fn seed_stream(&self, key: &str, entries: &[(&str, &[(&str, &str)])]) {
        for (id, fields) in entries {
            self.store
                .execute(StoreCommand::XAdd {
                    key: key.to_string(),
                    id: id.to_string(),
                    fields: fields
                        .iter()
                        .map(|(field, value)| (field.to_string(), value.to_string()))
                        .collect(),
                })
                .await
                .unwrap();
        }
    }

    /// Seeds a stream whose entries each carry a single `n` field holding the id
    pub async fn seed_ids(&self, key: &str, ids: &[&str]) {
        for id in ids {
            self.seed_stream(key, &[(*id, &[("n", *id)])]).await;
        }
    }

    pub async fn seed_string(&self, key: &str, value: &str) {
        self.get_store().await.insert(
            key.to_string(),
            Value {
                data: DataType::String(value.to_string()),
                expiration: None,
            },
        );
    }

    pub async fn get_store(&self) -> MutexGuard<'_, KeyValueStore> {
        self.keyspace.lock().await
    }

    pub fn paginator(&self, key: &str, count: u64) -> StreamPaginator<InMemoryStore> {
        StreamPaginator::new(Arc::clone(&self.service), key, count)
    }
}

/// Loopback server answering each received command with the next scripted reply.
///
/// The handle resolves to the argument vectors of every command received, in order.
pub struct FakeRedis;

impl FakeRedis {
    pub async fn start(replies: Vec<RespValue>) -> (RemoteStore, JoinHandle<Vec<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = BytesMut::with_capacity(1024);
            let mut received: Vec<Vec<String>> = Vec::new();

            for reply in replies {
                let command = loop {
                    if let Some(command) = RespValue::decode(&mut buffer).unwrap() {
                        break command;
                    }
                    let number_of_bytes = socket.read_buf(&mut buffer).await.unwrap();
                    assert!(number_of_bytes > 0, "client closed the connection early");
                };

                let RespValue::Array(arguments) = &command else {
                    panic!("expected a command array, got {:?}", command);
                };
                received.push(
                    arguments
                        .iter()
                        .map(|argument| argument.as_str().unwrap_or_default().to_string())
                        .collect(),
                );

                socket.write_all(reply.encode().as_bytes()).await.unwrap();
            }

            received
        });

        let store = RemoteStore::connect(address).await.unwrap();
        (store, handle)
    }
}
