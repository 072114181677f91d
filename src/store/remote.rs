use bytes::BytesMut;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpStream, ToSocketAddrs},
    sync::Mutex,
};
use tracing::{debug, warn};

use crate::{
    resp::RespValue,
    store::{BatchResult, StoreCommand, StoreError, StreamStore},
};

#[derive(Debug)]
struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    /// Set once an I/O or framing error leaves unread replies on the wire. Every later call
    /// fails with [`StoreError::ConnectionClosed`] instead of reading someone else's reply.
    broken: bool,
}

impl Connection {
    async fn write_all(&mut self, payload: &str) -> Result<(), StoreError> {
        if self.broken {
            return Err(StoreError::ConnectionClosed);
        }

        let result = self.try_write_all(payload).await;
        if result.is_err() {
            self.broken = true;
        }
        result
    }

    async fn try_write_all(&mut self, payload: &str) -> Result<(), StoreError> {
        self.stream.write_all(payload.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn read_reply(&mut self) -> Result<RespValue, StoreError> {
        if self.broken {
            return Err(StoreError::ConnectionClosed);
        }

        let result = self.try_read_reply().await;
        if result.is_err() {
            self.broken = true;
        }
        result
    }

    /// Reads until one full reply frame is buffered.
    async fn try_read_reply(&mut self) -> Result<RespValue, StoreError> {
        loop {
            if let Some(value) = RespValue::decode(&mut self.buffer)? {
                return Ok(value);
            }

            let number_of_bytes = self.stream.read_buf(&mut self.buffer).await?;
            if number_of_bytes == 0 {
                return Err(StoreError::ConnectionClosed);
            }
        }
    }
}

/// A Redis-family server reached over one RESP connection.
///
/// Requests are serialized on the connection; each call writes its command(s) and waits for the
/// matching replies before the next call may start.
#[derive(Debug)]
pub struct RemoteStore {
    connection: Mutex<Connection>,
}

impl RemoteStore {
    pub async fn connect<A: ToSocketAddrs>(address: A) -> Result<Self, StoreError> {
        let stream = TcpStream::connect(address).await?;
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            connection: Mutex::new(Connection {
                stream,
                buffer: BytesMut::with_capacity(4096),
                broken: false,
            }),
        }
    }
}

fn into_result(reply: RespValue) -> Result<RespValue, StoreError> {
    match reply {
        RespValue::Error(message) => Err(StoreError::Reply(message)),
        other => Ok(other),
    }
}

impl StreamStore for RemoteStore {
    async fn execute(&self, command: StoreCommand) -> Result<RespValue, StoreError> {
        let mut connection = self.connection.lock().await;
        debug!(command = command.name(), "sending command");

        connection.write_all(&command.to_resp().encode()).await?;
        into_result(connection.read_reply().await?)
    }

    async fn execute_multi(&self, commands: Vec<StoreCommand>) -> Result<BatchResult, StoreError> {
        let mut connection = self.connection.lock().await;
        debug!(commands = commands.len(), "sending MULTI batch");

        // MULTI goes out alone: if it is refused, nothing else is on the wire.
        connection
            .write_all(&RespValue::command(["MULTI"]).encode())
            .await?;
        into_result(connection.read_reply().await?)?;

        let mut payload = String::new();
        for command in &commands {
            payload.push_str(&command.to_resp().encode());
        }
        payload.push_str(&RespValue::command(["EXEC"]).encode());
        connection.write_all(&payload).await?;

        // Every queued reply and the EXEC reply are read before returning.
        let mut queue_error: Option<StoreError> = None;
        for command in &commands {
            if let Err(error) = into_result(connection.read_reply().await?) {
                warn!(command = command.name(), %error, "command rejected while queueing");
                queue_error.get_or_insert(error);
            }
        }

        match connection.read_reply().await? {
            RespValue::Array(results) => Ok(results.into_iter().map(into_result).collect()),
            RespValue::Error(message) => Err(queue_error.unwrap_or(StoreError::Reply(message))),
            RespValue::Null => Err(StoreError::Reply(
                "EXECABORT Transaction discarded".to_string(),
            )),
            other => Err(StoreError::Protocol(format!(
                "unexpected EXEC reply: {:?}",
                other
            ))),
        }
    }
}
