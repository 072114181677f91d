//! Redis Serialization Protocol (RESP2) values.
//!
//! Store replies are modelled as [`RespValue`]s regardless of which back-end produced them, so the
//! stream engine only ever inspects one reply shape. The encoder produces the exact bytes sent to a
//! server and the decoder consumes frames incrementally from a [`BytesMut`] read buffer.

use bytes::{Buf, BytesMut};
use thiserror::Error;

/// Errors raised while decoding RESP frames.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum RespError {
    #[error("unknown RESP type byte: {0}")]
    UnknownType(char),
    #[error("invalid RESP integer: {0}")]
    InvalidInteger(String),
    #[error("invalid RESP length: {0}")]
    InvalidLength(String),
    #[error("invalid UTF-8 sequence in RESP frame")]
    InvalidUtf8,
    #[error("bulk string is not terminated by CRLF")]
    MissingTerminator,
}

#[derive(Debug, PartialEq, Clone)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(String),
    NullBulkString,
    Array(Vec<RespValue>),
    /// Null array (`*-1`), e.g. an aborted `EXEC`.
    Null,
}

impl RespValue {
    /// Encodes the value into its RESP2 wire representation.
    ///
    /// # Examples
    ///
    /// ```
    /// use redis_stream_browser::resp::RespValue;
    ///
    /// let value = RespValue::Array(vec![RespValue::BulkString("EXISTS".to_string())]);
    /// assert_eq!(value.encode(), "*1\r\n$6\r\nEXISTS\r\n");
    /// ```
    pub fn encode(&self) -> String {
        match self {
            RespValue::SimpleString(s) => format!("+{}\r\n", s),
            RespValue::Error(s) => format!("-{}\r\n", s),
            RespValue::Integer(i) => format!(":{}\r\n", i),
            RespValue::BulkString(s) => format!("${}\r\n{}\r\n", s.len(), s),
            RespValue::NullBulkString => "$-1\r\n".to_string(),
            RespValue::Null => "*-1\r\n".to_string(),
            RespValue::Array(elements) => {
                let mut encoded = format!("*{}\r\n", elements.len());
                for element in elements {
                    encoded.push_str(&element.encode());
                }
                encoded
            }
        }
    }

    /// Builds the command array sent to a server from plain arguments.
    pub fn command<I, T>(arguments: I) -> RespValue
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        RespValue::Array(
            arguments
                .into_iter()
                .map(|argument| RespValue::BulkString(argument.into()))
                .collect(),
        )
    }

    /// Decodes one complete frame from the front of `buffer`.
    ///
    /// Returns `Ok(None)` and leaves the buffer untouched while the frame is still incomplete. On
    /// success the consumed bytes are removed from the buffer.
    pub fn decode(buffer: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        let mut position = 0;

        match parse_frame(&buffer[..], &mut position)? {
            Some(value) => {
                buffer.advance(position);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Returns the textual content of simple and bulk strings.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RespValue::SimpleString(s) | RespValue::BulkString(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the integer content, also accepting numeric strings.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RespValue::Integer(i) => Some(*i),
            RespValue::SimpleString(s) | RespValue::BulkString(s) => s.parse::<i64>().ok(),
            _ => None,
        }
    }
}

fn read_line<'a>(input: &'a [u8], position: &mut usize) -> Result<Option<&'a str>, RespError> {
    let start = *position;
    let Some(offset) = input[start..].windows(2).position(|w| w == b"\r\n") else {
        return Ok(None);
    };

    let line = std::str::from_utf8(&input[start..start + offset]).map_err(|_| RespError::InvalidUtf8)?;
    *position = start + offset + 2;

    Ok(Some(line))
}

fn parse_length(line: &str) -> Result<i64, RespError> {
    line.parse::<i64>()
        .map_err(|_| RespError::InvalidLength(line.to_string()))
}

fn parse_frame(input: &[u8], position: &mut usize) -> Result<Option<RespValue>, RespError> {
    let Some(&type_byte) = input.get(*position) else {
        return Ok(None);
    };
    *position += 1;

    let Some(line) = read_line(input, position)? else {
        return Ok(None);
    };

    match type_byte {
        b'+' => Ok(Some(RespValue::SimpleString(line.to_string()))),
        b'-' => Ok(Some(RespValue::Error(line.to_string()))),
        b':' => line
            .parse::<i64>()
            .map(|i| Some(RespValue::Integer(i)))
            .map_err(|_| RespError::InvalidInteger(line.to_string())),
        b'$' => {
            let length = parse_length(line)?;
            if length < 0 {
                return Ok(Some(RespValue::NullBulkString));
            }

            let length = length as usize;
            let start = *position;
            if input.len() < start + length + 2 {
                return Ok(None);
            }
            if &input[start + length..start + length + 2] != b"\r\n" {
                return Err(RespError::MissingTerminator);
            }

            let content = std::str::from_utf8(&input[start..start + length])
                .map_err(|_| RespError::InvalidUtf8)?;
            *position = start + length + 2;

            Ok(Some(RespValue::BulkString(content.to_string())))
        }
        b'*' => {
            let length = parse_length(line)?;
            if length < 0 {
                return Ok(Some(RespValue::Null));
            }

            let mut elements = Vec::with_capacity(length as usize);
            for _ in 0..length {
                match parse_frame(input, position)? {
                    Some(element) => elements.push(element),
                    None => return Ok(None),
                }
            }

            Ok(Some(RespValue::Array(elements)))
        }
        other => Err(RespError::UnknownType(other as char)),
    }
}
