use thiserror::Error;

use crate::store::StoreError;

pub const KEY_NOT_EXIST: &str = "Key with this name does not exist.";
pub const KEY_NAME_EXIST: &str = "This key name is already in use.";

const WRONG_TYPE: &str = "WRONGTYPE";
const NO_PERMISSION: &str = "NOPERM";
const ID_NOT_GREATER: &str = "ID specified in XADD is equal or smaller";
const ID_NOT_ABOVE_ZERO: &str = "ID specified in XADD must be greater than 0-0";
const INVALID_ID: &str = "Invalid stream ID";

/// Errors surfaced by the stream query engine.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum StreamError {
    #[error("{}", KEY_NOT_EXIST)]
    NotFound,
    #[error("{}", KEY_NAME_EXIST)]
    Conflict,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    AccessDenied(String),
    #[error("{0}")]
    Unknown(String),
}

impl StreamError {
    /// HTTP-style status code of the error class.
    pub fn status_code(&self) -> u16 {
        match self {
            StreamError::NotFound => 404,
            StreamError::Conflict => 409,
            StreamError::BadRequest(_) => 400,
            StreamError::AccessDenied(_) => 403,
            StreamError::Unknown(_) => 500,
        }
    }
}

impl From<StoreError> for StreamError {
    /// Maps a store-reported failure onto the engine's error classes by inspecting its message.
    fn from(error: StoreError) -> Self {
        let message = error.message();

        if message.contains(WRONG_TYPE)
            || message.contains(ID_NOT_GREATER)
            || message.contains(ID_NOT_ABOVE_ZERO)
            || message.contains(INVALID_ID)
        {
            return StreamError::BadRequest(message);
        }

        if message.contains(NO_PERMISSION) {
            return StreamError::AccessDenied(message);
        }

        StreamError::Unknown(message)
    }
}
