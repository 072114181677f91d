use std::{fmt, str::FromStr};

pub const INVALID_STREAM_ID: &str = "ERR Invalid stream ID specified as stream command argument";

/// Composite stream entry identifier `<millisecond-timestamp>-<sequence>`.
///
/// Ordering is by timestamp first and sequence second, which is the order entries are stored and
/// scanned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamId {
    pub timestamp: u64,
    pub sequence: u64,
}

impl StreamId {
    pub const MIN: StreamId = StreamId {
        timestamp: 0,
        sequence: 0,
    };
    pub const MAX: StreamId = StreamId {
        timestamp: u64::MAX,
        sequence: u64::MAX,
    };

    pub fn new(timestamp: u64, sequence: u64) -> Self {
        Self {
            timestamp,
            sequence,
        }
    }

    /// The smallest id strictly greater than this one.
    pub fn successor(&self) -> Option<StreamId> {
        match self.sequence.checked_add(1) {
            Some(sequence) => Some(StreamId::new(self.timestamp, sequence)),
            None => self
                .timestamp
                .checked_add(1)
                .map(|timestamp| StreamId::new(timestamp, 0)),
        }
    }

    /// The largest id strictly smaller than this one.
    pub fn predecessor(&self) -> Option<StreamId> {
        match self.sequence.checked_sub(1) {
            Some(sequence) => Some(StreamId::new(self.timestamp, sequence)),
            None => self
                .timestamp
                .checked_sub(1)
                .map(|timestamp| StreamId::new(timestamp, u64::MAX)),
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.timestamp, self.sequence)
    }
}

impl FromStr for StreamId {
    type Err = String;

    /// Parses a complete `<ts>-<seq>` id. A bare timestamp is read as `<ts>-0`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (timestamp, sequence) = validate_stream_id(input)?;
        Ok(StreamId::new(timestamp, sequence.unwrap_or(0)))
    }
}

/// Validates and splits a stream id string into its timestamp and optional sequence.
///
/// # Examples
///
/// ```
/// use redis_stream_browser::stream::validate_stream_id;
///
/// assert_eq!(validate_stream_id("1526919030484-3"), Ok((1526919030484, Some(3))));
/// assert_eq!(validate_stream_id("1526919030484"), Ok((1526919030484, None)));
/// ```
pub fn validate_stream_id(input: &str) -> Result<(u64, Option<u64>), String> {
    let parts = input.split('-').collect::<Vec<&str>>();

    if parts.len() > 2 {
        return Err(INVALID_STREAM_ID.to_string());
    }

    let timestamp = parts[0]
        .parse::<u64>()
        .map_err(|_| INVALID_STREAM_ID.to_string())?;

    if parts.len() == 1 {
        return Ok((timestamp, None));
    }

    let sequence = parts[1]
        .parse::<u64>()
        .map_err(|_| INVALID_STREAM_ID.to_string())?;

    Ok((timestamp, Some(sequence)))
}

/// One side of an `XRANGE`/`XREVRANGE` interval as written by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    /// `-`
    Min,
    /// `+`
    Max,
    Inclusive(StreamId),
    /// `(` prefixed id.
    Exclusive(StreamId),
}

impl RangeBound {
    /// Parses a range argument. An incomplete id (timestamp only) expands to `<ts>-0` when used
    /// as the lower bound and `<ts>-<u64::MAX>` when used as the upper bound.
    pub fn parse(input: &str, is_lower_bound: bool) -> Result<Self, String> {
        match input {
            "-" => return Ok(RangeBound::Min),
            "+" => return Ok(RangeBound::Max),
            _ => {}
        }

        let (exclusive, raw_id) = match input.strip_prefix('(') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (timestamp, sequence) = validate_stream_id(raw_id)?;
        let sequence = sequence.unwrap_or(if is_lower_bound { 0 } else { u64::MAX });
        let id = StreamId::new(timestamp, sequence);

        if exclusive {
            Ok(RangeBound::Exclusive(id))
        } else {
            Ok(RangeBound::Inclusive(id))
        }
    }

    /// Resolves the bound to an inclusive id as a lower bound. `None` means nothing can match.
    pub fn as_lower(&self) -> Option<StreamId> {
        match self {
            RangeBound::Min => Some(StreamId::MIN),
            RangeBound::Max => Some(StreamId::MAX),
            RangeBound::Inclusive(id) => Some(*id),
            RangeBound::Exclusive(id) => id.successor(),
        }
    }

    /// Resolves the bound to an inclusive id as an upper bound. `None` means nothing can match.
    pub fn as_upper(&self) -> Option<StreamId> {
        match self {
            RangeBound::Min => Some(StreamId::MIN),
            RangeBound::Max => Some(StreamId::MAX),
            RangeBound::Inclusive(id) => Some(*id),
            RangeBound::Exclusive(id) => id.predecessor(),
        }
    }
}

/// Id argument of an `XADD` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRequest {
    /// `*`: timestamp and sequence chosen by the store.
    Auto,
    /// `<ts>-*`: sequence chosen by the store.
    AutoSequence(u64),
    Explicit(StreamId),
}

impl FromStr for IdRequest {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input == "*" {
            return Ok(IdRequest::Auto);
        }

        if let Some(timestamp) = input.strip_suffix("-*") {
            let timestamp = timestamp
                .parse::<u64>()
                .map_err(|_| INVALID_STREAM_ID.to_string())?;
            return Ok(IdRequest::AutoSequence(timestamp));
        }

        input.parse::<StreamId>().map(IdRequest::Explicit)
    }
}
