use std::io;

#[derive(thiserror::Error, Debug)]
pub enum HiveError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    /// Decode asked to fill a target that cannot accept a value
    /// (e.g. a dynamic slot with no concrete value installed).
    #[error("invalid decode target: {0}")]
    InvalidTarget(&'static str),

    /// Value rejected by its encoder (NaN, infinity).
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    /// Input bytes cannot be parsed into the requested shape.
    #[error("cannot parse {value:?} as {target}")]
    Parse {
        value: String,
        target: &'static str,
    },

    /// A flattened record field is unreachable through an absent embedding.
    #[error("record field {0:?} is unreachable")]
    MissingField(&'static str),

    /// Error returned by a user-provided encoder implementation.
    #[error("encode {type_name}: {source}")]
    EncodeFailed {
        type_name: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error returned by a user-provided decoder implementation.
    #[error("decode {type_name}: {source}")]
    DecodeFailed {
        type_name: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A record line exceeded the reader's configured cap.
    #[error("record exceeds {0} bytes")]
    TooLarge(usize),

    /// Cancellation observed at an I/O boundary.
    #[error("cancelled")]
    Cancelled,

    /// The other side of a drain channel went away.
    #[error("closed")]
    Closed,

    /// Normal end of a record stream.
    #[error("end of stream")]
    Eof,
}

impl HiveError {
    pub(crate) fn parse<T>(value: &[u8]) -> Self {
        HiveError::Parse {
            value: String::from_utf8_lossy(value).into_owned(),
            target: std::any::type_name::<T>(),
        }
    }

    /// Wrap a failure from a hand-written [`Encode`](crate::Encode) impl.
    pub fn encode_failed<T>(
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        HiveError::EncodeFailed {
            type_name: std::any::type_name::<T>(),
            source: source.into(),
        }
    }

    /// Wrap a failure from a hand-written [`Decode`](crate::Decode) impl.
    pub fn decode_failed<T>(
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        HiveError::DecodeFailed {
            type_name: std::any::type_name::<T>(),
            source: source.into(),
        }
    }
}
