//! Codec for Hive's LazySimpleSerDe text format: one record per line,
//! fields and nested structures separated by ascending control-byte
//! delimiters (0x01, 0x02, …), `\N` for null.

mod bytes;
mod cancel;
mod complexity;
mod decode;
mod dynamic;
mod encode;
mod error;
mod pool;
mod reader;
mod record;
mod slicer;
mod tests;
mod writer;

pub use crate::bytes::{Bytes, FixedBytes};
pub use crate::cancel::CancelToken;
pub use crate::complexity::Complexity;
pub use crate::decode::{decode_from_slice, decode_into, is_null, Decode, Decoder};
pub use crate::dynamic::{AnyValue, Dyn};
pub use crate::encode::{encode_to_vec, Encode, Encoder};
pub use crate::error::HiveError;
pub use crate::reader::{decode_all, HiveReader, HiveReaderBuilder, DEFAULT_LINE_DELIMITER};
pub use crate::record::{AsRecord, Field, FieldSet, Record, RecordBuilder};
pub use crate::writer::{encode_all, HiveWriter};

#[doc(hidden)]
pub use crate::record::{decode_record as __decode_record, encode_record as __encode_record};

/// The two-byte null sentinel, `\N`.
pub const NULL: &[u8] = b"\\N";
