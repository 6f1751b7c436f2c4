//! Raw byte payloads.
//!
//! `Vec<u8>` and `[u8; N]` would otherwise encode as integer sequences
//! through the generic container impls, so binary columns get dedicated
//! wrapper types that write their bytes verbatim.

use crate::complexity::Complexity;
use crate::decode::{Decode, Decoder};
use crate::encode::{Encode, Encoder};
use crate::error::HiveError;

/// A variable-length byte payload, written raw. Wrap in `Option` for a
/// nullable blob column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Bytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl std::ops::Deref for Bytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.0
    }
}

impl Encode for Bytes {
    fn encode(&self, enc: &mut Encoder) -> Result<(), HiveError> {
        enc.write_bytes(&self.0);
        Ok(())
    }
}

impl Decode for Bytes {
    // The slot is copied verbatim; `\N` here is two literal bytes, not null.
    fn decode(&mut self, data: &[u8], _dec: &mut Decoder) -> Result<(), HiveError> {
        self.0.clear();
        self.0.extend_from_slice(data);
        Ok(())
    }
}

impl Complexity for Bytes {
    const COMPLEXITY: i64 = 0;
}

/// A fixed-length byte payload, written raw; decoding demands exactly `N`
/// bytes in the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FixedBytes<const N: usize>(pub [u8; N]);

impl<const N: usize> Default for FixedBytes<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> From<[u8; N]> for FixedBytes<N> {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes)
    }
}

impl<const N: usize> std::ops::Deref for FixedBytes<N> {
    type Target = [u8; N];

    fn deref(&self) -> &[u8; N] {
        &self.0
    }
}

impl<const N: usize> Encode for FixedBytes<N> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), HiveError> {
        enc.write_bytes(&self.0);
        Ok(())
    }
}

impl<const N: usize> Decode for FixedBytes<N> {
    fn decode(&mut self, data: &[u8], _dec: &mut Decoder) -> Result<(), HiveError> {
        if data.len() != N {
            return Err(HiveError::parse::<Self>(data));
        }
        self.0.copy_from_slice(data);
        Ok(())
    }
}

impl<const N: usize> Complexity for FixedBytes<N> {
    const COMPLEXITY: i64 = 0;
}
