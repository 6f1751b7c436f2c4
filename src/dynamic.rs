//! Dynamically typed value slots.

use std::any::Any;
use std::fmt;

use crate::complexity::Complexity;
use crate::decode::{is_null, Decode, Decoder};
use crate::encode::{Encode, Encoder};
use crate::error::HiveError;

/// Object-safe view of a codec-capable value, so a [`Dyn`] slot can hold
/// any encodable type and still be downcast. Blanket-implemented; never
/// implement it directly.
pub trait AnyValue: Any + Send {
    fn encode_value(&self, enc: &mut Encoder) -> Result<(), HiveError>;
    fn decode_value(&mut self, data: &[u8], dec: &mut Decoder) -> Result<(), HiveError>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Encode + Decode + Send + 'static> AnyValue for T {
    fn encode_value(&self, enc: &mut Encoder) -> Result<(), HiveError> {
        self.encode(enc)
    }

    fn decode_value(&mut self, data: &[u8], dec: &mut Decoder) -> Result<(), HiveError> {
        self.decode(data, dec)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A slot whose concrete shape is only known at runtime.
///
/// Encoding writes the held value (or the null sentinel when empty).
/// Decoding requires the concrete shape to be pre-specified: install a
/// value of the target type first, and the slot's bytes are decoded into
/// it in place. Decoding a non-null slot into an empty `Dyn` is an
/// [`HiveError::InvalidTarget`] error.
#[derive(Default)]
pub struct Dyn(Option<Box<dyn AnyValue>>);

impl Dyn {
    pub fn new(value: impl AnyValue) -> Self {
        Self(Some(Box::new(value)))
    }

    /// An empty slot; encodes as the null sentinel.
    pub fn null() -> Self {
        Self(None)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// Install the concrete value (and thereby the decode target shape).
    pub fn set(&mut self, value: impl AnyValue) {
        self.0 = Some(Box::new(value));
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn get<T: AnyValue>(&self) -> Option<&T> {
        self.0.as_ref().and_then(|v| v.as_any().downcast_ref())
    }

    pub fn get_mut<T: AnyValue>(&mut self) -> Option<&mut T> {
        self.0.as_mut().and_then(|v| v.as_any_mut().downcast_mut())
    }
}

impl fmt::Debug for Dyn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => f.write_str("Dyn(null)"),
            Some(_) => f.write_str("Dyn(..)"),
        }
    }
}

impl Encode for Dyn {
    fn encode(&self, enc: &mut Encoder) -> Result<(), HiveError> {
        match &self.0 {
            None => {
                enc.write_null();
                Ok(())
            }
            Some(value) => value.encode_value(enc),
        }
    }
}

impl Decode for Dyn {
    fn decode(&mut self, data: &[u8], dec: &mut Decoder) -> Result<(), HiveError> {
        if is_null(data) {
            // A null slot leaves the held value untouched.
            return Ok(());
        }
        match &mut self.0 {
            Some(value) => value.decode_value(data, dec),
            None => Err(HiveError::InvalidTarget(
                "dynamic slot has no concrete value to decode into",
            )),
        }
    }
}

impl Complexity for Dyn {
    const COMPLEXITY: i64 = 0;
}
