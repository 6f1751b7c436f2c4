//! Per-shape decoding from the delimited text layout.
//!
//! Decoding always writes into a caller-owned place; nullable composites
//! collapse a null slot to their empty value, scalars fail on anything
//! unparseable.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use crate::error::HiveError;
use crate::slicer::Slicer;
use crate::NULL;

/// Decode one record image into an existing target value.
pub fn decode_into<T: Decode + ?Sized>(data: &[u8], target: &mut T) -> Result<(), HiveError> {
    let mut dec = Decoder::new();
    target.decode(data, &mut dec)
}

/// Decode one record image into a freshly constructed value.
pub fn decode_from_slice<T: Decode + Default>(data: &[u8]) -> Result<T, HiveError> {
    let mut value = T::default();
    decode_into(data, &mut value)?;
    Ok(value)
}

/// True if a slot denotes null: empty, or the `\N` sentinel.
pub fn is_null(data: &[u8]) -> bool {
    data.is_empty() || data == NULL
}

/// A type that can rebuild itself from one slot of Hive text.
///
/// The slot bytes borrow from the surrounding record; impls must copy
/// whatever they keep. Hand-written impls should wrap their own failures
/// with [`HiveError::decode_failed`].
pub trait Decode {
    fn decode(&mut self, data: &[u8], dec: &mut Decoder) -> Result<(), HiveError>;
}

/// Shared state for one top-level decode: the current nesting depth.
pub struct Decoder {
    pub(crate) depth: u8,
}

impl Decoder {
    pub(crate) fn new() -> Self {
        Self { depth: 0 }
    }

    /// Nesting depth of the slot currently being read.
    pub fn depth(&self) -> u8 {
        self.depth
    }
}

impl Decode for bool {
    fn decode(&mut self, data: &[u8], _dec: &mut Decoder) -> Result<(), HiveError> {
        *self = match data {
            b"true" => true,
            b"false" => false,
            _ => return Err(HiveError::parse::<bool>(data)),
        };
        Ok(())
    }
}

macro_rules! decode_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Decode for $ty {
                fn decode(&mut self, data: &[u8], _dec: &mut Decoder) -> Result<(), HiveError> {
                    let text = std::str::from_utf8(data)
                        .map_err(|_| HiveError::parse::<$ty>(data))?;
                    *self = text.parse().map_err(|_| HiveError::parse::<$ty>(data))?;
                    Ok(())
                }
            }
        )*
    };
}

decode_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! decode_float {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Decode for $ty {
                fn decode(&mut self, data: &[u8], _dec: &mut Decoder) -> Result<(), HiveError> {
                    let text = std::str::from_utf8(data)
                        .map_err(|_| HiveError::parse::<$ty>(data))?;
                    let value: $ty =
                        text.parse().map_err(|_| HiveError::parse::<$ty>(data))?;
                    // An overflowing literal parses to infinity; reject it
                    // the way an out-of-range integer is rejected.
                    if value.is_infinite() {
                        return Err(HiveError::parse::<$ty>(data));
                    }
                    *self = value;
                    Ok(())
                }
            }
        )*
    };
}

decode_float!(f32, f64);

impl Decode for String {
    fn decode(&mut self, data: &[u8], _dec: &mut Decoder) -> Result<(), HiveError> {
        let text = std::str::from_utf8(data).map_err(|_| HiveError::parse::<String>(data))?;
        self.clear();
        self.push_str(text);
        Ok(())
    }
}

impl<T: Decode + Default> Decode for Vec<T> {
    fn decode(&mut self, data: &[u8], dec: &mut Decoder) -> Result<(), HiveError> {
        self.clear();
        if is_null(data) {
            return Ok(());
        }
        let slicer = Slicer::new(data, dec.depth + 2);
        let count = slicer.count();
        self.reserve(count);
        dec.depth += 1;
        for i in 0..count {
            let mut element = T::default();
            element.decode(slicer.slice(i, 1), dec)?;
            self.push(element);
        }
        dec.depth -= 1;
        Ok(())
    }
}

impl<T: Decode + Default, const N: usize> Decode for [T; N] {
    fn decode(&mut self, data: &[u8], dec: &mut Decoder) -> Result<(), HiveError> {
        *self = std::array::from_fn(|_| T::default());
        if is_null(data) {
            return Ok(());
        }
        let slicer = Slicer::new(data, dec.depth + 2);
        if slicer.count() != N {
            return Err(HiveError::parse::<Self>(data));
        }
        dec.depth += 1;
        for (i, element) in self.iter_mut().enumerate() {
            element.decode(slicer.slice(i, 1), dec)?;
        }
        dec.depth -= 1;
        Ok(())
    }
}

fn decode_entries<K, V>(
    data: &[u8],
    dec: &mut Decoder,
    mut insert: impl FnMut(K, V),
) -> Result<(), HiveError>
where
    K: Decode + Default,
    V: Decode + Default,
{
    let pairs = Slicer::new(data, dec.depth + 2);
    let kv_delimiter = dec.depth + 3;
    dec.depth += 2;
    for i in 0..pairs.count() {
        let pair = Slicer::new(pairs.slice(i, 1), kv_delimiter);
        if pair.count() != 2 {
            return Err(HiveError::Parse {
                value: String::from_utf8_lossy(data).into_owned(),
                target: "map entry",
            });
        }
        let mut key = K::default();
        key.decode(pair.slice(0, 1), dec)?;
        let mut value = V::default();
        value.decode(pair.slice(1, 1), dec)?;
        insert(key, value);
    }
    dec.depth -= 2;
    Ok(())
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: Decode + Default + Eq + Hash,
    V: Decode + Default,
    S: BuildHasher,
{
    fn decode(&mut self, data: &[u8], dec: &mut Decoder) -> Result<(), HiveError> {
        self.clear();
        if is_null(data) {
            return Ok(());
        }
        decode_entries(data, dec, |k, v| {
            self.insert(k, v);
        })
    }
}

impl<K, V> Decode for BTreeMap<K, V>
where
    K: Decode + Default + Ord,
    V: Decode + Default,
{
    fn decode(&mut self, data: &[u8], dec: &mut Decoder) -> Result<(), HiveError> {
        self.clear();
        if is_null(data) {
            return Ok(());
        }
        decode_entries(data, dec, |k, v| {
            self.insert(k, v);
        })
    }
}

impl<T: Decode + Default> Decode for Option<T> {
    fn decode(&mut self, data: &[u8], dec: &mut Decoder) -> Result<(), HiveError> {
        if is_null(data) {
            // Absent stays absent; a pre-existing value is not cleared.
            return Ok(());
        }
        *self = Some(T::default());
        if let Some(value) = self.as_mut() {
            value.decode(data, dec)?;
        }
        Ok(())
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode(&mut self, data: &[u8], dec: &mut Decoder) -> Result<(), HiveError> {
        (**self).decode(data, dec)
    }
}
