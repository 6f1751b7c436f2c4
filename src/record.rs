//! Record layout: declared fields, embedding flattening, and the record
//! codec itself.
//!
//! A record's wire layout is declared once with [`hive_record!`](crate::hive_record).
//! The declaration lists direct fields in order; `[flat]` entries name an
//! embedded record whose fields are inlined into the parent's slot list.
//! The flattened table (names, index paths, per-field complexity, erased
//! accessors) is built on first use and memoized behind a per-type
//! `OnceLock`, so concurrent first users block on a single build.

use std::any::TypeId;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::complexity::Complexity;
use crate::decode::{Decode, Decoder};
use crate::encode::{Encode, Encoder};
use crate::error::HiveError;
use crate::slicer::Slicer;

type GetFn<R> = Arc<dyn for<'a> Fn(&'a R) -> Option<&'a dyn Encode> + Send + Sync>;
type GetMutFn<R> = Arc<dyn for<'a> Fn(&'a mut R) -> Option<&'a mut dyn Decode> + Send + Sync>;
type NarrowFn<R, E> = Arc<dyn for<'a> Fn(&'a R) -> Option<&'a E> + Send + Sync>;
type NarrowMutFn<R, E> = Arc<dyn for<'a> Fn(&'a mut R) -> Option<&'a mut E> + Send + Sync>;

/// A struct with a declared Hive wire layout.
///
/// Implemented by [`hive_record!`](crate::hive_record); not meant to be
/// written by hand.
pub trait Record: Complexity + Default + Sized + 'static {
    /// Push the direct (unflattened) field declarations into `builder`.
    fn describe(builder: &mut RecordBuilder<Self>);

    /// The flattened, index-path-ordered field table. Built at most once
    /// per type.
    fn fields() -> &'static FieldSet<Self>;
}

/// How a field type yields the record embedded in it. `Option` embeddings
/// may be absent, which makes their flattened fields unreachable.
pub trait AsRecord {
    type Rec: Record;

    fn as_record(&self) -> Option<&Self::Rec>;
    fn as_record_mut(&mut self) -> Option<&mut Self::Rec>;
}

impl<E: Record> AsRecord for Option<E> {
    type Rec = E;

    fn as_record(&self) -> Option<&E> {
        self.as_ref()
    }

    fn as_record_mut(&mut self) -> Option<&mut E> {
        self.as_mut()
    }
}

impl<E: Record> AsRecord for Box<E> {
    type Rec = E;

    fn as_record(&self) -> Option<&E> {
        Some(self)
    }

    fn as_record_mut(&mut self) -> Option<&mut E> {
        Some(self)
    }
}

/// One flattened field: where it lives and how to reach it.
pub struct Field<R> {
    name: &'static str,
    index: Vec<usize>,
    complexity: i64,
    get: GetFn<R>,
    get_mut: GetMutFn<R>,
}

impl<R> Field<R> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Positional path from the record root through each embedding.
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub fn complexity(&self) -> i64 {
        self.complexity
    }
}

enum Entry<R> {
    Leaf(Field<R>),
    Embed {
        type_id: TypeId,
        expand: Box<dyn Fn() -> Vec<Entry<R>> + Send + Sync>,
    },
}

impl<E: 'static> Entry<E> {
    /// Re-root this entry one embedding level up: prefix the embed's
    /// position onto the index path and thread accessors through `narrow`.
    fn rebase<R: 'static>(
        self,
        at: usize,
        narrow: NarrowFn<R, E>,
        narrow_mut: NarrowMutFn<R, E>,
    ) -> Entry<R> {
        match self {
            Entry::Leaf(field) => {
                let mut index = Vec::with_capacity(field.index.len() + 1);
                index.push(at);
                index.extend(field.index);
                let inner_get = field.get;
                let inner_get_mut = field.get_mut;
                let get: GetFn<R> =
                    Arc::new(move |r: &R| narrow(r).and_then(|e| inner_get(e)));
                let get_mut: GetMutFn<R> =
                    Arc::new(move |r: &mut R| narrow_mut(r).and_then(|e| inner_get_mut(e)));
                Entry::Leaf(Field {
                    name: field.name,
                    index,
                    complexity: field.complexity,
                    get,
                    get_mut,
                })
            }
            Entry::Embed { type_id, expand } => Entry::Embed {
                type_id,
                expand: Box::new(move || {
                    expand()
                        .into_iter()
                        .map(|entry| entry.rebase(at, narrow.clone(), narrow_mut.clone()))
                        .collect()
                }),
            },
        }
    }
}

/// Collects a record's direct field declarations.
pub struct RecordBuilder<R> {
    entries: Vec<Entry<R>>,
}

impl<R: 'static> RecordBuilder<R> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Declare a regular field.
    pub fn field<F>(&mut self, name: &'static str, get: fn(&R) -> &F, get_mut: fn(&mut R) -> &mut F)
    where
        F: Encode + Decode + Complexity + 'static,
    {
        let at = self.entries.len();
        let erased: GetFn<R> = Arc::new(move |r: &R| Some(get(r) as &dyn Encode));
        let erased_mut: GetMutFn<R> = Arc::new(move |r: &mut R| Some(get_mut(r) as &mut dyn Decode));
        self.entries.push(Entry::Leaf(Field {
            name,
            index: vec![at],
            complexity: F::COMPLEXITY,
            get: erased,
            get_mut: erased_mut,
        }));
    }

    /// Declare an embedded record whose fields are flattened into this one.
    pub fn embed<F>(&mut self, get: fn(&R) -> &F, get_mut: fn(&mut R) -> &mut F)
    where
        F: AsRecord + 'static,
    {
        let at = self.entries.len();
        self.entries.push(Entry::Embed {
            type_id: TypeId::of::<F::Rec>(),
            expand: Box::new(move || {
                let mut inner = RecordBuilder::<F::Rec>::new();
                <F::Rec as Record>::describe(&mut inner);
                let narrow: NarrowFn<R, F::Rec> =
                    Arc::new(move |r: &R| get(r).as_record());
                let narrow_mut: NarrowMutFn<R, F::Rec> =
                    Arc::new(move |r: &mut R| get_mut(r).as_record_mut());
                inner
                    .entries
                    .into_iter()
                    .map(|entry| entry.rebase(at, narrow.clone(), narrow_mut.clone()))
                    .collect()
            }),
        });
    }
}

/// The flattened field table of one record type.
pub struct FieldSet<R> {
    fields: Vec<Field<R>>,
}

impl<R: Record> FieldSet<R> {
    /// Breadth-first flattening with a visited set (a record type embedded
    /// twice is expanded only the first time), then a lexicographic sort by
    /// index path to pin the on-wire field order.
    pub fn build() -> Self {
        let mut builder = RecordBuilder::new();
        R::describe(&mut builder);

        let mut fields = Vec::new();
        let mut queue: VecDeque<Entry<R>> = builder.entries.into();
        let mut visited = HashSet::new();
        visited.insert(TypeId::of::<R>());

        while let Some(entry) = queue.pop_front() {
            match entry {
                Entry::Leaf(field) => fields.push(field),
                Entry::Embed { type_id, expand } => {
                    if !visited.insert(type_id) {
                        continue;
                    }
                    queue.extend(expand());
                }
            }
        }

        fields.sort_by(|a, b| a.index.cmp(&b.index));
        Self { fields }
    }
}

impl<R> FieldSet<R> {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field<R>> {
        self.fields.iter()
    }
}

/// Record encoding: fields in flattened order, separated by the delimiter
/// one past the current depth. A record is flat at its own depth, so the
/// depth is not changed while its fields are written.
#[doc(hidden)]
pub fn encode_record<R: Record>(record: &R, enc: &mut Encoder) -> Result<(), HiveError> {
    let delimiter = enc.depth() + 1;
    for (i, field) in R::fields().iter().enumerate() {
        let value = (field.get)(record).ok_or(HiveError::MissingField(field.name))?;
        if i > 0 {
            enc.push(delimiter);
        }
        value.encode(enc)?;
    }
    Ok(())
}

/// Record decoding: the slot count must be exactly `complexity + 1`, each
/// field consumes `complexity + 1` contiguous slots, and an empty image
/// leaves the record zero-initialised.
#[doc(hidden)]
pub fn decode_record<R: Record>(
    record: &mut R,
    data: &[u8],
    dec: &mut Decoder,
) -> Result<(), HiveError> {
    *record = R::default();

    let slicer = Slicer::new(data, dec.depth() + 1);
    let count = slicer.count();
    if count == 0 {
        return Ok(());
    }
    if count as i64 != R::COMPLEXITY + 1 {
        return Err(HiveError::parse::<R>(data));
    }

    let mut offset = 0usize;
    for field in R::fields().iter() {
        let len = (field.complexity + 1) as usize;
        if len == 0 {
            // An empty embedded record occupies no slot; its zero value
            // from the reset above already stands.
            continue;
        }
        let target = (field.get_mut)(record).ok_or(HiveError::MissingField(field.name))?;
        target.decode(slicer.slice(offset, len), dec)?;
        offset += len;
    }

    if offset != count {
        return Err(HiveError::parse::<R>(data));
    }
    Ok(())
}

/// Declares the wire layout of a record type.
///
/// Lists the serialized fields in wire order; struct fields left out of the
/// declaration are simply not part of the format. `[flat]` marks an
/// embedded record (`E`, `Option<E>`, or `Box<E>`) whose fields are
/// flattened into the parent:
///
/// ```
/// use std::collections::HashMap;
/// use hivetext::hive_record;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Row {
///     id: i64,
///     name: String,
///     tags: Vec<String>,
///     attrs: HashMap<String, i64>,
/// }
///
/// hive_record!(Row {
///     id: i64,
///     name: String,
///     tags: Vec<String>,
///     attrs: HashMap<String, i64>,
/// });
/// ```
///
/// The macro implements `Complexity`, `Record`, `Encode`, `Decode`, and
/// `AsRecord` for the type; the struct itself must be `Default`.
#[macro_export]
macro_rules! hive_record {
    ($ty:ty { $( $([$marker:ident])? $field:ident : $fty:ty ),* $(,)? }) => {
        impl $crate::Complexity for $ty {
            const COMPLEXITY: i64 = 0 $( + <$fty as $crate::Complexity>::COMPLEXITY + 1 )* - 1;
        }

        impl $crate::Record for $ty {
            fn describe(builder: &mut $crate::RecordBuilder<Self>) {
                let _ = &builder;
                $( $crate::__hive_record_field!(builder, $([$marker])? $field : $fty); )*
            }

            fn fields() -> &'static $crate::FieldSet<Self> {
                static FIELDS: ::std::sync::OnceLock<$crate::FieldSet<$ty>> =
                    ::std::sync::OnceLock::new();
                FIELDS.get_or_init($crate::FieldSet::<$ty>::build)
            }
        }

        impl $crate::AsRecord for $ty {
            type Rec = $ty;

            fn as_record(&self) -> ::std::option::Option<&$ty> {
                ::std::option::Option::Some(self)
            }

            fn as_record_mut(&mut self) -> ::std::option::Option<&mut $ty> {
                ::std::option::Option::Some(self)
            }
        }

        impl $crate::Encode for $ty {
            fn encode(
                &self,
                enc: &mut $crate::Encoder,
            ) -> ::std::result::Result<(), $crate::HiveError> {
                $crate::__encode_record(self, enc)
            }
        }

        impl $crate::Decode for $ty {
            fn decode(
                &mut self,
                data: &[u8],
                dec: &mut $crate::Decoder,
            ) -> ::std::result::Result<(), $crate::HiveError> {
                $crate::__decode_record(self, data, dec)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __hive_record_field {
    ($builder:ident, [flat] $field:ident : $fty:ty) => {
        $builder.embed::<$fty>(|r: &Self| &r.$field, |r: &mut Self| &mut r.$field);
    };
    ($builder:ident, $field:ident : $fty:ty) => {
        $builder.field::<$fty>(
            stringify!($field),
            |r: &Self| &r.$field,
            |r: &mut Self| &mut r.$field,
        );
    };
}
