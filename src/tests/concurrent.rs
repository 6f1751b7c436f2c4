use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Barrier, OnceLock};
use std::thread;

use crate::{
    decode_from_slice, encode_to_vec, Complexity, Decode, Decoder, Encode, Encoder, FieldSet,
    HiveError, Record, RecordBuilder,
};

static DESCRIBE_CALLS: AtomicUsize = AtomicUsize::new(0);

/// Hand-rolled record impl so the field-table build can be counted.
#[derive(Debug, Default, PartialEq)]
struct Tracked {
    a: i64,
    b: String,
}

impl Complexity for Tracked {
    const COMPLEXITY: i64 = 1;
}

impl Record for Tracked {
    fn describe(builder: &mut RecordBuilder<Self>) {
        DESCRIBE_CALLS.fetch_add(1, Ordering::SeqCst);
        builder.field::<i64>("a", |r: &Self| &r.a, |r: &mut Self| &mut r.a);
        builder.field::<String>("b", |r: &Self| &r.b, |r: &mut Self| &mut r.b);
    }

    fn fields() -> &'static FieldSet<Self> {
        static FIELDS: OnceLock<FieldSet<Tracked>> = OnceLock::new();
        FIELDS.get_or_init(FieldSet::<Tracked>::build)
    }
}

impl Encode for Tracked {
    fn encode(&self, enc: &mut Encoder) -> Result<(), HiveError> {
        crate::__encode_record(self, enc)
    }
}

impl Decode for Tracked {
    fn decode(&mut self, data: &[u8], dec: &mut Decoder) -> Result<(), HiveError> {
        crate::__decode_record(self, data, dec)
    }
}

#[test]
fn racing_first_use_builds_the_field_table_once() {
    const THREADS: usize = 16;
    let barrier = Barrier::new(THREADS);

    thread::scope(|scope| {
        for t in 0..THREADS {
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                let value = Tracked {
                    a: t as i64,
                    b: format!("t{t}"),
                };
                let data = encode_to_vec(&value).unwrap();
                let back: Tracked = decode_from_slice(&data).unwrap();
                assert_eq!(back, value);
            });
        }
    });

    assert_eq!(DESCRIBE_CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(Tracked::fields().len(), 2);
}

#[test]
fn codec_is_safe_under_mixed_type_pressure() {
    thread::scope(|scope| {
        for t in 0..8 {
            scope.spawn(move || {
                for i in 0..200i64 {
                    let v = vec![t as i64, i];
                    let data = encode_to_vec(&v).unwrap();
                    assert_eq!(decode_from_slice::<Vec<i64>>(&data).unwrap(), v);

                    let s = format!("w{t}-{i}");
                    let data = encode_to_vec(&s).unwrap();
                    assert_eq!(decode_from_slice::<String>(&data).unwrap(), s);
                }
            });
        }
    });
}
