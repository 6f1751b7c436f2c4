use std::collections::HashMap;
use std::fmt::Debug;

use crate::{decode_from_slice, decode_into, encode_to_vec, Bytes, Decode, Dyn, Encode, NULL};

fn roundtrip<T>(value: T)
where
    T: Encode + Decode + Default + PartialEq + Debug,
{
    let data = encode_to_vec(&value).expect("encode");
    let back: T = decode_from_slice(&data).expect("decode");
    assert_eq!(back, value, "round-trip through {data:?}");
}

#[derive(Debug, Default, PartialEq)]
struct Inner {
    f: Option<f64>,
}

crate::hive_record!(Inner { f: Option<f64> });

#[derive(Debug, Default, PartialEq)]
struct Outer {
    i: i64,
    s: String,
    f: Option<f64>,
    st: Inner,
}

crate::hive_record!(Outer {
    i: i64,
    s: String,
    f: Option<f64>,
    st: Inner,
});

#[derive(Debug, Default, PartialEq)]
struct Unit {}

crate::hive_record!(Unit {});

#[test]
fn values_survive_the_wire() {
    roundtrip(Unit {});
    roundtrip(1i64);
    roundtrip("foo".to_string());
    roundtrip(Bytes::from(&b"bar"[..]));
    roundtrip(Bytes::from(NULL));
    roundtrip(vec![2i64, 3, 4]);
    roundtrip(Some(4.2f64));
    roundtrip(HashMap::from([(1i64, vec![HashMap::from([(2i64, 3i64)])])]));
    roundtrip(Outer {
        i: 4,
        s: "four".into(),
        f: Some(4.2),
        st: Inner { f: Some(4.2) },
    });
}

#[test]
fn null_is_idempotent() {
    roundtrip(Option::<i64>::None);
    roundtrip(Option::<Vec<i64>>::None);
    roundtrip(Option::<HashMap<String, i64>>::None);
    roundtrip(Option::<Inner>::None);

    let mut slot = Dyn::null();
    decode_into(&encode_to_vec(&Dyn::null()).unwrap(), &mut slot).unwrap();
    assert!(slot.is_null());
}

#[test]
fn map_entries_survive_as_a_set() {
    let m: HashMap<String, i64> = HashMap::from([
        ("one".to_string(), 1),
        ("two".to_string(), 2),
        ("three".to_string(), 3),
    ]);
    let back: HashMap<String, i64> = decode_from_slice(&encode_to_vec(&m).unwrap()).unwrap();
    assert_eq!(back, m);
}

#[test]
fn single_entry_map_is_deterministic() {
    let m = HashMap::from([("one".to_string(), 1i64)]);
    assert_eq!(encode_to_vec(&m).unwrap(), b"one\x031");
}

#[test]
fn dynamic_slot_round_trips_through_its_target() {
    let data = encode_to_vec(&Dyn::new(vec![1i64, 2, 3])).unwrap();
    assert_eq!(data, b"1\x022\x023");

    let mut slot = Dyn::new(Vec::<i64>::new());
    decode_into(&data, &mut slot).unwrap();
    assert_eq!(slot.get::<Vec<i64>>(), Some(&vec![1, 2, 3]));
}
