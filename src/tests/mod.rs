#![cfg(test)]

mod concurrent;
mod roundtrip;
mod stream;
