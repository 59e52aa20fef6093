//! Tripwire — BLAKE3 hashing of synthesized output, stale-output detection.

pub mod drift;
pub mod hasher;
