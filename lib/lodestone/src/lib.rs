#![allow(clippy::len_without_is_empty)]
#![allow(clippy::new_without_default)]

/// Two-byte terminator ending every message on the wire, in both directions.
pub const DELIMITER: [u8; 2] = [0x07, 0x08];

pub mod logging;
pub mod shared;
