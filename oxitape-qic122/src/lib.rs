//! # OxiTape QIC-122
//!
//! Decompression for the QIC-122 style LZ77 scheme used by MS Backup when
//! writing compressed segments to QIC tape images.
//!
//! The codec is bit-oriented and MSB-first. Each token is either a literal
//! byte or a back-reference into a 2048-byte sliding history window:
//!
//! ```text
//! 0 bbbbbbbb                      literal byte
//! 1 1 ooooooo <length>            back-reference, 7-bit offset (1..127)
//! 1 0 ooooooooooo <length>        back-reference, 11-bit offset (1..2047)
//! 1 ? 0...0                       offset zero: end of stream
//! ```
//!
//! Lengths are coded as two 2-bit groups followed by 4-bit groups, each
//! group either finishing the value or saturating and accumulating
//! (3, 3, 15, 15, ...); the minimum length is 2.
//!
//! Only decompression is implemented; the restorer never writes archives.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod decode;
mod window;

pub use decode::decompress;
pub use window::{HistoryWindow, WINDOW_SIZE};
