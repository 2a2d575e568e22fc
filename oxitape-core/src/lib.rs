//! # OxiTape Core
//!
//! Core components for the OxiTape QIC tape-image restorer.
//!
//! This crate provides the fundamental building blocks the container and
//! codec crates are written against:
//!
//! - [`bytes`]: bounds-checked, sub-sliceable views over raw archive bytes
//! - [`bitstream`]: MSB-first bit-level I/O for the QIC-122 codec
//! - [`mmap`]: read-only memory-mapped archive access
//! - [`time`]: tape timestamp decoding (seconds since 1970 to calendar time)
//! - [`text`]: UTF-16LE name and path conversion
//! - [`error`]: error types
//!
//! ## Architecture
//!
//! OxiTape is layered the same way the archive is:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ oxitape-cli: argument parsing, filesystem writer        │
//! ├─────────────────────────────────────────────────────────┤
//! │ oxitape-qic: VTBL/MDID headers, segment framing,        │
//! │              catalog tree, data-region recovery         │
//! ├─────────────────────────────────────────────────────────┤
//! │ oxitape-qic122: sliding-window LZ77 decompression       │
//! ├─────────────────────────────────────────────────────────┤
//! │ oxitape-core (this crate): ByteView, BitReader, time    │
//! └─────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod bytes;
pub mod error;
pub mod mmap;
pub mod text;
pub mod time;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter};
pub use bytes::ByteView;
pub use error::{OxiTapeError, Result};
pub use mmap::MmapView;
pub use text::utf16le_to_utf8;
pub use time::{DateMode, TapeTime};
