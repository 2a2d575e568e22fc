//! Vendor metadata ("MDID") block.
//!
//! The 128-byte block after the volume header carries a medium
//! identification record: a 4-byte tag followed by ASCII key/value tokens
//! separated by `0xB0` and terminated by the first NUL. The first token
//! usually starts with the literal key `MediumID`; every other token is a
//! two-character key (`VR`, `CS`, `FM`, `UL`, `DT`, ...) followed by its
//! value.

use crate::layout::VTBL_SIZE;
use oxitape_core::bytes::ByteView;
use oxitape_core::error::Result;
use std::collections::HashMap;

/// Token separator within the metadata block.
const MDID_TERM: u8 = 0xB0;

/// The literal first key.
const MEDIUM_ID: &str = "MediumID";

/// Parsed vendor metadata, keyed by identifier.
pub type VendorMetadata = HashMap<String, String>;

/// Split `data` on `separator`, dropping empty tokens and stopping at the
/// first NUL byte.
fn split_tokens(data: &[u8], separator: u8) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = Vec::new();

    for &byte in data {
        if byte == separator {
            if !current.is_empty() {
                result.push(String::from_utf8_lossy(&current).into_owned());
                current.clear();
            }
        } else if byte != 0 {
            current.push(byte);
        } else {
            break;
        }
    }

    if !current.is_empty() {
        result.push(String::from_utf8_lossy(&current).into_owned());
    }

    result
}

/// Parse the vendor metadata block at `offset`.
///
/// An empty result map means the block was absent or unreadable; the
/// caller treats that as a vendor-block failure.
pub fn parse_vendor_block(view: &ByteView<'_>, offset: usize) -> Result<VendorMetadata> {
    let mut metadata = VendorMetadata::new();

    // Tag word plus the remainder of the 128-byte block.
    if view.read_u32_le(offset).is_err() {
        return Ok(metadata);
    }
    let Ok(bytes) = view.get(offset + 4, VTBL_SIZE - 4) else {
        return Ok(metadata);
    };

    for token in split_tokens(bytes, MDID_TERM) {
        if let Some(value) = token.strip_prefix(MEDIUM_ID) {
            metadata.insert(MEDIUM_ID.to_string(), value.to_string());
        } else {
            // Two-character vendor key, value is the rest.
            let split_at = token
                .char_indices()
                .nth(2)
                .map(|(i, _)| i)
                .unwrap_or(token.len());
            let (key, value) = token.split_at(split_at);
            metadata.insert(key.to_string(), value.to_string());
        }
    }

    Ok(metadata)
}
