//! Segmented region reading.
//!
//! Both the catalog and the data region are carried as a run of segments,
//! each prefixed by the framing in [`SegmentFrame`]. The two regions
//! terminate differently: the catalog's uncompressed length is known from
//! the volume header, so its pass consumes exactly `dir_size` payload
//! bytes; the data region runs until a frame with a zero size.
//!
//! Catalog segments are expected to be raw in the archives this tool
//! targets; a compressed catalog is rejected as unsupported. Data segments
//! are mixed freely, with compressed payloads handed to the QIC-122
//! decoder appending into the same buffer.

use crate::layout::{SegmentFrame, SEGMENT_FRAME_SIZE};
use oxitape_core::bytes::ByteView;
use oxitape_core::error::{OxiTapeError, Result};

/// Read the catalog region: `dir_size` payload bytes starting at `start`,
/// appended to `out`.
pub fn read_catalog_region(
    view: &ByteView<'_>,
    start: usize,
    dir_size: usize,
    out: &mut Vec<u8>,
) -> Result<()> {
    let mut offset = start;
    let mut remaining = dir_size;

    while remaining > 0 {
        let frame = SegmentFrame::parse(view, offset)?;
        offset += SEGMENT_FRAME_SIZE;

        if !frame.is_raw {
            return Err(OxiTapeError::unsupported("compressed catalog segments"));
        }

        let data = view.get(offset, frame.size)?;
        out.extend_from_slice(data);

        offset += frame.size;
        remaining = remaining.saturating_sub(frame.size);
    }

    Ok(())
}

/// Read the data region starting at `start` until a zero-size frame,
/// appending raw or decompressed payload bytes to `out`.
///
/// A failure mid-region leaves the bytes assembled so far in `out`; the
/// restore driver reports the failure and salvages what it can from the
/// partial region.
pub fn read_data_region(view: &ByteView<'_>, start: usize, out: &mut Vec<u8>) -> Result<()> {
    let mut offset = start;

    loop {
        let frame = SegmentFrame::parse(view, offset)?;
        if frame.size == 0 {
            return Ok(());
        }
        offset += SEGMENT_FRAME_SIZE;

        let data = view.get(offset, frame.size)?;
        if frame.is_raw {
            out.extend_from_slice(data);
        } else {
            oxitape_qic122::decompress(data, out)?;
        }

        offset += frame.size;
    }
}
