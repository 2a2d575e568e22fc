//! The QIC-122 token decoder.

use crate::window::HistoryWindow;
use oxitape_core::bitstream::BitReader;
use oxitape_core::error::{OxiTapeError, Result};

/// Decompress one compressed segment payload, appending to `out`.
///
/// The output buffer is shared across segments of a region, so the caller
/// passes it in and the decoder only ever appends. Whatever the history
/// window holds is flushed into `out` even when the stream turns out to be
/// malformed; the region reader decides what to do with a partial region.
pub fn decompress(input: &[u8], out: &mut Vec<u8>) -> Result<()> {
    let mut reader = BitReader::new(input);
    let mut window = HistoryWindow::new();

    let result = decode_stream(&mut reader, &mut window, out);
    window.flush_into(out);

    result.map_err(|err| match err {
        OxiTapeError::TruncatedBitstream { bit_position } => OxiTapeError::malformed(format!(
            "compressed segment ended mid-token at bit {}",
            bit_position
        )),
        other => other,
    })
}

fn decode_stream(
    reader: &mut BitReader<'_>,
    window: &mut HistoryWindow,
    out: &mut Vec<u8>,
) -> Result<()> {
    loop {
        let is_compressed = reader.read_bit()?;

        if is_compressed {
            let offset = read_offset(reader)?;
            if offset == 0 {
                // End-of-stream sentinel.
                return Ok(());
            }

            let length = read_length(reader)?;
            window.copy_back(offset as usize, length as usize, out);
        } else {
            let byte = reader.read_bits(8)? as u8;
            window.push_literal(byte, out);
        }
    }
}

/// One control bit selects the short (7-bit, 1..127) or long (11-bit,
/// 0..2047) offset form. Zero is the end-of-stream sentinel.
fn read_offset(reader: &mut BitReader<'_>) -> Result<u16> {
    let is_short = reader.read_bit()?;
    let offset = if is_short {
        reader.read_bits(7)?
    } else {
        reader.read_bits(11)?
    };
    Ok(offset as u16)
}

/// Two 2-bit groups, then 4-bit groups: each group below its saturation
/// value (3 or 15) finishes the length as `accumulator + group + 2`,
/// otherwise it adds the saturation value and decoding continues.
fn read_length(reader: &mut BitReader<'_>) -> Result<u32> {
    let mut length = 0u32;

    for _ in 0..2 {
        let group = reader.read_bits(2)?;
        if group < 3 {
            return Ok(length + group + 2);
        }
        length += 3;
    }

    loop {
        let group = reader.read_bits(4)?;
        if group < 15 {
            return Ok(length + group + 2);
        }
        length += 15;
    }
}
