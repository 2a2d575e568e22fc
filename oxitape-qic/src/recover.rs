//! Data-region file recovery.
//!
//! Data records do not encode their payload length, so files are located
//! by scanning the whole decompressed region for the `DAT_SIG` marker and
//! inferring each payload's extent from the distance to the next marker.
//! A record is:
//!
//! ```text
//! DAT_SIG | catalog-format entry | path (path_len bytes, UTF-16LE)
//!         | EDAT_SIG | u16 discard | payload...
//! ```
//!
//! An occurrence only counts as a file when `EDAT_SIG` sits where the
//! record says it should; anything else is a false positive (payload bytes
//! that happen to contain the marker) or a directory record, both skipped.
//! The last record on the tape has no following marker, so its size stays
//! unknown and the reconciler fills it from the catalog.

use crate::catalog::read_entry;
use crate::layout::{DAT_SIG, EDAT_SIG};
use memchr::memmem;
use oxitape_core::bytes::ByteView;
use oxitape_core::error::{OxiTapeError, Result};
use oxitape_core::text::utf16le_to_utf8;
use oxitape_core::time::{DateMode, TapeTime};

/// A file located in the data region.
#[derive(Debug, Clone)]
pub struct RecoveredFile {
    /// Native path: `/` + embedded directory path + `/` + long name.
    pub path: String,
    /// Payload offset within the data-region buffer.
    pub offset: usize,
    /// Whether a following marker allowed the size to be inferred.
    pub has_guessed_size: bool,
    /// Inferred payload size, zero when unknown.
    pub guessed_size: usize,
    /// Set by the reconciler when catalog and recovery disagree.
    pub may_be_corrupted: bool,
    /// Modification time from the embedded entry.
    pub mtime: TapeTime,
    /// Access time from the embedded entry.
    pub atime: TapeTime,
}

fn check_sig(view: &ByteView<'_>, offset: usize, sig: u32) -> bool {
    matches!(view.read_u32_le(offset), Ok(value) if value == sig)
}

/// Every `DAT_SIG` occurrence in the buffer, overlapping ones included:
/// the marker's byte pattern (`CC 33 CC 33`) matches itself at distance
/// 2, so the search resumes one byte past each hit rather than past the
/// whole match.
fn find_signatures(haystack: &[u8]) -> Vec<usize> {
    let needle = DAT_SIG.to_le_bytes();
    let finder = memmem::Finder::new(&needle);

    let mut occurrences = Vec::new();
    let mut start = 0;
    while let Some(found) = finder.find(&haystack[start..]) {
        occurrences.push(start + found);
        start += found + 1;
    }
    occurrences
}

/// Decode the embedded path, mapping the control characters that encode
/// directory separators to `/`.
fn decode_qic_path(bytes: &[u8]) -> String {
    let mapped: Vec<u8> = bytes
        .chunks_exact(2)
        .flat_map(|pair| {
            let unit = u16::from_le_bytes([pair[0], pair[1]]);
            let unit = if unit < 0x20 { b'/' as u16 } else { unit };
            unit.to_le_bytes()
        })
        .collect();

    utf16le_to_utf8(&mapped)
}

/// Scan the decompressed data region, appending every recoverable file to
/// `recovered` in on-tape order.
///
/// An unreadable record header aborts the scan, but everything recovered
/// before it stays in `recovered`; a partially decompressed region is
/// still worth salvaging.
pub fn recover_files(
    view: &ByteView<'_>,
    mode: DateMode,
    recovered: &mut Vec<RecoveredFile>,
) -> Result<()> {
    let occurrences = find_signatures(view.as_bytes());

    for (index, &sig_offset) in occurrences.iter().enumerate() {
        let mut offset = sig_offset + 4;

        let mut entry = read_entry(view, &mut offset, mode).map_err(|_| {
            OxiTapeError::malformed(format!(
                "unreadable data record header at offset {:#x}",
                sig_offset
            ))
        })?;

        if entry.is_dir {
            continue;
        }

        if !check_sig(view, offset + entry.path_len, EDAT_SIG) {
            // False positive: the marker bytes occurred inside a payload.
            continue;
        }

        if entry.path_len > 0 {
            let Ok(path_bytes) = view.get(offset, entry.path_len) else {
                continue;
            };
            entry.qic_path = decode_qic_path(path_bytes);
            offset += entry.path_len;
        }

        // Skip EDAT_SIG and the word after it.
        offset += 4 + 2;

        let mut file = RecoveredFile {
            path: entry.native_path(),
            offset,
            has_guessed_size: false,
            guessed_size: 0,
            may_be_corrupted: false,
            mtime: entry.mtime,
            atime: entry.atime,
        };

        if index < occurrences.len() - 1 {
            let next_offset = occurrences[index + 1];
            if check_sig(view, next_offset, DAT_SIG) {
                file.guessed_size = next_offset - offset;
                file.has_guessed_size = true;
            }
        }

        recovered.push(file);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DIR_FIXED2_SIZE, DIR_FIXED_SIZE, FLAG_SUBDIR};

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    /// QIC path bytes with `\x01` standing in for the separator control
    /// character.
    fn qic_path_bytes(path: &str) -> Vec<u8> {
        path.chars()
            .map(|c| if c == '/' { '\u{1}' } else { c })
            .collect::<String>()
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect()
    }

    /// Serialize one data-region record.
    fn data_record(name: &str, qic_path: &str, is_dir: bool, payload: &[u8]) -> Vec<u8> {
        let long = utf16(name);
        let path = qic_path_bytes(qic_path);

        let mut bytes = DAT_SIG.to_le_bytes().to_vec();

        let mut fixed = vec![0u8; DIR_FIXED_SIZE];
        fixed[10..12].copy_from_slice(&(path.len() as u16).to_le_bytes());
        if is_dir {
            fixed[14] = FLAG_SUBDIR;
        }
        fixed[17..21].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        fixed[69..71].copy_from_slice(&(long.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&fixed);
        bytes.extend_from_slice(&long);

        let mut fixed2 = vec![0u8; DIR_FIXED2_SIZE];
        fixed2[21..23].copy_from_slice(&(long.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&fixed2);
        bytes.extend_from_slice(&long); // short name

        if !is_dir {
            bytes.extend_from_slice(&path);
            bytes.extend_from_slice(&EDAT_SIG.to_le_bytes());
            bytes.extend_from_slice(&[0u8; 2]);
        }
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_recover_two_files() {
        let mut region = data_record("config.sys", "COMEXE", false, b"device=himem");
        region.extend_from_slice(&data_record("readme.txt", "", false, b"hello"));
        let view = ByteView::new(&region);

        let mut files = Vec::new();
        recover_files(&view, DateMode::Archive, &mut files).unwrap();
        assert_eq!(files.len(), 2);

        assert_eq!(files[0].path, "/COMEXE/config.sys");
        assert!(files[0].has_guessed_size);
        assert_eq!(files[0].guessed_size, b"device=himem".len());
        assert_eq!(
            &region[files[0].offset..files[0].offset + files[0].guessed_size],
            b"device=himem"
        );

        // The tail record has no next marker to measure against.
        assert_eq!(files[1].path, "//readme.txt");
        assert!(!files[1].has_guessed_size);
        assert_eq!(files[1].guessed_size, 0);
    }

    #[test]
    fn test_directory_records_are_skipped() {
        let mut region = data_record("COMEXE", "", true, b"");
        region.extend_from_slice(&data_record("config.sys", "COMEXE", false, b"x"));
        let view = ByteView::new(&region);

        let mut files = Vec::new();
        recover_files(&view, DateMode::Archive, &mut files).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "/COMEXE/config.sys");
    }

    #[test]
    fn test_nested_path_separators_mapped() {
        let region = data_record("deep.txt", "A/B/C", false, b"payload");
        let view = ByteView::new(&region);

        let mut files = Vec::new();
        recover_files(&view, DateMode::Archive, &mut files).unwrap();
        assert_eq!(files[0].path, "/A/B/C/deep.txt");
    }

    #[test]
    fn test_false_positive_signature_skipped() {
        // A payload containing DAT_SIG itself: the scan hits it, finds no
        // EDAT_SIG where the bogus record demands one, and moves on.
        let mut payload = b"AAAA".to_vec();
        payload.extend_from_slice(&DAT_SIG.to_le_bytes());
        payload.extend_from_slice(&[0u8; 128]);

        let mut region = data_record("real.bin", "", false, &payload);
        region.extend_from_slice(&data_record("next.bin", "", false, b"y"));
        let view = ByteView::new(&region);

        let mut files = Vec::new();
        recover_files(&view, DateMode::Archive, &mut files).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["//real.bin", "//next.bin"]);

        // The false positive sits between the two true markers, so the
        // first file's guessed size is measured to the bogus marker, not
        // past it; the reconciler sorts that out against the catalog.
        assert!(files[0].has_guessed_size);
        assert_eq!(files[0].guessed_size, 4);
    }

    #[test]
    fn test_overlapping_signature_run_does_not_hide_records() {
        // The first payload ends with `CC 33`, so together with the next
        // record's real signature the bytes read `CC 33 CC 33 CC 33`: a
        // bogus match starts two bytes before the real one and overlaps
        // it. The scan must surface both.
        let mut region = data_record("a.bin", "", false, b"AB\xCC\x33");
        region.extend_from_slice(&data_record("b.bin", "", false, b"x"));
        let view = ByteView::new(&region);

        let mut files = Vec::new();
        recover_files(&view, DateMode::Archive, &mut files).unwrap();

        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["//a.bin", "//b.bin"]);

        // a.bin's size is measured to the bogus match two bytes into its
        // payload tail, exactly as a byte-by-byte scan sees it; the
        // reconciler settles it against the catalog.
        assert!(files[0].has_guessed_size);
        assert_eq!(files[0].guessed_size, 2);
        assert!(!files[1].has_guessed_size);
    }

    #[test]
    fn test_find_signatures_reports_overlaps() {
        // A period-2 run holds overlapping matches at every even offset.
        let mut haystack = vec![0u8; 3];
        haystack.extend_from_slice(&[0xCC, 0x33, 0xCC, 0x33, 0xCC, 0x33, 0xCC, 0x33]);
        haystack.push(0);

        assert_eq!(find_signatures(&haystack), vec![3, 5, 7]);
        assert_eq!(find_signatures(b""), Vec::<usize>::new());
    }

    #[test]
    fn test_truncated_record_keeps_earlier_files() {
        let mut region = data_record("good.txt", "", false, b"ok");
        // A marker close enough to the end that its record header cannot
        // be read.
        let tail_sig = region.len();
        region.extend_from_slice(&DAT_SIG.to_le_bytes());
        region.extend_from_slice(&[0u8; 8]);
        let view = ByteView::new(&region);

        let mut files = Vec::new();
        let err = recover_files(&view, DateMode::Archive, &mut files).unwrap_err();
        assert!(matches!(err, OxiTapeError::MalformedStream { .. }));
        assert!(err.to_string().contains(&format!("{:#x}", tail_sig)));

        // The file scanned before the fault survives. Its size was
        // measured to the bogus tail marker.
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "//good.txt");
    }

    #[test]
    fn test_empty_region() {
        let view = ByteView::new(b"");
        let mut files = Vec::new();
        recover_files(&view, DateMode::Archive, &mut files).unwrap();
        assert!(files.is_empty());
    }
}
