//! UTF-16LE text conversion.
//!
//! Catalog names and the embedded data-region paths are stored as UTF-16LE
//! without terminators; lengths come from the surrounding records.

use encoding_rs::UTF_16LE;

/// Convert UTF-16LE bytes to a UTF-8 string.
///
/// An odd byte length or any decode error yields the empty string; callers
/// treat an empty name the same as an absent one.
pub fn utf16le_to_utf8(bytes: &[u8]) -> String {
    if bytes.len() % 2 != 0 {
        return String::new();
    }

    let (decoded, had_errors) = UTF_16LE.decode_without_bom_handling(bytes);
    if had_errors {
        return String::new();
    }

    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_names() {
        let bytes = [b'V', 0, b'T', 0, b'B', 0, b'L', 0];
        assert_eq!(utf16le_to_utf8(&bytes), "VTBL");
    }

    #[test]
    fn test_non_ascii() {
        // "héllo" in UTF-16LE
        let bytes = [0x68, 0x00, 0xE9, 0x00, 0x6C, 0x00, 0x6C, 0x00, 0x6F, 0x00];
        assert_eq!(utf16le_to_utf8(&bytes), "héllo");
    }

    #[test]
    fn test_odd_length_is_empty() {
        assert_eq!(utf16le_to_utf8(&[b'A', 0, b'B']), "");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(utf16le_to_utf8(&[]), "");
    }

    #[test]
    fn test_unpaired_surrogate_is_empty() {
        // Lone high surrogate 0xD800
        let bytes = [0x00, 0xD8];
        assert_eq!(utf16le_to_utf8(&bytes), "");
    }
}
