//! On-disk layouts of the QIC/MS Backup tape image.
//!
//! All fixed records are little-endian and packed. They are extracted
//! field by field through a [`ByteView`] rather than by reinterpreting
//! memory; the offsets below are the record layout.
//!
//! Region placement within the image:
//!
//! - volume header ("VTBL") at offset 0, 128 bytes;
//! - vendor metadata ("MDID") immediately after, sharing the next 128-byte
//!   block;
//! - data region at offset 0x100;
//! - catalog region at `file_size - ceil(dir_size / SEG_SZ) * SEG_SZ`,
//!   i.e. aligned to the segment granularity at the tail of the image.

use oxitape_core::bytes::ByteView;
use oxitape_core::error::{OxiTapeError, Result};

/// Volume table tag.
pub const VTBL_TAG: &[u8; 4] = b"VTBL";
/// Vendor metadata tag.
pub const MDID_TAG: &[u8; 4] = b"MDID";

/// Size of the volume header block in bytes.
pub const VTBL_SIZE: usize = 128;
/// Offset of the vendor metadata block.
pub const MDID_OFFSET: usize = VTBL_SIZE;
/// Offset of the data region.
pub const DATA_REGION_OFFSET: usize = 0x100;

/// Segment-alignment granularity; MS Backup sizes the data and catalog
/// regions in multiples of this.
pub const SEG_SZ: usize = 29696;

/// High bit of the frame size field: set for a raw segment, clear for a
/// compressed one.
pub const RAW_SEG: u16 = 0x8000;

/// Signature at the start of each data-region record.
pub const DAT_SIG: u32 = 0x33CC33CC;
/// Signature between a data record's header and its payload.
pub const EDAT_SIG: u32 = 0x66996699;

/// Directory entry flag: the entry is a directory, not a file.
pub const FLAG_SUBDIR: u8 = 0x01;
/// Directory entry flag: the directory has no children.
pub const FLAG_EMPTYDIR: u8 = 0x02;
/// Directory entry flag: last entry of its sibling group.
pub const FLAG_DIRLAST: u8 = 0x08;
/// Directory entry flag: last entry of the entire catalog.
pub const FLAG_DIREND: u8 = 0x30;

/// The 128-byte volume table header at offset 0.
#[derive(Debug, Clone)]
pub struct VolumeHeader {
    /// Number of logical segments.
    pub nseg: u32,
    /// Volume description, as stored (44 bytes).
    pub desc: [u8; 44],
    /// Creation time, seconds since 1970-01-01.
    pub date: u32,
    /// Flag bitmap.
    pub flag: u8,
    /// Multi-cartridge sequence number.
    pub seq: u8,
    /// Format revision.
    pub rev_major: u16,
    /// Format revision.
    pub rev_minor: u16,
    /// First and last physical QFA block numbers.
    pub start: u32,
    /// Last physical QFA block number.
    pub end: u32,
    /// Password field; a zero first byte means unprotected.
    pub passwd: [u8; 8],
    /// Size of the catalog region in bytes (uncompressed).
    pub dir_size: u32,
    /// Total size of the data region in bytes.
    pub data_size: u64,
    /// Source OS major/minor version.
    pub os_ver: [u8; 2],
    /// Label of the drive the file set came from.
    pub source_drive_label: [u8; 16],
    /// Logical device the file set originated from.
    pub ldev: u8,
    /// Compression bitmap, zero when unused.
    pub comp: u8,
    /// Source OS type.
    pub os_type: u8,
}

impl VolumeHeader {
    /// Parse the header at offset 0 of `view`, validating the tag.
    pub fn parse(view: &ByteView<'_>) -> Result<Self> {
        let tag = view.get(0, 4)?;
        if tag != VTBL_TAG {
            return Err(OxiTapeError::invalid_header(format!(
                "bad volume tag {:02X?}, expected \"VTBL\"",
                tag
            )));
        }

        let mut desc = [0u8; 44];
        desc.copy_from_slice(view.get(8, 44)?);
        let mut passwd = [0u8; 8];
        passwd.copy_from_slice(view.get(84, 8)?);
        let mut os_ver = [0u8; 2];
        os_ver.copy_from_slice(view.get(104, 2)?);
        let mut source_drive_label = [0u8; 16];
        source_drive_label.copy_from_slice(view.get(106, 16)?);

        Ok(Self {
            nseg: view.read_u32_le(4)?,
            desc,
            date: view.read_u32_le(52)?,
            flag: view.read_u8(56)?,
            seq: view.read_u8(57)?,
            rev_major: view.read_u16_le(58)?,
            rev_minor: view.read_u16_le(60)?,
            start: view.read_u32_le(76)?,
            end: view.read_u32_le(80)?,
            passwd,
            dir_size: view.read_u32_le(92)?,
            data_size: view.read_u64_le(96)?,
            os_ver,
            source_drive_label,
            ldev: view.read_u8(122)?,
            comp: view.read_u8(124)?,
            os_type: view.read_u8(125)?,
        })
    }

    /// Whether the archive is password-protected.
    pub fn is_password_protected(&self) -> bool {
        self.passwd[0] != 0
    }

    /// Volume description as text, trimmed at the first NUL.
    pub fn description(&self) -> String {
        let end = self.desc.iter().position(|&b| b == 0).unwrap_or(44);
        String::from_utf8_lossy(&self.desc[..end]).into_owned()
    }

    /// Start offset of the catalog region, given the total image size.
    pub fn catalog_offset(&self, file_size: usize) -> usize {
        let mut segments = self.dir_size as usize / SEG_SZ;
        if self.dir_size as usize % SEG_SZ != 0 {
            segments += 1;
        }
        file_size.saturating_sub(segments * SEG_SZ)
    }
}

/// The per-segment framing: an advisory running total followed by the
/// physical size/raw-flag word.
#[derive(Debug, Clone, Copy)]
pub struct SegmentFrame {
    /// Cumulative uncompressed bytes at the end of this segment (advisory).
    pub cumulative_size: u64,
    /// Physical payload bytes, with [`RAW_SEG`] already masked off.
    pub size: usize,
    /// Whether the payload is raw rather than compressed.
    pub is_raw: bool,
}

/// Total bytes of framing in front of each segment payload.
pub const SEGMENT_FRAME_SIZE: usize = 8 + 2;

impl SegmentFrame {
    /// Parse the framing at `offset`.
    pub fn parse(view: &ByteView<'_>, offset: usize) -> Result<Self> {
        let cumulative_size = view.read_u64_le(offset)?;
        let raw_size = view.read_u16_le(offset + 8)?;

        Ok(Self {
            cumulative_size,
            size: (raw_size & !RAW_SEG) as usize,
            is_raw: raw_size & RAW_SEG != 0,
        })
    }
}

/// The first fixed part of a catalog record. Offsets of the fields this
/// restorer does not interpret are kept in the table below for reference:
///
/// ```text
/// 0   rec_len      u16      41  attrib       u8
/// 2   ndx[2]       u32 x2   45  c_datetime   u32
/// 10  path_len     u16      53  a_datetime   u32
/// 14  flag         u8       61  m_datetime   u32
/// 17  file_len     u32      69  nm_len       u16
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DirFixed {
    /// Record length; only meaningful in the catalog region.
    pub rec_len: u16,
    /// Length in bytes of the UTF-16 path stored with data-region records.
    pub path_len: u16,
    /// Entry flag bitmap (`FLAG_*`).
    pub flag: u8,
    /// File length in bytes.
    pub file_len: u32,
    /// DOS attribute byte.
    pub attrib: u8,
    /// Creation time, seconds since 1970.
    pub c_datetime: u32,
    /// Access time, seconds since 1970.
    pub a_datetime: u32,
    /// Modification time, seconds since 1970.
    pub m_datetime: u32,
    /// Byte length of the long name that follows this record.
    pub nm_len: u16,
}

/// Size of [`DirFixed`] on disk.
pub const DIR_FIXED_SIZE: usize = 71;

impl DirFixed {
    /// Parse the fixed part at `offset`.
    pub fn parse(view: &ByteView<'_>, offset: usize) -> Result<Self> {
        // One up-front bounds check for the whole record.
        view.get(offset, DIR_FIXED_SIZE)?;

        Ok(Self {
            rec_len: view.read_u16_le(offset)?,
            path_len: view.read_u16_le(offset + 10)?,
            flag: view.read_u8(offset + 14)?,
            file_len: view.read_u32_le(offset + 17)?,
            attrib: view.read_u8(offset + 41)?,
            c_datetime: view.read_u32_le(offset + 45)?,
            a_datetime: view.read_u32_le(offset + 53)?,
            m_datetime: view.read_u32_le(offset + 61)?,
            nm_len: view.read_u16_le(offset + 69)?,
        })
    }
}

/// The second fixed part of a catalog record, between the long and short
/// names: 13 undeciphered bytes, two words, and the short-name length.
#[derive(Debug, Clone, Copy)]
pub struct DirFixed2 {
    /// Byte length of the short (DOS) name that follows; zero means the
    /// long name doubles as the short name.
    pub nm_len: u16,
}

/// Size of [`DirFixed2`] on disk.
pub const DIR_FIXED2_SIZE: usize = 23;

impl DirFixed2 {
    /// Parse the second fixed part at `offset`.
    pub fn parse(view: &ByteView<'_>, offset: usize) -> Result<Self> {
        view.get(offset, DIR_FIXED2_SIZE)?;

        Ok(Self {
            nm_len: view.read_u16_le(offset + 21)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header_bytes() -> Vec<u8> {
        let mut bytes = vec![0u8; VTBL_SIZE];
        bytes[0..4].copy_from_slice(b"VTBL");
        bytes[4..8].copy_from_slice(&7u32.to_le_bytes()); // nseg
        bytes[8..19].copy_from_slice(b"Full backup");
        bytes[52..56].copy_from_slice(&904_608_000u32.to_le_bytes()); // date
        bytes[92..96].copy_from_slice(&60_000u32.to_le_bytes()); // dir_size
        bytes[96..104].copy_from_slice(&1_000_000u64.to_le_bytes()); // data_size
        bytes[104] = 4; // os major
        bytes[105] = 10; // os minor
        bytes
    }

    #[test]
    fn test_parse_volume_header() {
        let bytes = sample_header_bytes();
        let view = ByteView::new(&bytes);

        let header = VolumeHeader::parse(&view).unwrap();
        assert_eq!(header.nseg, 7);
        assert_eq!(header.description(), "Full backup");
        assert_eq!(header.date, 904_608_000);
        assert_eq!(header.dir_size, 60_000);
        assert_eq!(header.data_size, 1_000_000);
        assert_eq!(header.os_ver, [4, 10]);
        assert!(!header.is_password_protected());
    }

    #[test]
    fn test_bad_tag_rejected() {
        let mut bytes = sample_header_bytes();
        bytes[0..4].copy_from_slice(b"XTBL");
        let view = ByteView::new(&bytes);

        assert!(matches!(
            VolumeHeader::parse(&view),
            Err(OxiTapeError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_truncated_header_rejected() {
        let bytes = sample_header_bytes();
        let view = ByteView::new(&bytes[..100]);
        assert!(VolumeHeader::parse(&view).is_err());
    }

    #[test]
    fn test_password_flag() {
        let mut bytes = sample_header_bytes();
        bytes[84] = b's';
        let view = ByteView::new(&bytes);

        let header = VolumeHeader::parse(&view).unwrap();
        assert!(header.is_password_protected());
    }

    #[test]
    fn test_catalog_offset_rounds_up_to_segment() {
        let mut bytes = sample_header_bytes();
        // dir_size just over two segments
        bytes[92..96].copy_from_slice(&((2 * SEG_SZ + 1) as u32).to_le_bytes());
        let view = ByteView::new(&bytes);
        let header = VolumeHeader::parse(&view).unwrap();

        let file_size = 50 * SEG_SZ;
        assert_eq!(header.catalog_offset(file_size), file_size - 3 * SEG_SZ);
    }

    #[test]
    fn test_segment_frame() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&123_456u64.to_le_bytes());
        bytes.extend_from_slice(&(0x8000u16 | 512).to_le_bytes());
        let view = ByteView::new(&bytes);

        let frame = SegmentFrame::parse(&view, 0).unwrap();
        assert_eq!(frame.cumulative_size, 123_456);
        assert_eq!(frame.size, 512);
        assert!(frame.is_raw);
    }

    #[test]
    fn test_segment_frame_compressed() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&0x5000u16.to_le_bytes());
        let view = ByteView::new(&bytes);

        let frame = SegmentFrame::parse(&view, 0).unwrap();
        assert_eq!(frame.size, 0x5000);
        assert!(!frame.is_raw);
    }

    #[test]
    fn test_dir_fixed_field_offsets() {
        let mut bytes = vec![0u8; DIR_FIXED_SIZE];
        bytes[0..2].copy_from_slice(&99u16.to_le_bytes());
        bytes[10..12].copy_from_slice(&24u16.to_le_bytes());
        bytes[14] = FLAG_SUBDIR | FLAG_DIRLAST;
        bytes[17..21].copy_from_slice(&4096u32.to_le_bytes());
        bytes[41] = 0x20;
        bytes[45..49].copy_from_slice(&111u32.to_le_bytes());
        bytes[53..57].copy_from_slice(&222u32.to_le_bytes());
        bytes[61..65].copy_from_slice(&333u32.to_le_bytes());
        bytes[69..71].copy_from_slice(&12u16.to_le_bytes());
        let view = ByteView::new(&bytes);

        let fixed = DirFixed::parse(&view, 0).unwrap();
        assert_eq!(fixed.rec_len, 99);
        assert_eq!(fixed.path_len, 24);
        assert_eq!(fixed.flag, FLAG_SUBDIR | FLAG_DIRLAST);
        assert_eq!(fixed.file_len, 4096);
        assert_eq!(fixed.attrib, 0x20);
        assert_eq!(fixed.c_datetime, 111);
        assert_eq!(fixed.a_datetime, 222);
        assert_eq!(fixed.m_datetime, 333);
        assert_eq!(fixed.nm_len, 12);
    }

    #[test]
    fn test_dir_fixed2() {
        let mut bytes = vec![0u8; DIR_FIXED2_SIZE];
        bytes[21..23].copy_from_slice(&16u16.to_le_bytes());
        let view = ByteView::new(&bytes);

        let fixed2 = DirFixed2::parse(&view, 0).unwrap();
        assert_eq!(fixed2.nm_len, 16);
    }
}
