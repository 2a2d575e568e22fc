//! Directory catalog parsing and tree reconstruction.
//!
//! The catalog serializes the backed-up tree as a flat DFS listing with no
//! parent pointers and no depth counters. Nesting is implied by two flag
//! bits per entry: `DIRLAST` closes the current sibling group, and every
//! non-empty directory entry announces that one of the upcoming sibling
//! groups belongs to it. Groups are attached to their pending parents in
//! FIFO order within a level, while deeper levels complete before
//! shallower ones resume.

use crate::layout::{
    DirFixed, DirFixed2, DIR_FIXED2_SIZE, DIR_FIXED_SIZE, FLAG_DIREND, FLAG_DIRLAST,
    FLAG_EMPTYDIR, FLAG_SUBDIR,
};
use oxitape_core::bytes::ByteView;
use oxitape_core::error::Result;
use oxitape_core::text::utf16le_to_utf8;
use oxitape_core::time::{decode_timestamp, DateMode, TapeTime};
use std::collections::VecDeque;

/// One parsed catalog entry.
///
/// Entries are immutable after parsing except for `parent`, which the tree
/// reconstruction fills in. Parents are arena indices into the entry list,
/// never owning references; the root's parent is `None`.
#[derive(Debug, Clone, Default)]
pub struct CatalogEntry {
    /// Long (Windows) name, UTF-8.
    pub long_name: String,
    /// Short (DOS 8.3) name, UTF-8.
    pub short_name: String,
    /// Path embedded in the data region record; only populated by the
    /// recoverer, the catalog itself stores no paths.
    pub qic_path: String,
    /// Entry is a directory.
    pub is_dir: bool,
    /// Entry is a directory with no children.
    pub is_empty_dir: bool,
    /// Entry closes its sibling group.
    pub is_last_entry: bool,
    /// Entry closes the whole catalog.
    pub is_dir_end: bool,
    /// Index of the parent entry, filled by [`reconstruct_tree`].
    pub parent: Option<usize>,
    /// Offset of the record within the catalog buffer.
    pub record_offset: usize,
    /// Total bytes the record occupied.
    pub record_len: usize,
    /// Length in bytes of the path field of the matching data record.
    pub path_len: usize,
    /// File size in bytes from the catalog.
    pub file_size: usize,
    /// DOS attribute byte.
    pub attrib: u8,
    /// Creation time.
    pub ctime: TapeTime,
    /// Access time.
    pub atime: TapeTime,
    /// Modification time.
    pub mtime: TapeTime,
}

impl CatalogEntry {
    /// Native path of a data-region entry: `/` + embedded directory path
    /// (any leftover separator control characters mapped to `/`) + `/` +
    /// long name.
    pub fn native_path(&self) -> String {
        format!("/{}/{}", self.qic_path.replace('\n', "/"), self.long_name)
    }
}

/// Parse one catalog record at `*offset`, advancing the cursor past it.
pub fn read_entry(
    view: &ByteView<'_>,
    offset: &mut usize,
    mode: DateMode,
) -> Result<CatalogEntry> {
    let record_offset = *offset;

    let fixed = DirFixed::parse(view, *offset)?;
    *offset += DIR_FIXED_SIZE;

    let mut long_name = String::new();
    if fixed.nm_len > 0 {
        let bytes = view.get(*offset, fixed.nm_len as usize)?;
        long_name = utf16le_to_utf8(bytes);
        *offset += fixed.nm_len as usize;
    }

    let fixed2 = DirFixed2::parse(view, *offset)?;
    *offset += DIR_FIXED2_SIZE;

    // A zero short-name length means the long name serves as both.
    let dos_len = if fixed2.nm_len == 0 {
        fixed.nm_len
    } else {
        fixed2.nm_len
    };

    let mut short_name = String::new();
    if dos_len > 0 {
        let bytes = view.get(*offset, dos_len as usize)?;
        short_name = utf16le_to_utf8(bytes);
        *offset += dos_len as usize;
    }

    Ok(CatalogEntry {
        long_name,
        short_name,
        qic_path: String::new(),
        is_dir: fixed.flag & FLAG_SUBDIR != 0,
        is_empty_dir: fixed.flag & FLAG_EMPTYDIR != 0,
        is_last_entry: fixed.flag & FLAG_DIRLAST != 0,
        is_dir_end: fixed.flag & FLAG_DIREND != 0,
        parent: None,
        record_offset,
        record_len: *offset - record_offset,
        path_len: fixed.path_len as usize,
        file_size: fixed.file_len as usize,
        attrib: fixed.attrib,
        ctime: decode_timestamp(fixed.c_datetime, mode),
        atime: decode_timestamp(fixed.a_datetime, mode),
        mtime: decode_timestamp(fixed.m_datetime, mode),
    })
}

/// Parse catalog records until one carries the end-of-catalog flag.
pub fn read_entries(view: &ByteView<'_>, mode: DateMode) -> Result<Vec<CatalogEntry>> {
    let mut entries = Vec::new();
    let mut offset = 0;

    loop {
        let entry = read_entry(view, &mut offset, mode)?;
        let done = entry.is_dir_end;
        entries.push(entry);
        if done {
            return Ok(entries);
        }
    }
}

/// Rebuild parent links from the flag-delimited flat listing.
///
/// A stack of deques tracks directories whose children have not yet been
/// seen. The top deque holds the pending parents at the current level;
/// each new sibling group pops its parent from the front (FIFO) and pushes
/// a fresh deque for the directories it will discover. Closing a group
/// whose level has no parents left pops back to the enclosing level.
pub fn reconstruct_tree(entries: &mut [CatalogEntry]) {
    let mut current_parent: Option<usize> = None;

    let mut pending: VecDeque<Option<usize>> = VecDeque::new();
    pending.push_back(None); // the root's parent
    let mut stack: Vec<VecDeque<Option<usize>>> = vec![pending];

    let mut first = true;

    for index in 0..entries.len() {
        if first {
            first = false;
            if let Some(top) = stack.last_mut() {
                current_parent = top.pop_front().flatten();
                if top.is_empty() {
                    stack.pop();
                }
            } else {
                current_parent = None;
            }
            stack.push(VecDeque::new());
        }

        entries[index].parent = current_parent;

        let has_children = entries[index].is_dir && !entries[index].is_empty_dir;
        if has_children {
            if let Some(top) = stack.last_mut() {
                top.push_back(Some(index));
            }
        }

        if entries[index].is_last_entry {
            first = true;
            if stack.last().is_some_and(VecDeque::is_empty) {
                stack.pop();
            }
        }
    }
}

/// The `/`-joined path of an entry, built by walking parent links back to
/// the root. Every component is prefixed with `/`, including the root's
/// (usually empty) name.
pub fn recursive_path(entries: &[CatalogEntry], index: usize) -> String {
    let mut names = Vec::new();
    let mut current = Some(index);
    while let Some(i) = current {
        names.push(entries[i].long_name.as_str());
        current = entries[i].parent;
    }

    let mut path = String::new();
    for name in names.iter().rev() {
        path.push('/');
        path.push_str(name);
    }
    path
}
