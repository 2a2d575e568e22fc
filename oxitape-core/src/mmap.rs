//! Memory-mapped archive access.
//!
//! A QIC tape image is consumed as one random-access byte range: the catalog
//! lives at the tail, the data region in the middle, and both are walked by
//! offset. Mapping the file keeps that access pattern cheap and lets every
//! parser borrow slices directly from the page cache.
//!
//! The mapping is read-only and must outlive every [`ByteView`] derived from
//! it; the CLI holds the [`MmapView`] for the whole run and drops it after
//! extraction completes.

use crate::bytes::ByteView;
use crate::error::Result;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// A read-only memory-mapped file.
#[derive(Debug)]
pub struct MmapView {
    mmap: Mmap,
}

impl MmapView {
    /// Open a file and map it read-only.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::OxiTapeError::Io`] if the file cannot be
    /// opened or mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_file(&file)
    }

    /// Map an already-open file.
    ///
    /// The caller must ensure the file is not modified while mapped.
    pub fn from_file(file: &File) -> Result<Self> {
        // SAFETY: read-only mapping; the caller keeps the file stable.
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self { mmap })
    }

    /// Total length of the mapped file.
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Check if the mapped file is empty.
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// The mapped contents as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// A [`ByteView`] over the whole mapping.
    pub fn view(&self) -> ByteView<'_> {
        ByteView::new(&self.mmap)
    }
}
