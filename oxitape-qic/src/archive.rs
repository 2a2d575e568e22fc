//! Top-level archive access.
//!
//! [`QicArchive`] wraps a byte view of the whole tape image and exposes
//! the restore pipeline as separate steps, because each step fails with
//! its own exit code at the CLI: header, vendor block, catalog read,
//! catalog parse. The data-region read is the one non-fatal step — a
//! damaged region still yields a partial buffer worth salvaging.

use crate::catalog::{self, CatalogEntry};
use crate::layout::{VolumeHeader, DATA_REGION_OFFSET, MDID_OFFSET};
use crate::mdid::{parse_vendor_block, VendorMetadata};
use crate::segment;
use oxitape_core::bytes::ByteView;
use oxitape_core::error::{OxiTapeError, Result};
use oxitape_core::time::DateMode;

/// A QIC tape image, opened over a byte view of the whole file.
#[derive(Debug)]
pub struct QicArchive<'a> {
    view: ByteView<'a>,
    header: VolumeHeader,
}

impl<'a> QicArchive<'a> {
    /// Parse and validate the volume header.
    ///
    /// Password-protected archives are rejected here; nothing else in the
    /// pipeline could do anything useful with one.
    pub fn open(view: ByteView<'a>) -> Result<Self> {
        let header = VolumeHeader::parse(&view)?;

        if header.is_password_protected() {
            return Err(OxiTapeError::unsupported("password-protected archives"));
        }

        Ok(Self { view, header })
    }

    /// The parsed volume header.
    pub fn header(&self) -> &VolumeHeader {
        &self.header
    }

    /// The underlying byte view.
    pub fn view(&self) -> &ByteView<'a> {
        &self.view
    }

    /// Parse the vendor metadata block. An empty block is an error: every
    /// MS Backup image carries at least a medium identifier.
    pub fn vendor_metadata(&self) -> Result<VendorMetadata> {
        let metadata = parse_vendor_block(&self.view, MDID_OFFSET)?;
        if metadata.is_empty() {
            return Err(OxiTapeError::invalid_header(
                "vendor metadata block is missing or empty",
            ));
        }
        Ok(metadata)
    }

    /// Read and reassemble the catalog region into one buffer.
    pub fn read_catalog(&self) -> Result<Vec<u8>> {
        let offset = self.header.catalog_offset(self.view.len());
        let mut buffer = Vec::with_capacity(self.header.dir_size as usize);
        segment::read_catalog_region(
            &self.view,
            offset,
            self.header.dir_size as usize,
            &mut buffer,
        )?;
        Ok(buffer)
    }

    /// Parse the catalog buffer into entries and reconstruct the tree.
    pub fn parse_catalog(buffer: &[u8], mode: DateMode) -> Result<Vec<CatalogEntry>> {
        let view = ByteView::new(buffer);
        let mut entries = catalog::read_entries(&view, mode)?;
        catalog::reconstruct_tree(&mut entries);
        Ok(entries)
    }

    /// Read and decompress the data region into `out`.
    ///
    /// On failure `out` keeps everything assembled before the fault; the
    /// caller logs the error and recovers from the partial buffer.
    pub fn read_data(&self, out: &mut Vec<u8>) -> Result<()> {
        segment::read_data_region(&self.view, DATA_REGION_OFFSET, out)
    }
}
