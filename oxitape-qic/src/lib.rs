//! # OxiTape QIC
//!
//! Container support for QIC tape images written by Microsoft Backup for
//! Windows 9x/ME.
//!
//! ## Format Overview
//!
//! A tape image consists of:
//! - VTBL: 128-byte volume table header at offset 0
//! - MDID: vendor metadata block in the following 128 bytes
//! - Data region at offset 0x100: per-file records in raw or compressed
//!   segments, each record marked by `DAT_SIG`/`EDAT_SIG` signatures
//! - Catalog region at the segment-aligned tail: the directory tree as a
//!   flat, flag-delimited listing
//!
//! The restore pipeline reassembles both regions from their segment
//! framing, rebuilds the directory tree, locates file payloads by
//! signature scanning, reconciles the two views of the file set, and
//! hands write requests to a filesystem collaborator.
//!
//! ```no_run
//! use oxitape_core::{DateMode, MmapView};
//! use oxitape_qic::QicArchive;
//!
//! let mapped = MmapView::open("backup.qic")?;
//! let archive = QicArchive::open(mapped.view())?;
//! let catalog = archive.read_catalog()?;
//! let entries = QicArchive::parse_catalog(&catalog, DateMode::Archive)?;
//! # Ok::<(), oxitape_core::OxiTapeError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod catalog;
pub mod layout;
pub mod mdid;
pub mod reconcile;
pub mod recover;
pub mod restore;
pub mod segment;

// Re-exports for convenience
pub use archive::QicArchive;
pub use catalog::{read_entries, reconstruct_tree, CatalogEntry};
pub use layout::{VolumeHeader, DAT_SIG, EDAT_SIG, RAW_SEG, SEG_SZ};
pub use mdid::VendorMetadata;
pub use reconcile::{reconcile, ReconcileReport, ReconciledFile};
pub use recover::{recover_files, RecoveredFile};
pub use restore::{
    extract_files, update_dir_times, DirTouchRequest, ExtractStats, FileWriteRequest,
    RestoreWriter,
};
