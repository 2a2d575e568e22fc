//! Restore driver and the writer seam.
//!
//! The core never touches the filesystem. It produces write and touch
//! requests — final on-disk path, payload slice, timestamps — and hands
//! them to a [`RestoreWriter`], which the CLI implements over `std::fs`.
//! Tests implement it over an in-memory map.
//!
//! Directory timestamps get a dedicated pass after all files are written:
//! touching a file updates its parent directory's mtime, so directories
//! are re-touched deepest-first (ties broken by path, descending) and
//! every ancestor strictly after all of its descendants.

use crate::catalog::{recursive_path, CatalogEntry};
use crate::reconcile::ReconciledFile;
use oxitape_core::bytes::ByteView;
use oxitape_core::error::Result;
use oxitape_core::time::TapeTime;
use std::collections::HashMap;

/// Suffix appended to files whose recovered size disagreed with the
/// catalog.
pub const CORRUPTED_SUFFIX: &str = " [CORRUPTED]";

/// A request to materialize one recovered file.
#[derive(Debug)]
pub struct FileWriteRequest<'a> {
    /// On-disk path, relative to the working directory.
    pub path: String,
    /// Payload bytes to write.
    pub data: &'a [u8],
    /// Modification time to apply.
    pub mtime: TapeTime,
    /// Access time to apply.
    pub atime: TapeTime,
}

/// A request to (re-)create a directory and apply its timestamps.
#[derive(Debug)]
pub struct DirTouchRequest {
    /// On-disk path, relative to the working directory.
    pub path: String,
    /// Modification time to apply.
    pub mtime: TapeTime,
    /// Access time to apply.
    pub atime: TapeTime,
}

/// The filesystem collaborator: creates parent directories, writes bytes,
/// applies timestamps.
pub trait RestoreWriter {
    /// Write one file with its timestamps.
    fn write_file(&mut self, request: &FileWriteRequest<'_>) -> Result<()>;
    /// Ensure a directory exists and apply its timestamps.
    fn touch_dir(&mut self, request: &DirTouchRequest) -> Result<()>;
}

/// Counters from an extraction pass.
#[derive(Debug, Default)]
pub struct ExtractStats {
    /// Files handed to the writer successfully.
    pub written: usize,
    /// Files that could not be sliced or written.
    pub failed: usize,
    /// Total payload bytes written.
    pub bytes: usize,
}

/// On-disk path for a reconciled file, with the corruption marker applied.
pub fn output_path(file: &ReconciledFile) -> String {
    if file.may_be_corrupted {
        format!(".{}{}", file.path, CORRUPTED_SUFFIX)
    } else {
        format!(".{}", file.path)
    }
}

/// Write every reconciled file through the writer.
pub fn extract_files<W: RestoreWriter>(
    data: &ByteView<'_>,
    files: &[ReconciledFile],
    writer: &mut W,
) -> ExtractStats {
    let mut stats = ExtractStats::default();

    for file in files {
        let Ok(payload) = data.get(file.offset, file.size) else {
            stats.failed += 1;
            continue;
        };

        let request = FileWriteRequest {
            path: output_path(file),
            data: payload,
            mtime: file.mtime,
            atime: file.atime,
        };

        match writer.write_file(&request) {
            Ok(()) => {
                stats.written += 1;
                stats.bytes += payload.len();
            }
            Err(_) => stats.failed += 1,
        }
    }

    stats
}

/// Directory touch requests in application order: deepest paths first,
/// ties broken by path descending, so an ancestor is always touched
/// strictly after every directory beneath it.
pub fn dir_touch_order(entries: &[CatalogEntry]) -> Vec<DirTouchRequest> {
    let mut by_path: HashMap<String, &CatalogEntry> = HashMap::new();
    let mut paths: Vec<String> = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_dir {
            continue;
        }
        let path = recursive_path(entries, index);
        if by_path.insert(path.clone(), entry).is_none() {
            paths.push(path);
        }
    }

    paths.sort_by(|a, b| {
        let depth_a = a.matches('/').count();
        let depth_b = b.matches('/').count();
        depth_b.cmp(&depth_a).then_with(|| b.cmp(a))
    });

    paths
        .into_iter()
        .map(|path| {
            let entry = by_path[&path];
            DirTouchRequest {
                path: format!(".{}", path),
                mtime: entry.mtime,
                atime: entry.atime,
            }
        })
        .collect()
}

/// Re-apply directory timestamps through the writer, returning how many
/// directories could not be touched.
pub fn update_dir_times<W: RestoreWriter>(entries: &[CatalogEntry], writer: &mut W) -> usize {
    let mut failed = 0;
    for request in dir_touch_order(entries) {
        if writer.touch_dir(&request).is_err() {
            failed += 1;
        }
    }
    failed
}
