//! Reconciliation of recovered files against the directory catalog.
//!
//! The catalog is the authority on what was backed up; the recoverer is
//! the authority on where the bytes are. This module joins the two by
//! path and resolves size disagreements without ever silently discarding
//! the catalog's claim:
//!
//! | recovered size | catalog size | action |
//! |----------------|--------------|--------|
//! | = catalog      | any          | accept |
//! | 0              | > 0          | substitute the catalog size (tail record) |
//! | > 0, ≠ catalog | > 0          | keep the recovered size, flag corruption |
//! | 0              | 0            | accept (empty file) |
//!
//! Every disagreement and every recovered path missing from the catalog
//! is surfaced as a warning and counted; the run continues.

use crate::catalog::{recursive_path, CatalogEntry};
use crate::recover::RecoveredFile;
use std::collections::HashMap;

/// A recovered file with its final size settled against the catalog.
#[derive(Debug, Clone)]
pub struct ReconciledFile {
    /// Native path within the restored tree.
    pub path: String,
    /// Payload offset within the data-region buffer.
    pub offset: usize,
    /// Final byte count to write.
    pub size: usize,
    /// Catalog and recovery disagreed on a non-empty payload.
    pub may_be_corrupted: bool,
    /// Modification time to apply.
    pub mtime: oxitape_core::time::TapeTime,
    /// Access time to apply.
    pub atime: oxitape_core::time::TapeTime,
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Human-readable warnings, one per disagreement.
    pub warnings: Vec<String>,
    /// Number of disagreements (mismatches and unmatched paths).
    pub error_count: usize,
    /// Recovered files that had no catalog entry and were skipped.
    pub skipped: usize,
    /// Sum of the recovered (pre-reconciliation) sizes.
    pub recovered_bytes: usize,
}

/// Map every catalog entry to its recursive path.
pub fn catalog_path_map(entries: &[CatalogEntry]) -> HashMap<String, usize> {
    let mut map = HashMap::with_capacity(entries.len());
    for index in 0..entries.len() {
        map.insert(recursive_path(entries, index), index);
    }
    map
}

/// Settle every recovered file against the catalog.
pub fn reconcile(
    entries: &[CatalogEntry],
    recovered: &[RecoveredFile],
) -> (Vec<ReconciledFile>, ReconcileReport) {
    let by_path = catalog_path_map(entries);

    let mut accepted = Vec::with_capacity(recovered.len());
    let mut report = ReconcileReport::default();

    for file in recovered {
        report.recovered_bytes += file.guessed_size;

        let Some(&entry_index) = by_path.get(&file.path) else {
            report.warnings.push(format!(
                "{}: not present in the directory catalog, skipping",
                file.path
            ));
            report.error_count += 1;
            report.skipped += 1;
            continue;
        };

        let catalog_size = entries[entry_index].file_size;
        let mut final_size = file.guessed_size;
        let mut may_be_corrupted = file.may_be_corrupted;

        if catalog_size != file.guessed_size {
            report.warnings.push(format!(
                "{}: size mismatch, catalog {:#x} recovered {:#x}",
                file.path, catalog_size, file.guessed_size
            ));
            report.error_count += 1;

            if final_size == 0 {
                final_size = catalog_size;
            } else {
                may_be_corrupted = true;
            }
        }

        accepted.push(ReconciledFile {
            path: file.path.clone(),
            offset: file.offset,
            size: final_size,
            may_be_corrupted,
            mtime: file.mtime,
            atime: file.atime,
        });
    }

    (accepted, report)
}
