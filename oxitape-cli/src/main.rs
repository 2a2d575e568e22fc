//! OxiTape CLI - restore QIC/MS Backup tape images.
//!
//! Restores the file hierarchy of a Windows 9x/ME Microsoft Backup tape
//! image into the current working directory, reconciling the directory
//! catalog against what can be carved out of the data region.

mod writer;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use oxitape_core::bytes::ByteView;
use oxitape_core::mmap::MmapView;
use oxitape_core::time::DateMode;
use oxitape_qic::catalog::recursive_path;
use oxitape_qic::{extract_files, reconcile, recover_files, update_dir_times, QicArchive};
use std::path::PathBuf;
use std::process;
use writer::FsWriter;

/// Exit code: the image could not be opened or mapped.
const EXIT_OPEN: i32 = 2;
/// Exit code: the volume header is missing or invalid.
const EXIT_HEADER: i32 = 3;
/// Exit code: the vendor metadata block is missing or invalid.
const EXIT_VENDOR: i32 = 4;
/// Exit code: the catalog region could not be read.
const EXIT_CATALOG_READ: i32 = 5;
/// Exit code: the catalog entries could not be parsed.
const EXIT_CATALOG_PARSE: i32 = 6;

#[derive(Parser)]
#[command(name = "oxitape")]
#[command(
    author,
    version,
    about = "Restore QIC tape images written by Microsoft Backup for Windows 9x/ME"
)]
#[command(long_about = "
Restores the full file hierarchy of a QIC tape image into the current
working directory. File payloads are located by signature-scanning the
data region and cross-checked against the directory catalog; files whose
sizes disagree are restored with a ' [CORRUPTED]' suffix.

Examples:
  oxitape backup.qic
  oxitape --corrected-dates backup.qic
")]
struct Cli {
    /// Path to the QIC tape image
    archive: PathBuf,

    /// Decode timestamps with the real Gregorian calendar instead of the
    /// rules historical tooling applied to these archives
    #[arg(long)]
    corrected_dates: bool,
}

fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is valid")
            .progress_chars("█▓▒░ "),
    );
    pb
}

fn main() {
    let cli = Cli::parse();
    let mode = if cli.corrected_dates {
        DateMode::Corrected
    } else {
        DateMode::Archive
    };

    let mapped = match MmapView::open(&cli.archive) {
        Ok(mapped) => mapped,
        Err(err) => {
            eprintln!("oxitape: cannot open {}: {}", cli.archive.display(), err);
            process::exit(EXIT_OPEN);
        }
    };
    let view = mapped.view();

    let archive = match QicArchive::open(view) {
        Ok(archive) => archive,
        Err(err) => {
            eprintln!("oxitape: bad volume header: {}", err);
            process::exit(EXIT_HEADER);
        }
    };

    let header = archive.header();
    eprintln!(
        "Volume \"{}\", OS {}.{}, dir {} bytes, data {} bytes",
        header.description(),
        header.os_ver[0],
        header.os_ver[1],
        header.dir_size,
        header.data_size
    );

    let vendor = match archive.vendor_metadata() {
        Ok(vendor) => vendor,
        Err(err) => {
            eprintln!("oxitape: bad vendor metadata: {}", err);
            process::exit(EXIT_VENDOR);
        }
    };
    if let Some(medium) = vendor.get("MediumID") {
        eprintln!("Medium ID: {}", medium);
    }

    let catalog_buffer = match archive.read_catalog() {
        Ok(buffer) => buffer,
        Err(err) => {
            eprintln!("oxitape: cannot read catalog region: {}", err);
            process::exit(EXIT_CATALOG_READ);
        }
    };

    let entries = match QicArchive::parse_catalog(&catalog_buffer, mode) {
        Ok(entries) => entries,
        Err(err) => {
            eprintln!("oxitape: cannot parse catalog: {}", err);
            process::exit(EXIT_CATALOG_PARSE);
        }
    };

    let mut file_count = 0;
    for index in 0..entries.len() {
        let entry = &entries[index];
        if !entry.is_dir {
            file_count += 1;
        }
        eprintln!(
            "{} {:<20} {}",
            if entry.is_dir { "d" } else { "-" },
            entry.long_name,
            recursive_path(&entries, index)
        );
    }

    // A damaged data region still yields a partial buffer; recover what
    // can be recovered from it.
    let mut data_buffer = Vec::new();
    if let Err(err) = archive.read_data(&mut data_buffer) {
        eprintln!(
            "oxitape: data region incomplete ({}), salvaging {} bytes",
            err,
            data_buffer.len()
        );
    }
    let data_view = ByteView::new(&data_buffer);

    let mut recovered = Vec::new();
    if let Err(err) = recover_files(&data_view, mode, &mut recovered) {
        eprintln!("oxitape: recovery scan aborted: {}", err);
    }
    eprintln!(
        "Found {} recoverable files in {} data bytes",
        recovered.len(),
        data_buffer.len()
    );

    let (accepted, report) = reconcile(&entries, &recovered);
    for warning in &report.warnings {
        eprintln!("oxitape: {}", warning);
    }

    let progress = create_progress_bar(accepted.len() as u64);
    progress.set_message("files");
    let mut fs_writer = FsWriter::new(mode, progress.clone());

    let stats = extract_files(&data_view, &accepted, &mut fs_writer);
    progress.finish_with_message("Done");

    let failed_dirs = update_dir_times(&entries, &mut fs_writer);
    if failed_dirs > 0 {
        eprintln!("oxitape: could not update times for {} directories", failed_dirs);
    }

    eprintln!(
        "Restored {} of {} catalog files ({} bytes, {} recovered, {} warnings, {} write failures)",
        stats.written,
        file_count,
        stats.bytes,
        recovered.len(),
        report.error_count,
        stats.failed
    );
}
