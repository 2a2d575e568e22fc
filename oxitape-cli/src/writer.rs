//! Filesystem writer: the I/O collaborator behind the restore driver.

use filetime::FileTime;
use indicatif::ProgressBar;
use oxitape_core::error::Result;
use oxitape_core::time::{DateMode, TapeTime};
use oxitape_qic::restore::{DirTouchRequest, FileWriteRequest, RestoreWriter};
use std::fs;
use std::path::Path;

/// Writes restored files and directories under the current working
/// directory and applies their tape timestamps.
pub struct FsWriter {
    mode: DateMode,
    progress: ProgressBar,
}

impl FsWriter {
    /// Create a writer; `progress` is advanced once per written file.
    pub fn new(mode: DateMode, progress: ProgressBar) -> Self {
        Self { mode, progress }
    }

    fn apply_times(&self, path: &Path, mtime: &TapeTime, atime: &TapeTime) -> Result<()> {
        let mtime = FileTime::from_unix_time(mtime.to_unix_seconds(self.mode), 0);
        let atime = FileTime::from_unix_time(atime.to_unix_seconds(self.mode), 0);
        filetime::set_file_times(path, atime, mtime)?;
        Ok(())
    }
}

impl RestoreWriter for FsWriter {
    fn write_file(&mut self, request: &FileWriteRequest<'_>) -> Result<()> {
        let path = Path::new(&request.path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(path, request.data)?;
        self.apply_times(path, &request.mtime, &request.atime)?;
        self.progress.inc(1);
        Ok(())
    }

    fn touch_dir(&mut self, request: &DirTouchRequest) -> Result<()> {
        let path = Path::new(&request.path);
        fs::create_dir_all(path)?;
        self.apply_times(path, &request.mtime, &request.atime)
    }
}
