use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::WrapError;

/// Persists rewritten sources.
///
/// Writes go to a temporary file in the target's directory which is then
/// renamed over the target, so a reader never observes a half-written file.
/// In dry-run mode nothing touches the disk.
#[derive(Debug, Clone, Copy)]
pub struct Writer {
    dry_run: bool,
}

impl Writer {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns true if the file was written.
    pub fn write(&self, path: &Path, contents: &str) -> Result<bool, WrapError> {
        if self.dry_run {
            debug!(path = %path.display(), "dry run, skipping write");
            return Ok(false);
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| WrapError::write(path, e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| WrapError::write(path, e))?;

        if let Ok(metadata) = fs::metadata(path) {
            tmp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(|e| WrapError::write(path, e))?;
        }

        tmp.persist(path)
            .map_err(|e| WrapError::write(path, e.error))?;
        Ok(true)
    }
}
