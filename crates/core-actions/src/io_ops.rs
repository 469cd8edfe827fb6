//! File IO behind the `Storage` seam.
//!
//! Writes truncate and overwrite in place. There is no temp-file-and-rename
//! step, so a failure part way through a write can leave a truncated file on
//! disk; the in-memory document is never touched by a failed write.

use core_admission::Candidate;
use std::io;
use std::path::Path;

/// Persistent storage used by the document lifecycle.
pub trait Storage {
    /// File-system kind and declared content type of `path`.
    fn inspect(&mut self, path: &Path) -> io::Result<Candidate>;
    /// Entire file as UTF-8 text.
    fn read(&mut self, path: &Path) -> io::Result<String>;
    /// Replace the entire file with `contents`.
    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()>;
}

/// `Storage` over the real file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn inspect(&mut self, path: &Path) -> io::Result<Candidate> {
        Candidate::from_path(path)
    }

    fn read(&mut self, path: &Path) -> io::Result<String> {
        read_text(path)
    }

    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        write_text(path, contents)
    }
}

/// Read a whole file, rejecting content that is not valid UTF-8.
pub fn read_text(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path).inspect_err(|e| {
        tracing::error!(target: "io", ?e, file = %path.display(), "file_read_error");
    })?;
    let size_bytes = bytes.len();
    match String::from_utf8(bytes) {
        Ok(content) => {
            tracing::debug!(target: "io", file = %path.display(), size_bytes, "file_read_ok");
            Ok(content)
        }
        Err(e) => {
            tracing::error!(
                target: "io",
                file = %path.display(),
                valid_up_to = e.utf8_error().valid_up_to(),
                "file_not_utf8"
            );
            Err(io::Error::new(io::ErrorKind::InvalidData, "file is not valid UTF-8 text"))
        }
    }
}

/// Truncate `path` and write `contents` as its entire content.
pub fn write_text(path: &Path, contents: &str) -> io::Result<()> {
    match std::fs::write(path, contents.as_bytes()) {
        Ok(()) => {
            let size_bytes = contents.len();
            tracing::debug!(target: "io", file = %path.display(), size_bytes, "file_write_ok");
            Ok(())
        }
        Err(e) => {
            tracing::error!(target: "io", ?e, file = %path.display(), "file_write_error");
            Err(e)
        }
    }
}
