use crate::lifecycle::Phase;
use core_admission::Rejection;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A failed document operation, reported to the user. The document is left
/// in its pre-operation state and no notification fires.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("Could not open {} for reading: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DocumentError {
    pub fn path(&self) -> &Path {
        match self {
            DocumentError::Rejected(r) => r.path(),
            DocumentError::Read { path, .. } | DocumentError::Write { path, .. } => path,
        }
    }
}

/// Misuse of the lifecycle protocol by the caller. Never changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("another document operation is in progress ({0})")]
    Busy(Phase),
    #[error("no {expected} is pending ({actual})")]
    NotAwaiting {
        expected: &'static str,
        actual: Phase,
    },
}
