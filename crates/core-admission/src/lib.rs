//! File admission policy: decides whether a candidate file is treated as
//! editable text.
//!
//! Classification is a denylist over the declared content type. Unknown types
//! are admitted; a rule ending in `/` covers a whole MIME family (`image/`),
//! every other rule matches when it occurs anywhere in the type's essence, so
//! vendor variants such as `application/x-rar-compressed` or
//! `application/vnd.ms-excel.sheet.macroenabled.12` are covered too.
//! Parameters such as `; charset=utf-8` are ignored and comparison is
//! case-insensitive.
//!
//! The policy itself is pure. Querying the file system (`Candidate::from_path`,
//! `AdmissionPolicy::can_open`) may fail; such failures are surfaced as a
//! `Rejection::Metadata` carrying the underlying I/O error.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

mod content_type;
pub use content_type::{
    OCTET_STREAM, SNIFF_LEN, TEXT_PLAIN, classify, detect_content_type, sniff_bytes,
    type_for_extension,
};

/// Content types rejected by default.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "image/",
    "video/",
    "audio/",
    "application/pdf",
    "application/zip",
    "application/x-tar",
    "application/x-rar",
    "application/x-7z-compressed",
    "application/gzip",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/octet-stream",
];

/// File-system kind of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    /// Sockets, FIFOs, device nodes.
    Other,
}

impl FileKind {
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        let ft = meta.file_type();
        if ft.is_file() {
            FileKind::Regular
        } else if ft.is_dir() {
            FileKind::Directory
        } else {
            FileKind::Other
        }
    }
}

/// A file offered for opening: where it is, what it is and what it claims to contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub kind: FileKind,
    pub content_type: String,
}

impl Candidate {
    pub fn new(path: impl Into<PathBuf>, kind: FileKind, content_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            content_type: content_type.into(),
        }
    }

    /// Build a candidate from file-system metadata. Content is only sniffed for
    /// regular files (symlinks are followed).
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        let kind = FileKind::from_metadata(&meta);
        let content_type = match kind {
            FileKind::Regular => detect_content_type(path)?,
            FileKind::Directory => "inode/directory".to_string(),
            FileKind::Other => "inode/special".to_string(),
        };
        Ok(Self::new(path, kind, content_type))
    }
}

/// Why a candidate was refused. `Display` is the user-facing reason.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("Cannot open directories")]
    Directory { path: PathBuf },
    #[error("Cannot open special files")]
    SpecialFile { path: PathBuf },
    #[error("Cannot open binary/media file (type: {content_type})")]
    DeniedContentType { path: PathBuf, content_type: String },
    #[error("Failed to validate file: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Rejection {
    pub fn path(&self) -> &Path {
        match self {
            Rejection::Directory { path }
            | Rejection::SpecialFile { path }
            | Rejection::DeniedContentType { path, .. }
            | Rejection::Metadata { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionPolicy {
    denied: Vec<String>,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl AdmissionPolicy {
    pub fn new() -> Self {
        Self {
            denied: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Append additional denylist rules (same family-prefix/substring semantics as the defaults).
    pub fn with_extra_denied<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for rule in extra {
            let rule = rule.as_ref().trim().to_ascii_lowercase();
            if !rule.is_empty() && !self.denied.contains(&rule) {
                self.denied.push(rule);
            }
        }
        self
    }

    pub fn denied(&self) -> &[String] {
        &self.denied
    }

    pub fn is_denied(&self, content_type: &str) -> bool {
        let essence = essence(content_type);
        self.denied.iter().any(|rule| {
            if rule.ends_with('/') {
                essence.starts_with(rule.as_str())
            } else {
                essence.contains(rule.as_str())
            }
        })
    }

    /// Classify an already-built candidate.
    pub fn evaluate(&self, candidate: &Candidate) -> Result<(), Rejection> {
        let path = candidate.path.clone();
        let verdict = match candidate.kind {
            FileKind::Directory => Err(Rejection::Directory { path }),
            FileKind::Other => Err(Rejection::SpecialFile { path }),
            FileKind::Regular if self.is_denied(&candidate.content_type) => {
                Err(Rejection::DeniedContentType {
                    path,
                    content_type: candidate.content_type.clone(),
                })
            }
            FileKind::Regular => Ok(()),
        };
        if let Err(reason) = &verdict {
            debug!(
                target: "admission",
                path = %candidate.path.display(),
                content_type = candidate.content_type.as_str(),
                %reason,
                "candidate_rejected"
            );
        }
        verdict
    }

    /// Inspect `path` and classify it in one step.
    pub fn can_open(&self, path: &Path) -> Result<Candidate, Rejection> {
        let candidate = Candidate::from_path(path).map_err(|source| Rejection::Metadata {
            path: path.to_path_buf(),
            source,
        })?;
        self.evaluate(&candidate)?;
        Ok(candidate)
    }
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
