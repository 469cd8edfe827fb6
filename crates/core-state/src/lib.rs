//! Document state: the single open document's persistence metadata.
//!
//! `Document` knows *where* the text lives and *whether* it diverged from the
//! last load/save. The text itself stays in the `TextSurface` owned by the
//! lifecycle; keeping the two apart lets the lifecycle be the only writer of
//! the `modified` flag.
//!
//! Invariants:
//! - `path == None` means untitled (never saved or loaded).
//! - `modified` is raised by `mark_modified` (a content-changed notification)
//!   and lowered by `mark_loaded` / `mark_saved` or an explicit close-time
//!   `force_clean`.

use std::path::{Path, PathBuf};
use tracing::trace;

/// Name shown for documents without a path.
pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    path: Option<PathBuf>,
    modified: bool,
}

impl Document {
    /// Fresh untitled, unmodified document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn is_untitled(&self) -> bool {
        self.path.is_none()
    }

    /// File name component of the path, or `"Untitled"`.
    pub fn display_name(&self) -> String {
        match &self.path {
            None => UNTITLED.to_string(),
            Some(p) => p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.to_string_lossy().into_owned()),
        }
    }

    /// Window title: `"notes.txt - App"`, prefixed with `*` while modified.
    pub fn window_title(&self, app: &str) -> String {
        let marker = if self.modified { "*" } else { "" };
        format!("{marker}{} - {app}", self.display_name())
    }

    /// Content-changed notification from the text surface.
    pub fn mark_modified(&mut self) {
        if !self.modified {
            trace!(target: "state", name = self.display_name().as_str(), "document_modified");
        }
        self.modified = true;
    }

    /// Successful load of `path`.
    pub fn mark_loaded(&mut self, path: PathBuf) {
        self.path = Some(path);
        self.modified = false;
    }

    /// Successful save to `path` (which becomes the document's path).
    pub fn mark_saved(&mut self, path: PathBuf) {
        self.path = Some(path);
        self.modified = false;
    }

    /// Close transition: the user accepted losing (or already persisted) the edits.
    pub fn force_clean(&mut self) {
        self.modified = false;
    }

    /// Back to untitled/unmodified.
    pub fn reset(&mut self) {
        self.path = None;
        self.modified = false;
    }
}
