#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_actions::{DocumentLifecycle, FsStorage, Outcome, Step, Storage};
use core_admission::{Candidate, FileKind};
use core_events::DocumentEvent;
use core_text::TextBuffer;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// In-memory storage with per-path content types and read-only paths.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: HashMap<PathBuf, String>,
    content_types: HashMap<PathBuf, String>,
    read_only: HashSet<PathBuf>,
    pub writes: Vec<(PathBuf, String)>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.into(), content.to_string());
        self
    }

    pub fn with_typed_file(mut self, path: &str, content_type: &str, content: &str) -> Self {
        self.content_types.insert(path.into(), content_type.to_string());
        self.with_file(path, content)
    }

    pub fn read_only(mut self, path: &str) -> Self {
        self.read_only.insert(path.into());
        self
    }

    pub fn contents(&self, path: &str) -> Option<&str> {
        self.files.get(Path::new(path)).map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn inspect(&mut self, path: &Path) -> io::Result<Candidate> {
        if !self.files.contains_key(path) {
            return Err(io::ErrorKind::NotFound.into());
        }
        let content_type = self
            .content_types
            .get(path)
            .cloned()
            .unwrap_or_else(|| "text/plain".to_string());
        Ok(Candidate::new(path, FileKind::Regular, content_type))
    }

    fn read(&mut self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::ErrorKind::NotFound.into())
    }

    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        if self.read_only.contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        self.files.insert(path.to_path_buf(), contents.to_string());
        self.writes.push((path.to_path_buf(), contents.to_string()));
        Ok(())
    }
}

pub type MemLifecycle = DocumentLifecycle<TextBuffer, MemoryStorage>;
pub type DiskLifecycle = DocumentLifecycle<TextBuffer, FsStorage>;

pub fn mem_lifecycle(storage: MemoryStorage) -> MemLifecycle {
    DocumentLifecycle::new(TextBuffer::new(), storage)
}

pub fn disk_lifecycle() -> DiskLifecycle {
    DocumentLifecycle::new(TextBuffer::new(), FsStorage)
}

/// Subscribe a recorder and return the shared event log.
pub fn record_events<F: Storage>(
    lc: &mut DocumentLifecycle<TextBuffer, F>,
) -> Rc<RefCell<Vec<DocumentEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    lc.subscribe(move |ev: &DocumentEvent| sink.borrow_mut().push(ev.clone()));
    log
}

pub fn type_line<F: Storage>(lc: &mut DocumentLifecycle<TextBuffer, F>, line: &str) {
    lc.edit(|surface| surface.push_line(line));
}

#[track_caller]
pub fn expect_updated(step: Step) -> DocumentEvent {
    match step {
        Step::Done(Outcome::Updated(ev)) => ev,
        other => panic!("expected Updated outcome, got {other:?}"),
    }
}

#[track_caller]
pub fn expect_unchanged(step: Step) {
    assert!(
        matches!(step, Step::Done(Outcome::Unchanged)),
        "expected Unchanged outcome, got {step:?}"
    );
}

#[track_caller]
pub fn expect_close(step: Step) {
    assert!(
        matches!(step, Step::Done(Outcome::CloseApproved)),
        "expected CloseApproved, got {step:?}"
    );
}

#[track_caller]
pub fn expect_failed(step: Step) -> core_actions::DocumentError {
    match step {
        Step::Done(Outcome::Failed(err)) => err,
        other => panic!("expected Failed outcome, got {other:?}"),
    }
}
