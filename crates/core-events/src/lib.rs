//! Core event types for NoteThat.
//!
//! Two families live here:
//! * Document notifications (`DocumentEvent`) fanned out to an explicit list of
//!   observers after every successful New / Open / Save / SaveAs.
//! * Shell event-loop messages (`Event`, `InputEvent`) carried over the
//!   bounded channel into the single cooperative loop.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicU64;

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// One bounded mpsc channel carries every event into the shell loop. The blocking input thread uses
// `blocking_send`, parking until space is available rather than dropping input lines.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 256;

pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static INPUT_LINES: AtomicU64 = AtomicU64::new(0);

// -------------------------------------------------------------------------------------------------
// Document notifications
// -------------------------------------------------------------------------------------------------

/// Which successful transition produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEventKind {
    Created,
    Opened,
    Saved,
}

/// Fired after a successful New / Open / Save / SaveAs. `path == None` means untitled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEvent {
    pub kind: DocumentEventKind,
    pub path: Option<PathBuf>,
}

impl DocumentEvent {
    pub fn created() -> Self {
        Self {
            kind: DocumentEventKind::Created,
            path: None,
        }
    }

    pub fn opened(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: DocumentEventKind::Opened,
            path: Some(path.into()),
        }
    }

    pub fn saved(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: DocumentEventKind::Saved,
            path: Some(path.into()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Path as a string; empty for untitled.
    pub fn path_string(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Receiver of document notifications. Closures taking `&DocumentEvent` qualify.
pub trait DocumentObserver {
    fn on_document_event(&mut self, event: &DocumentEvent);
}

impl<F> DocumentObserver for F
where
    F: FnMut(&DocumentEvent),
{
    fn on_document_event(&mut self, event: &DocumentEvent) {
        self(event)
    }
}

/// Handle returned by `ObserverRegistry::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Observers notified in registration order.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(ObserverId, Box<dyn DocumentObserver>)>,
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<O: DocumentObserver + 'static>(&mut self, observer: O) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false when `id` was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn notify(&mut self, event: &DocumentEvent) {
        tracing::debug!(
            target: "events.document",
            kind = ?event.kind,
            path = event.path_string().as_str(),
            observers = self.observers.len(),
            "notify"
        );
        for (_, observer) in self.observers.iter_mut() {
            observer.on_document_event(event);
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Shell event loop
// -------------------------------------------------------------------------------------------------

/// Top-level event enum consumed by the shell event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Input(InputEvent),
    /// Ctrl-C; handled as a close request.
    Interrupt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// One line of user input without its terminator.
    Line(String),
    /// Input stream closed; treated by the shell as a window close request.
    Eof,
}
