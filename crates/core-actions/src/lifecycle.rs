//! Document lifecycle state machine (New / Open / Save / SaveAs / Close).
//!
//! The machine never waits on a dialog itself. Every entry point returns a
//! `Step`: either a suspend point the shell must present (`Confirm`,
//! `ChooseOpen`, `ChooseSave`) or `Done` with the final `Outcome`. The shell
//! resumes a suspended flow through the matching `resolve_*` call.
//!
//! Phases:
//! * `Idle`: nothing pending; intents are accepted.
//! * `AwaitingConfirmation`: unsaved-changes prompt open, continuation held.
//! * `AwaitingFilePicker`: open or save chooser open.
//!
//! Only one flow may be pending. Intents arriving outside `Idle` are rejected
//! with `LifecycleError::Busy` and change nothing.
//!
//! Chained saves: when the user picks *Save* on the prompt, the continuation
//! (New / Open / Close) travels with the save as a one-shot value. It runs
//! after every observer has seen the save notification, and it is dropped if
//! the save fails or its destination picker is dismissed.

use crate::io_ops::Storage;
use crate::prompt::{Choice, ConfirmRequest};
use crate::{DocumentError, Intent, LifecycleError};
use core_admission::{AdmissionPolicy, Rejection};
use core_events::{DocumentEvent, DocumentObserver, ObserverId, ObserverRegistry};
use core_state::Document;
use core_text::TextSurface;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingConfirmation,
    AwaitingFilePicker,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle => "idle",
            Phase::AwaitingConfirmation => "awaiting confirmation",
            Phase::AwaitingFilePicker => "awaiting file picker",
        })
    }
}

/// Action deferred behind an unsaved-changes prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    New,
    Open,
    OpenPath(PathBuf),
    Close,
}

impl Continuation {
    fn action_phrase(&self) -> &'static str {
        match self {
            Continuation::New => "creating a new document",
            Continuation::Open | Continuation::OpenPath(_) => "opening another file",
            Continuation::Close => "closing",
        }
    }
}

/// Result of driving the machine one step.
#[derive(Debug)]
pub enum Step {
    Confirm(ConfirmRequest),
    ChooseOpen,
    ChooseSave,
    Done(Outcome),
}

impl Step {
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done(_))
    }

    pub fn into_outcome(self) -> Option<Outcome> {
        match self {
            Step::Done(outcome) => Some(outcome),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    /// A transition succeeded and observers were notified with this event.
    Updated(DocumentEvent),
    /// Cancelled or nothing to do; document untouched.
    Unchanged,
    /// Operation aborted; report to the user.
    Failed(DocumentError),
    /// The window may close.
    CloseApproved,
}

#[derive(Debug)]
enum Pending {
    Idle,
    Confirm(Continuation),
    OpenPicker,
    SavePicker { then: Option<Continuation> },
}

pub struct DocumentLifecycle<S, F> {
    document: Document,
    surface: S,
    storage: F,
    policy: AdmissionPolicy,
    observers: ObserverRegistry,
    pending: Pending,
}

impl<S, F> fmt::Debug for DocumentLifecycle<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentLifecycle")
            .field("document", &self.document)
            .field("pending", &self.pending)
            .field("observers", &self.observers)
            .finish()
    }
}

impl<S: TextSurface, F: Storage> DocumentLifecycle<S, F> {
    /// Untitled, unmodified document over `surface`.
    pub fn new(surface: S, storage: F) -> Self {
        Self {
            document: Document::new(),
            surface,
            storage,
            policy: AdmissionPolicy::default(),
            observers: ObserverRegistry::new(),
            pending: Pending::Idle,
        }
    }

    pub fn with_policy(mut self, policy: AdmissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn storage(&self) -> &F {
        &self.storage
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    pub fn phase(&self) -> Phase {
        match self.pending {
            Pending::Idle => Phase::Idle,
            Pending::Confirm(_) => Phase::AwaitingConfirmation,
            Pending::OpenPicker | Pending::SavePicker { .. } => Phase::AwaitingFilePicker,
        }
    }

    pub fn subscribe<O: DocumentObserver + 'static>(&mut self, observer: O) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Apply a user edit to the surface. Counts as a content-changed notification.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut S) -> R) -> R {
        let out = f(&mut self.surface);
        self.note_content_changed();
        out
    }

    /// Content-changed notification for surfaces edited outside `edit`.
    pub fn note_content_changed(&mut self) {
        self.document.mark_modified();
    }

    pub fn dispatch(&mut self, intent: Intent) -> Result<Step, LifecycleError> {
        match intent {
            Intent::New => self.new_document(),
            Intent::Open => self.open(),
            Intent::Save => self.save(),
            Intent::SaveAs => self.save_as(),
            Intent::RequestClose => self.request_close(),
        }
    }

    pub fn new_document(&mut self) -> Result<Step, LifecycleError> {
        self.ensure_idle("new")?;
        Ok(self.guard_unsaved(Continuation::New))
    }

    pub fn open(&mut self) -> Result<Step, LifecycleError> {
        self.ensure_idle("open")?;
        Ok(self.guard_unsaved(Continuation::Open))
    }

    /// Open with the chooser skipped (command line, `:open <path>`).
    pub fn open_path(&mut self, path: impl Into<PathBuf>) -> Result<Step, LifecycleError> {
        self.ensure_idle("open_path")?;
        Ok(self.guard_unsaved(Continuation::OpenPath(path.into())))
    }

    pub fn save(&mut self) -> Result<Step, LifecycleError> {
        self.ensure_idle("save")?;
        Ok(self.begin_save(None))
    }

    pub fn save_as(&mut self) -> Result<Step, LifecycleError> {
        self.ensure_idle("save_as")?;
        Ok(self.await_save_destination(None))
    }

    /// Save-as with the chooser skipped.
    pub fn save_to(&mut self, path: impl Into<PathBuf>) -> Result<Step, LifecycleError> {
        self.ensure_idle("save_to")?;
        Ok(self.write_to(path.into(), None))
    }

    pub fn request_close(&mut self) -> Result<Step, LifecycleError> {
        self.ensure_idle("close")?;
        Ok(self.guard_unsaved(Continuation::Close))
    }

    /// Answer to the unsaved-changes prompt. `None` means the dialog was dismissed.
    pub fn resolve_confirmation(&mut self, choice: Option<Choice>) -> Result<Step, LifecycleError> {
        let continuation = match std::mem::replace(&mut self.pending, Pending::Idle) {
            Pending::Confirm(continuation) => continuation,
            other => return Err(self.restore_and_reject(other, "confirmation")),
        };
        let choice = choice.unwrap_or(Choice::Cancel);
        info!(target: "lifecycle", ?continuation, %choice, "confirmation_resolved");
        Ok(match choice {
            Choice::Cancel => Step::Done(Outcome::Unchanged),
            Choice::Discard => self.proceed(continuation),
            Choice::Save => self.begin_save(Some(continuation)),
        })
    }

    /// Answer to the open chooser. `None` means the chooser was dismissed.
    pub fn resolve_open(&mut self, selection: Option<PathBuf>) -> Result<Step, LifecycleError> {
        match std::mem::replace(&mut self.pending, Pending::Idle) {
            Pending::OpenPicker => {}
            other => return Err(self.restore_and_reject(other, "open chooser")),
        }
        Ok(match selection {
            Some(path) => self.load(path),
            None => {
                debug!(target: "lifecycle", "open_cancelled");
                Step::Done(Outcome::Unchanged)
            }
        })
    }

    /// Answer to the save chooser. `None` means the chooser was dismissed.
    pub fn resolve_save(&mut self, destination: Option<PathBuf>) -> Result<Step, LifecycleError> {
        let then = match std::mem::replace(&mut self.pending, Pending::Idle) {
            Pending::SavePicker { then } => then,
            other => return Err(self.restore_and_reject(other, "save chooser")),
        };
        Ok(match destination {
            Some(path) => self.write_to(path, then),
            None => {
                debug!(target: "lifecycle", dropped = ?then, "save_cancelled");
                Step::Done(Outcome::Unchanged)
            }
        })
    }

    fn ensure_idle(&self, intent: &'static str) -> Result<(), LifecycleError> {
        if matches!(self.pending, Pending::Idle) {
            return Ok(());
        }
        let phase = self.phase();
        warn!(target: "lifecycle", intent, %phase, "intent_rejected_busy");
        Err(LifecycleError::Busy(phase))
    }

    fn restore_and_reject(&mut self, pending: Pending, expected: &'static str) -> LifecycleError {
        self.pending = pending;
        let actual = self.phase();
        warn!(target: "lifecycle", expected, %actual, "unexpected_resolution");
        LifecycleError::NotAwaiting { expected, actual }
    }

    fn guard_unsaved(&mut self, continuation: Continuation) -> Step {
        if !self.document.is_modified() {
            return self.proceed(continuation);
        }
        let request = ConfirmRequest::unsaved_changes(
            &self.document.display_name(),
            continuation.action_phrase(),
        );
        debug!(target: "lifecycle", ?continuation, "confirmation_requested");
        self.pending = Pending::Confirm(continuation);
        Step::Confirm(request)
    }

    fn proceed(&mut self, continuation: Continuation) -> Step {
        match continuation {
            Continuation::New => self.reset_document(),
            Continuation::Open => {
                self.pending = Pending::OpenPicker;
                Step::ChooseOpen
            }
            Continuation::OpenPath(path) => self.load(path),
            Continuation::Close => {
                self.document.force_clean();
                info!(target: "lifecycle", "close_approved");
                Step::Done(Outcome::CloseApproved)
            }
        }
    }

    fn begin_save(&mut self, then: Option<Continuation>) -> Step {
        match self.document.path().map(Path::to_path_buf) {
            Some(path) => self.write_to(path, then),
            None => self.await_save_destination(then),
        }
    }

    fn await_save_destination(&mut self, then: Option<Continuation>) -> Step {
        self.pending = Pending::SavePicker { then };
        Step::ChooseSave
    }

    fn reset_document(&mut self) -> Step {
        self.surface.replace_all("");
        self.document.reset();
        info!(target: "lifecycle", "document_created");
        self.finish(DocumentEvent::created(), None)
    }

    fn load(&mut self, path: PathBuf) -> Step {
        let candidate = match self.storage.inspect(&path) {
            Ok(candidate) => candidate,
            Err(source) => return fail(Rejection::Metadata { path, source }.into()),
        };
        if let Err(rejection) = self.policy.evaluate(&candidate) {
            return fail(rejection.into());
        }
        match self.storage.read(&path) {
            Ok(content) => {
                self.surface.replace_all(&content);
                self.document.mark_loaded(path.clone());
                info!(target: "lifecycle", file = %path.display(), "document_opened");
                self.finish(DocumentEvent::opened(path), None)
            }
            Err(source) => fail(DocumentError::Read { path, source }),
        }
    }

    fn write_to(&mut self, path: PathBuf, then: Option<Continuation>) -> Step {
        let content = self.surface.text();
        match self.storage.write(&path, &content) {
            Ok(()) => {
                self.document.mark_saved(path.clone());
                info!(target: "lifecycle", file = %path.display(), "document_saved");
                self.finish(DocumentEvent::saved(path), then)
            }
            Err(source) => {
                if then.is_some() {
                    warn!(target: "lifecycle", dropped = ?then, "chained_save_failed");
                }
                fail(DocumentError::Write { path, source })
            }
        }
    }

    /// Notify observers, then run the chained continuation (if any).
    fn finish(&mut self, event: DocumentEvent, then: Option<Continuation>) -> Step {
        self.observers.notify(&event);
        match then {
            Some(continuation) => self.proceed(continuation),
            None => Step::Done(Outcome::Updated(event)),
        }
    }
}

fn fail(error: DocumentError) -> Step {
    warn!(target: "lifecycle", %error, "operation_failed");
    Step::Done(Outcome::Failed(error))
}
