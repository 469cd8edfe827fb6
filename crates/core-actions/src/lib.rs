//! Document lifecycle orchestration for NoteThat.
//!
//! * `lifecycle`: the New / Open / Save / SaveAs / Close state machine.
//! * `prompt`: confirmation / file chooser / error presentation seams.
//! * `io_ops`: the `Storage` seam and its file-system implementation.

mod error;
pub mod io_ops;
pub mod lifecycle;
pub mod prompt;

pub use error::{DocumentError, LifecycleError};
pub use io_ops::{FsStorage, Storage};
pub use lifecycle::{Continuation, DocumentLifecycle, Outcome, Phase, Step};
pub use prompt::{Choice, ConfirmRequest, ConfirmationPrompt, ErrorReporter, FilePicker, present};

/// Shell-originated requests. Prompts and choosers they need are surfaced as `Step`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    New,
    Open,
    Save,
    SaveAs,
    RequestClose,
}
