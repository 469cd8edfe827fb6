//! Presentation seams for the suspend points of the lifecycle.
//!
//! The lifecycle never blocks on a dialog. It returns a `Step`; the shell
//! shows the matching dialog through these traits and later feeds the answer
//! back with `resolve_confirmation`, `resolve_open` or `resolve_save`.

use crate::DocumentError;
use crate::lifecycle::{Outcome, Step};
use std::fmt;

/// Buttons of the unsaved-changes dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Cancel,
    Discard,
    Save,
}

impl Choice {
    pub fn label(self) -> &'static str {
        match self {
            Choice::Cancel => "Cancel",
            Choice::Discard => "Discard",
            Choice::Save => "Save",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Contents of a yes/no/cancel confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub message: String,
    pub detail: String,
    pub options: [Choice; 3],
    pub default_option: Choice,
    pub cancel_option: Choice,
}

impl ConfirmRequest {
    pub const DETAIL: &'static str = "Your changes will be lost if you don't save them.";

    /// `action` completes the sentence "Save changes ... before <action>?".
    pub fn unsaved_changes(document_name: &str, action: &str) -> Self {
        Self {
            message: format!("Save changes to \"{document_name}\" before {action}?"),
            detail: Self::DETAIL.to_string(),
            options: [Choice::Cancel, Choice::Discard, Choice::Save],
            default_option: Choice::Save,
            cancel_option: Choice::Cancel,
        }
    }
}

/// Shows a confirmation dialog; the answer arrives via `resolve_confirmation`.
pub trait ConfirmationPrompt {
    fn ask(&mut self, request: &ConfirmRequest);
}

/// Shows file choosers; answers arrive via `resolve_open` / `resolve_save`.
pub trait FilePicker {
    fn choose_open(&mut self);
    fn choose_save(&mut self);
}

/// Modal error message.
pub trait ErrorReporter {
    fn report(&mut self, error: &DocumentError);
}

/// Route a step to the matching presentation seam. Returns true while the
/// flow is still waiting for a response.
pub fn present<U>(step: &Step, ui: &mut U) -> bool
where
    U: ConfirmationPrompt + FilePicker + ErrorReporter + ?Sized,
{
    match step {
        Step::Confirm(request) => {
            ui.ask(request);
            true
        }
        Step::ChooseOpen => {
            ui.choose_open();
            true
        }
        Step::ChooseSave => {
            ui.choose_save();
            true
        }
        Step::Done(Outcome::Failed(error)) => {
            ui.report(error);
            false
        }
        Step::Done(_) => false,
    }
}
