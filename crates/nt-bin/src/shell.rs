//! Line-oriented front end over `DocumentLifecycle`.
//!
//! Typed lines are appended to the text surface, `:`-commands become
//! lifecycle intents, and while a prompt or chooser is up the next line is
//! its answer. All output goes through `Console`.

use crate::command::{CommandParser, ShellCommand, parse_choice, parse_selection};
use core_actions::{
    Choice, ConfirmRequest, ConfirmationPrompt, DocumentError, DocumentLifecycle, ErrorReporter,
    FilePicker, FsStorage, LifecycleError, Outcome, Phase, Step, present,
};
use core_events::{DocumentEvent, DocumentEventKind, InputEvent};
use core_text::{TextBuffer, TextSurface};
use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, info, warn};

pub type ShellLifecycle = DocumentLifecycle<TextBuffer, FsStorage>;

const HELP: &[&str] = &[
    "text lines are appended to the document",
    ":new              start an untitled document",
    ":open [path]      open a file (asks for a path when omitted)",
    ":w                save",
    ":saveas [path]    save under a new name",
    ":p                print the document",
    ":d                delete the last line",
    ":q                close",
    "::text            append a line starting with ':'",
];

pub enum LoopControl {
    Continue,
    Break { reason: ShutdownReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    CloseApproved,
    InputClosed,
    ChannelClosed,
}

impl ShutdownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::CloseApproved => "close_approved",
            ShutdownReason::InputClosed => "input_closed",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chooser {
    Open,
    Save,
}

/// Console rendering of dialogs. Remembers what is on screen so the shell
/// knows how to route the next line. The first write error is kept and
/// surfaced by `take_failure`.
pub struct Console<W: Write> {
    out: W,
    confirm: Option<ConfirmRequest>,
    chooser: Option<Chooser>,
    failure: Option<io::Error>,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            confirm: None,
            chooser: None,
            failure: None,
        }
    }

    fn line(&mut self, text: &str) {
        if self.failure.is_some() {
            return;
        }
        let res = writeln!(self.out, "{text}").and_then(|_| self.out.flush());
        if let Err(e) = res {
            self.failure = Some(e);
        }
    }

    fn take_failure(&mut self) -> io::Result<()> {
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn clear_pending(&mut self) {
        self.confirm = None;
        self.chooser = None;
    }

    fn render_confirm(&mut self) {
        let Some(request) = self.confirm.clone() else {
            return;
        };
        let options = request
            .options
            .iter()
            .map(|choice| {
                let (head, tail) = choice.label().split_at(1);
                let marker = if *choice == request.default_option {
                    " (default)"
                } else {
                    ""
                };
                format!("[{}]{tail}{marker}", head.to_lowercase())
            })
            .collect::<Vec<_>>()
            .join(" / ");
        self.line(&request.message);
        self.line(&request.detail);
        self.line(&options);
    }
}

impl<W: Write> ConfirmationPrompt for Console<W> {
    fn ask(&mut self, request: &ConfirmRequest) {
        self.confirm = Some(request.clone());
        self.render_confirm();
    }
}

impl<W: Write> FilePicker for Console<W> {
    fn choose_open(&mut self) {
        self.chooser = Some(Chooser::Open);
        self.line("Open file (empty line cancels):");
    }

    fn choose_save(&mut self) {
        self.chooser = Some(Chooser::Save);
        self.line("Save as (empty line cancels):");
    }
}

impl<W: Write> ErrorReporter for Console<W> {
    fn report(&mut self, error: &DocumentError) {
        self.line(&format!("error: {error}"));
    }
}

pub struct Shell<W: Write> {
    lifecycle: ShellLifecycle,
    console: Console<W>,
    app_title: String,
    shown_title: Option<String>,
    notices: Rc<RefCell<Vec<String>>>,
}

impl<W: Write> Shell<W> {
    pub fn new(mut lifecycle: ShellLifecycle, app_title: impl Into<String>, out: W) -> Self {
        let notices = Rc::new(RefCell::new(Vec::new()));
        let sink = notices.clone();
        lifecycle.subscribe(move |event: &DocumentEvent| {
            sink.borrow_mut().push(describe(event));
        });
        Self {
            lifecycle,
            console: Console::new(out),
            app_title: app_title.into(),
            shown_title: None,
            notices,
        }
    }

    pub fn lifecycle(&self) -> &ShellLifecycle {
        &self.lifecycle
    }

    /// Show the initial title and open `path` when one was given.
    pub fn start(&mut self, path: Option<PathBuf>) -> io::Result<LoopControl> {
        let step = match path {
            Some(path) => self.lifecycle.open_path(absolute(path)),
            None => Ok(Step::Done(Outcome::Unchanged)),
        };
        self.settle(step)
    }

    pub fn handle_input(&mut self, input: InputEvent) -> io::Result<LoopControl> {
        match input {
            InputEvent::Line(line) => self.handle_line(&line),
            InputEvent::Eof => self.handle_eof(),
        }
    }

    /// Ctrl-C: dismiss any open dialog and request a close, which prompts
    /// when there are unsaved changes.
    pub fn handle_interrupt(&mut self) -> io::Result<LoopControl> {
        self.dismiss_pending();
        let step = self.lifecycle.request_close();
        self.settle(step)
    }

    fn handle_line(&mut self, line: &str) -> io::Result<LoopControl> {
        match self.lifecycle.phase() {
            Phase::AwaitingConfirmation => {
                let default = self
                    .console
                    .confirm
                    .as_ref()
                    .map_or(Choice::Save, |r| r.default_option);
                match parse_choice(line, default) {
                    Some(choice) => {
                        let step = self.lifecycle.resolve_confirmation(Some(choice));
                        self.settle(step)
                    }
                    None => {
                        self.console.render_confirm();
                        self.console.take_failure()?;
                        Ok(LoopControl::Continue)
                    }
                }
            }
            Phase::AwaitingFilePicker => {
                let selection = parse_selection(line);
                let step = match self.console.chooser {
                    Some(Chooser::Save) => self.lifecycle.resolve_save(selection),
                    _ => self.lifecycle.resolve_open(selection),
                };
                self.settle(step)
            }
            Phase::Idle => self.run_command(CommandParser::parse(line)),
        }
    }

    fn run_command(&mut self, command: ShellCommand) -> io::Result<LoopControl> {
        debug!(target: "runtime.shell", ?command, "command");
        let step = match command {
            ShellCommand::Intent(intent) => self.lifecycle.dispatch(intent),
            ShellCommand::OpenPath(path) => self.lifecycle.open_path(absolute(path)),
            ShellCommand::SaveTo(path) => self.lifecycle.save_to(absolute(path)),
            ShellCommand::Text(text) => {
                self.lifecycle.edit(|buffer| buffer.push_line(&text));
                Ok(Step::Done(Outcome::Unchanged))
            }
            ShellCommand::DeleteLine => {
                if self.lifecycle.surface().is_empty() {
                    self.console.line("nothing to delete");
                } else {
                    self.lifecycle.edit(|buffer| buffer.pop_line());
                }
                Ok(Step::Done(Outcome::Unchanged))
            }
            ShellCommand::Print => {
                self.print_document();
                Ok(Step::Done(Outcome::Unchanged))
            }
            ShellCommand::Help => {
                for line in HELP {
                    self.console.line(line);
                }
                Ok(Step::Done(Outcome::Unchanged))
            }
            ShellCommand::Unknown(body) => {
                self.console.line(&format!("unknown command: :{body}"));
                Ok(Step::Done(Outcome::Unchanged))
            }
        };
        self.settle(step)
    }

    /// End of input acts like the window's close button. Nobody is left to
    /// answer the prompt, so it takes its default option (Save). An untitled
    /// document has no destination; its save chooser is dismissed and the
    /// loss is reported.
    fn handle_eof(&mut self) -> io::Result<LoopControl> {
        self.dismiss_pending();
        let mut step = self.lifecycle.request_close();
        if let Ok(Step::Confirm(request)) = &step {
            let default = request.default_option;
            info!(target: "runtime.shell", %default, "eof_confirmation_default");
            step = self.lifecycle.resolve_confirmation(Some(default));
        }
        if matches!(step, Ok(Step::ChooseSave)) {
            step = self.lifecycle.resolve_save(None);
        }
        self.flush_notices();
        match step {
            Ok(Step::Done(Outcome::Failed(error))) => self.console.report(&error),
            Ok(_) => {}
            Err(err) => warn!(target: "runtime.shell", %err, "close_on_eof_rejected"),
        }
        if self.lifecycle.document().is_modified() {
            let name = self.lifecycle.document().display_name();
            warn!(target: "runtime.shell", name = name.as_str(), "unsaved_changes_abandoned");
            self.console
                .line(&format!("input closed; changes to \"{name}\" were not saved"));
        }
        self.console.take_failure()?;
        Ok(LoopControl::Break {
            reason: ShutdownReason::InputClosed,
        })
    }

    fn dismiss_pending(&mut self) {
        let dismissed = match self.lifecycle.phase() {
            Phase::Idle => return,
            Phase::AwaitingConfirmation => self.lifecycle.resolve_confirmation(None),
            Phase::AwaitingFilePicker => match self.console.chooser {
                Some(Chooser::Save) => self.lifecycle.resolve_save(None),
                _ => self.lifecycle.resolve_open(None),
            },
        };
        if let Err(err) = dismissed {
            warn!(target: "runtime.shell", %err, "dismiss_failed");
        }
        self.console.clear_pending();
    }

    /// Present the step, flush observer notices and refresh the title.
    fn settle(&mut self, step: Result<Step, LifecycleError>) -> io::Result<LoopControl> {
        self.console.clear_pending();
        self.flush_notices();
        let control = match step {
            Ok(step) => {
                present(&step, &mut self.console);
                match step {
                    Step::Done(Outcome::CloseApproved) => {
                        info!(target: "runtime.shell", "close_approved");
                        LoopControl::Break {
                            reason: ShutdownReason::CloseApproved,
                        }
                    }
                    _ => LoopControl::Continue,
                }
            }
            Err(err) => {
                self.console.line(&format!("error: {err}"));
                LoopControl::Continue
            }
        };
        self.refresh_title();
        self.console.take_failure()?;
        Ok(control)
    }

    fn flush_notices(&mut self) {
        let notices = std::mem::take(&mut *self.notices.borrow_mut());
        for notice in notices {
            self.console.line(&notice);
        }
    }

    fn refresh_title(&mut self) {
        let title = self.lifecycle.document().window_title(&self.app_title);
        if self.shown_title.as_deref() != Some(title.as_str()) {
            self.console.line(&format!("== {title} =="));
            self.shown_title = Some(title);
        }
    }

    fn print_document(&mut self) {
        let text = self.lifecycle.surface().text();
        if text.is_empty() {
            self.console.line("(empty)");
            return;
        }
        for (idx, line) in text.lines().enumerate() {
            self.console.line(&format!("{:>4} {line}", idx + 1));
        }
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

fn describe(event: &DocumentEvent) -> String {
    match event.kind {
        DocumentEventKind::Created => "new document".to_string(),
        DocumentEventKind::Opened => format!("opened {}", event.path_string()),
        DocumentEventKind::Saved => format!("saved {}", event.path_string()),
    }
}
