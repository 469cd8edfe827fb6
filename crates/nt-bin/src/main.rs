//! NoteThat entrypoint.
mod command;
mod input;
mod shell;

use anyhow::Result;
use clap::Parser;
use core_actions::{DocumentLifecycle, FsStorage};
use core_admission::AdmissionPolicy;
use core_config::load_from;
use core_events::{CHANNEL_SEND_FAILURES, EVENT_CHANNEL_CAP, Event, INPUT_LINES};
use core_text::TextBuffer;
use shell::{LoopControl, Shell, ShutdownReason};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE_NAME: &str = "notethat.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "notethat", version, about = "NoteThat plain-text notepad")]
struct Args {
    /// Optional file to open at startup. Binary and media files are refused.
    pub path: Option<PathBuf>,
    /// Optional configuration file path (overrides discovery of `notethat.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

struct RuntimeContext {
    config: core_config::Config,
    startup_path: Option<PathBuf>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn run(&mut self) -> Result<RuntimeContext> {
        self.configure_logging()?;
        Self::install_panic_hook();

        info!(target: "runtime", "startup");
        let args = Args::parse();
        let config = load_from(args.config.clone())?;

        let path_str = args.path.as_ref().map(|p| p.to_string_lossy().to_string());
        let source_str = config
            .source
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());
        info!(
            target: "runtime.startup",
            path = path_str.as_deref(),
            config_source = source_str.as_deref(),
            config_override = args.config.is_some(),
            extra_denied = config.file.admission.extra_denied.len(),
            "bootstrap_complete"
        );

        Ok(RuntimeContext {
            config,
            startup_path: args.path,
        })
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join(LOG_FILE_NAME);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_ansi(false)
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

struct ShellRuntime<W: Write> {
    shell: Shell<W>,
    rx: mpsc::Receiver<Event>,
    startup_path: Option<PathBuf>,
    source_handles: Vec<JoinHandle<()>>,
}

impl<W: Write> ShellRuntime<W> {
    fn new(
        context: RuntimeContext,
        rx: mpsc::Receiver<Event>,
        source_handles: Vec<JoinHandle<()>>,
        out: W,
    ) -> Self {
        let RuntimeContext {
            config,
            startup_path,
        } = context;
        let policy =
            AdmissionPolicy::new().with_extra_denied(&config.file.admission.extra_denied);
        let lifecycle = DocumentLifecycle::new(TextBuffer::new(), FsStorage).with_policy(policy);
        Self {
            shell: Shell::new(lifecycle, config.title(), out),
            rx,
            startup_path,
            source_handles,
        }
    }

    async fn run(&mut self) -> Result<()> {
        let mut shutdown_reason = ShutdownReason::ChannelClosed;
        match self.shell.start(self.startup_path.take())? {
            LoopControl::Break { reason } => shutdown_reason = reason,
            LoopControl::Continue => {
                while let Some(event) = self.rx.recv().await {
                    trace!(target: "runtime.events", ?event, "event");
                    let control = match event {
                        Event::Input(input) => self.shell.handle_input(input)?,
                        Event::Interrupt => self.shell.handle_interrupt()?,
                    };
                    if let LoopControl::Break { reason } = control {
                        shutdown_reason = reason;
                        break;
                    }
                }
            }
        }

        self.rx.close();
        self.finalize_shutdown(shutdown_reason).await;
        Ok(())
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        info!(
            target: "runtime.shutdown",
            reason = reason.as_str(),
            unsaved = self.shell.lifecycle().document().is_modified(),
            input_lines = INPUT_LINES.load(Ordering::Relaxed),
            send_failures = CHANNEL_SEND_FAILURES.load(Ordering::Relaxed),
            "shutdown"
        );
        while let Some(handle) = self.source_handles.pop() {
            handle.abort();
            match tokio::time::timeout(Duration::from_millis(200), handle).await {
                Ok(Ok(_)) => trace!(target: "runtime.shutdown", "event_source_task_stopped"),
                Ok(Err(err)) if err.is_cancelled() => {
                    trace!(target: "runtime.shutdown", "event_source_task_cancelled")
                }
                Ok(Err(err)) => error!(target: "runtime.shutdown", ?err, "event_source_task_error"),
                Err(_) => warn!(target: "runtime.shutdown", "event_source_task_timeout"),
            }
        }
    }
}

/// Forward Ctrl-C presses into the loop as `Event::Interrupt`.
fn spawn_interrupt_source(tx: mpsc::Sender<Event>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(target: "runtime", error = %e, "ctrl_c_unavailable");
                return;
            }
            if tx.send(Event::Interrupt).await.is_err() {
                CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    let context = startup.run()?;
    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    // Detached: a read blocked on the terminal must not hold up exit.
    let _input_thread = input::spawn_line_reader(io::BufReader::new(io::stdin()), tx.clone())?;
    let source_handles = vec![spawn_interrupt_source(tx)];

    let mut runtime = ShellRuntime::new(context, rx, source_handles, io::stdout());
    runtime.run().await
}
