//! Blocking line reader feeding the event loop.
//!
//! Reads run on a dedicated OS thread so a pending read never holds up
//! runtime shutdown; lines cross into the loop through `blocking_send`.

use core_events::{CHANNEL_SEND_FAILURES, Event, INPUT_LINES, InputEvent};
use std::io::BufRead;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::Sender;
use tracing::{trace, warn};

/// Forward each line of `reader` as `Event::Input(Line)`, then a final `Eof`.
pub fn spawn_line_reader<R>(reader: R, tx: Sender<Event>) -> std::io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("notethat-input".into())
        .spawn(move || read_lines(reader, tx))
}

fn read_lines<R: BufRead>(reader: R, tx: Sender<Event>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(target: "input", error = %e, "input_read_failed");
                break;
            }
        };
        INPUT_LINES.fetch_add(1, Ordering::Relaxed);
        trace!(target: "input", len = line.len(), "input_line");
        if tx.blocking_send(Event::Input(InputEvent::Line(line))).is_err() {
            CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
            return;
        }
    }
    if tx.blocking_send(Event::Input(InputEvent::Eof)).is_err() {
        CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
    }
}
