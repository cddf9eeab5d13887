//! Interactive reading session
//!
//! The stopwatch observer and a stdin reader feed one channel; the loop
//! redraws the live total on every tick and ends on Enter.

use anyhow::{Context, Result};
use console::{style, Term};
use pagemark_core::{format_clock, BookId};
use pagemark_library::{BookStore, Library};
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

enum SessionEvent {
    Tick,
    Finish,
}

/// Times a session for one book and returns its total reading time
pub fn run_session<S: BookStore>(library: &mut Library<S>, id: &BookId) -> Result<u64> {
    let term = Term::stdout();
    let (tx, rx) = mpsc::channel();

    let tick_tx = tx.clone();
    library.set_timer_observer(id, move || {
        // The receiver is gone once the session ends
        let _ = tick_tx.send(SessionEvent::Tick);
    })?;
    spawn_input_reader(tx)?;

    library.start_timer(id)?;
    if term.hide_cursor().is_err() {
        log::debug!("Failed to hide cursor");
    }

    let result = session_loop(&term, library, id, &rx);

    let _ = term.show_cursor();
    let stopped = library.stop_timer(id);
    library.clear_timer_observer(id)?;
    let total = stopped.context("Failed to save reading time")?;

    result.map(|()| total)
}

fn session_loop<S: BookStore>(
    term: &Term,
    library: &Library<S>,
    id: &BookId,
    rx: &Receiver<SessionEvent>,
) -> Result<()> {
    term.write_line(&status_line(library.live_reading_time(id)?))?;

    while let Ok(event) = rx.recv() {
        match event {
            SessionEvent::Tick => {
                term.clear_last_lines(1)?;
                term.write_line(&status_line(library.live_reading_time(id)?))?;
            }
            SessionEvent::Finish => break,
        }
    }

    Ok(())
}

fn spawn_input_reader(tx: Sender<SessionEvent>) -> Result<()> {
    thread::Builder::new()
        .name("read-input".to_string())
        .spawn(move || {
            let mut line = String::new();
            if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
                log::warn!("Failed to read input: {}", e);
            }
            let _ = tx.send(SessionEvent::Finish);
        })
        .context("Failed to start input reader")?;
    Ok(())
}

fn status_line(seconds: u64) -> String {
    format!("  {} {}", style("⏱").cyan(), style(format_clock(seconds)).bold())
}
