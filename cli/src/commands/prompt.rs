//! Interactive code prompt driven by the countdown ticker

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use enroll_core::services::{CountdownTicker, TimerSnapshot, VerifiedOtp, VerifyOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::debug;

use super::otp::Flow;
use crate::render::countdown_line;

/// One line typed at the prompt
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Resend,
    Quit,
    Code(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        s if s.eq_ignore_ascii_case("resend") => Input::Resend,
        s if s.eq_ignore_ascii_case("quit") || s.eq_ignore_ascii_case("exit") => Input::Quit,
        code => Input::Code(code),
    }
}

/// Prompt output; a closed pipe ends the prompt
struct Screen<W> {
    out: W,
    live: bool,
}

impl<W: Write> Screen<W> {
    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)?;
        self.out.flush()
    }

    /// Render the status line; `fresh` starts a new line instead of overwriting
    fn draw(&mut self, snapshot: &TimerSnapshot, fresh: bool) -> io::Result<()> {
        let line = countdown_line(snapshot);
        if self.live && !fresh {
            write!(self.out, "\r\x1b[2K{} > ", line)?;
        } else if self.live {
            write!(self.out, "\n{} > ", line)?;
        } else {
            writeln!(self.out, "{}", line)?;
        }
        self.out.flush()
    }
}

/// Whether a write failed because the reader went away
fn pipe_closed(result: io::Result<()>) -> bool {
    match result {
        Ok(()) => false,
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => true,
        Err(e) => {
            debug!(error = %e, "Prompt write failed");
            false
        }
    }
}

fn rejection_note(message: String, attempts_left: u8, locked_out: bool) -> String {
    if locked_out {
        message
    } else {
        let plural = if attempts_left == 1 { "" } else { "s" };
        format!("{} ({} attempt{} left)", message, attempts_left, plural)
    }
}

/// Read codes from stdin until one is accepted, the user quits or stdin closes
///
/// The countdown is redrawn in place on a terminal; otherwise only state
/// changes are printed.
pub async fn interact(flow: Flow) -> anyhow::Result<Option<VerifiedOtp>> {
    let tick = flow.timer().policy().tick_interval;
    let flow = Arc::new(Mutex::new(flow));
    let (ticker, mut countdown) = CountdownTicker::spawn(Arc::clone(&flow), tick).await;

    let stdout = io::stdout();
    let live = stdout.is_terminal();
    let mut screen = Screen { out: stdout, live };
    let mut last = countdown.borrow().clone();
    let intro = format!(
        "Enter the 6-digit code sent to {} ('resend' for a new code, 'quit' to stop).",
        last.email
    );
    let opened = screen.say(&intro).and_then(|_| screen.draw(&last, true));
    if pipe_closed(opened) {
        ticker.stop();
        return Ok(None);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let verified = loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    let _ = screen.say("");
                    break None;
                };
                let note = match parse_input(&line) {
                    Input::Empty => None,
                    Input::Quit => break None,
                    Input::Resend => match flow.lock().await.resend().await {
                        Ok(_) => Some("A new code has been sent.".to_string()),
                        Err(e) => Some(e.user_message()),
                    },
                    Input::Code(code) => match flow.lock().await.verify(code).await {
                        Ok(VerifyOutcome::Verified(verified)) => break Some(verified),
                        Ok(VerifyOutcome::Rejected { message, attempts_left, locked_out }) => {
                            Some(rejection_note(message, attempts_left, locked_out))
                        }
                        Err(e) => Some(e.user_message()),
                    },
                };
                last = flow.lock().await.snapshot();
                let written = match note {
                    Some(note) => screen.say(&note),
                    None => Ok(()),
                };
                if pipe_closed(written.and_then(|_| screen.draw(&last, true))) {
                    break None;
                }
            }
            changed = countdown.changed() => {
                if changed.is_err() {
                    break None;
                }
                let snapshot = countdown.borrow_and_update().clone();
                let transition = snapshot.state != last.state;
                if (live || transition) && pipe_closed(screen.draw(&snapshot, transition)) {
                    break None;
                }
                last = snapshot;
            }
        }
    };

    ticker.stop();
    debug!(verified = verified.is_some(), "Prompt closed");
    Ok(verified)
}
