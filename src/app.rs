use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};

use crate::machine::{AppEvent, Flow, Machine, Screen};
use crate::tmux::TmuxLauncher;
use crate::ui::TerminalScreen;

/// Builds the collaborators, runs the state machine to completion, and
/// returns the process exit code. Terminal restoration is guarded on every
/// path out of here: the terminal states restore it, this function restores
/// again after the machine stops (a no-op when already done), and the error
/// arm restores before propagating.
pub fn run(roots: Vec<PathBuf>) -> Result<i32> {
    let mut screen = TerminalScreen::new();
    let mut launcher = TmuxLauncher;

    let outcome = {
        let mut machine = Machine::new(roots, &mut screen, &mut launcher);
        drive(&mut machine).map(|code| {
            let error = machine.context.error.take().map(|err| format!("{err:#}"));
            (code, error)
        })
    };

    let restored = screen.restore();
    match outcome {
        Ok((code, error)) => {
            restored?;
            // Printed after leaving the alternate screen so it stays visible.
            if let Some(message) = error {
                eprintln!("Error: {message}");
            }
            Ok(code)
        }
        Err(err) => {
            let _ = restored;
            Err(err)
        }
    }
}

/// The cooperative event loop: one blocking read, one dispatch, repeated
/// until a terminal state yields an exit code. No background work, no
/// timers; a hung subprocess simply blocks the loop.
fn drive(machine: &mut Machine<'_>) -> Result<i32> {
    if let Flow::Exit(code) = machine.start()? {
        return Ok(code);
    }

    loop {
        let flow = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                machine.dispatch(AppEvent::Key(key))?
            }
            Event::Resize(_, _) => machine.dispatch(AppEvent::Resized)?,
            _ => Flow::Continue,
        };

        if let Flow::Exit(code) = flow {
            return Ok(code);
        }
    }
}
