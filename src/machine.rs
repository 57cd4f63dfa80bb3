use std::path::PathBuf;

use anyhow::{Result, anyhow};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::context::AppContext;
use crate::scanner::{self, Directory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Initializing,
    Browsing,
    Launching,
    Exiting,
    Error,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    DirectoriesLoaded,
    Key(KeyEvent),
    Resized,
}

/// What a handler hands back to the driver loop. Terminal states never call
/// `process::exit` themselves; they yield `Exit` and the driver terminates
/// after cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

/// Terminal ownership seam. Setup and restore bracket raw mode; restore must
/// be idempotent because the machine and the driver both call it.
pub trait Screen {
    fn setup(&mut self) -> Result<()>;
    fn render(&mut self, context: &mut AppContext) -> Result<()>;
    fn restore(&mut self) -> Result<()>;
}

pub trait Launcher {
    fn launch(&mut self, directory: &Directory) -> Result<()>;
}

/// The application state machine. Owns the context for the whole process
/// lifetime and reaches the terminal and tmux through trait objects so the
/// transition logic can be exercised with stubs.
pub struct Machine<'a> {
    state: AppState,
    pub context: AppContext,
    roots: Vec<PathBuf>,
    screen: &'a mut dyn Screen,
    launcher: &'a mut dyn Launcher,
}

impl<'a> Machine<'a> {
    pub fn new(
        roots: Vec<PathBuf>,
        screen: &'a mut dyn Screen,
        launcher: &'a mut dyn Launcher,
    ) -> Self {
        Self {
            state: AppState::Initializing,
            context: AppContext::default(),
            roots,
            screen,
            launcher,
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn start(&mut self) -> Result<Flow> {
        handler_for(self.state).on_enter(self)
    }

    /// Runs the current state's event hook to completion. Events are handled
    /// strictly one at a time; a transition triggered by the event finishes
    /// (exit hook, state swap, enter hook) before this returns.
    pub fn dispatch(&mut self, event: AppEvent) -> Result<Flow> {
        handler_for(self.state).on_event(self, &event)
    }

    /// Swaps states, running the old exit hook and the new enter hook. A
    /// transition to the current state is the re-render idiom: same state,
    /// but the enter hook still runs.
    fn transition(&mut self, target: AppState) -> Result<Flow> {
        handler_for(self.state).on_exit(self)?;
        self.state = target;
        handler_for(target).on_enter(self)
    }
}

/// Per-state behavior with optional hooks; unhandled events fall through to
/// a no-op.
trait StateHandler {
    fn on_enter(&self, machine: &mut Machine) -> Result<Flow> {
        let _ = machine;
        Ok(Flow::Continue)
    }

    fn on_exit(&self, machine: &mut Machine) -> Result<()> {
        let _ = machine;
        Ok(())
    }

    fn on_event(&self, machine: &mut Machine, event: &AppEvent) -> Result<Flow> {
        let _ = (machine, event);
        Ok(Flow::Continue)
    }
}

fn handler_for(state: AppState) -> &'static dyn StateHandler {
    match state {
        AppState::Initializing => &Initializing,
        AppState::Browsing => &Browsing,
        AppState::Launching => &Launching,
        AppState::Exiting => &Exiting,
        AppState::Error => &ErrorState,
    }
}

struct Initializing;

impl StateHandler for Initializing {
    fn on_enter(&self, machine: &mut Machine) -> Result<Flow> {
        let directories = scanner::scan_directories(&machine.roots);
        machine.context.load_directories(directories);
        machine.dispatch(AppEvent::DirectoriesLoaded)
    }

    fn on_event(&self, machine: &mut Machine, event: &AppEvent) -> Result<Flow> {
        match event {
            AppEvent::DirectoriesLoaded => {
                // Raw mode only starts once the directory list is ready, so
                // scan warnings still land on a cooked terminal.
                if let Err(err) = machine.screen.setup() {
                    machine.context.set_error(err);
                    return machine.transition(AppState::Error);
                }
                machine.transition(AppState::Browsing)
            }
            _ => Ok(Flow::Continue),
        }
    }
}

struct Browsing;

impl StateHandler for Browsing {
    fn on_enter(&self, machine: &mut Machine) -> Result<Flow> {
        if let Err(err) = machine.screen.render(&mut machine.context) {
            machine.context.set_error(err);
            return machine.transition(AppState::Error);
        }
        Ok(Flow::Continue)
    }

    fn on_event(&self, machine: &mut Machine, event: &AppEvent) -> Result<Flow> {
        let key = match event {
            AppEvent::Key(key) => key,
            AppEvent::Resized => return machine.transition(AppState::Browsing),
            AppEvent::DirectoriesLoaded => return Ok(Flow::Continue),
        };

        match key.code {
            KeyCode::Up => {
                machine.context.move_selection_up();
                machine.transition(AppState::Browsing)
            }
            KeyCode::Down => {
                machine.context.move_selection_down();
                machine.transition(AppState::Browsing)
            }
            KeyCode::Enter => {
                let Some(selected) = machine.context.current_selection() else {
                    return Ok(Flow::Continue);
                };
                let directory = selected.directory.clone();
                machine.context.select_directory(directory);
                machine.transition(AppState::Launching)
            }
            KeyCode::Esc => machine.transition(AppState::Exiting),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                machine.transition(AppState::Exiting)
            }
            KeyCode::Backspace => {
                machine.context.remove_last_filter_char();
                machine.transition(AppState::Browsing)
            }
            KeyCode::Char(ch) if is_printable(ch, key.modifiers) => {
                machine.context.add_filter_char(ch);
                machine.transition(AppState::Browsing)
            }
            _ => Ok(Flow::Continue),
        }
    }
}

struct Launching;

impl StateHandler for Launching {
    fn on_enter(&self, machine: &mut Machine) -> Result<Flow> {
        let Some(directory) = machine.context.selected_directory.clone() else {
            machine.context.set_error(anyhow!("no directory selected"));
            return machine.transition(AppState::Error);
        };

        // The terminal has to be handed back before tmux takes the tty.
        if let Err(err) = machine.screen.restore() {
            machine.context.set_error(err);
            return machine.transition(AppState::Error);
        }

        match machine.launcher.launch(&directory) {
            Ok(()) => machine.transition(AppState::Exiting),
            Err(err) => {
                machine.context.set_error(err);
                machine.transition(AppState::Error)
            }
        }
    }
}

struct Exiting;

impl StateHandler for Exiting {
    fn on_enter(&self, machine: &mut Machine) -> Result<Flow> {
        machine.screen.restore()?;
        Ok(Flow::Exit(0))
    }
}

struct ErrorState;

impl StateHandler for ErrorState {
    fn on_enter(&self, machine: &mut Machine) -> Result<Flow> {
        // Keep the recorded error; a restore failure here has nowhere better
        // to go.
        let _ = machine.screen.restore();
        Ok(Flow::Exit(1))
    }
}

fn is_printable(ch: char, modifiers: KeyModifiers) -> bool {
    (modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) && matches!(ch, ' '..='~')
}
