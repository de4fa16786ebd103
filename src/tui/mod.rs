//! Read-only terminal dashboard
//!
//! Shows the committed project snapshot: phase, tasks, pending approvals,
//! and the discussion timeline. All mutation goes through the CLI; the
//! dashboard only ever reads the store.

mod events;
mod runner;
pub mod state;
mod views;

pub use runner::DashboardRunner;

use std::io::{self, Stdout};
use std::path::Path;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use eyre::Result;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::store::JsonFileStore;

/// Terminal type alias
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for dashboard mode
pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
pub fn restore() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Run the dashboard against a state file until the user quits.
pub async fn run(state_file: &Path) -> Result<()> {
    let terminal = init()?;
    let mut runner = DashboardRunner::new(terminal, JsonFileStore::new(state_file));

    let result = runner.run().await;
    restore()?;
    result
}
