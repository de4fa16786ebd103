//! Dashboard event loop

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use eyre::Result;
use tracing::debug;

use crate::store::{JsonFileStore, ProjectStore};

use super::Tui;
use super::events::{Event, EventHandler};
use super::state::DashboardState;
use super::views;

pub struct DashboardRunner {
    terminal: Tui,
    store: JsonFileStore,
    state: DashboardState,
    events: EventHandler,
}

impl DashboardRunner {
    pub fn new(terminal: Tui, store: JsonFileStore) -> Self {
        Self {
            terminal,
            store,
            state: DashboardState::new(),
            events: EventHandler::new(Duration::from_millis(2000)),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.reload().await;

        loop {
            // Split borrows: the draw closure reads state while the
            // terminal is borrowed mutably
            let Self { terminal, state, .. } = &mut *self;
            terminal.draw(|frame| views::render(state, frame))?;

            match self.events.next()? {
                Event::Key(key) => {
                    if self.handle_key(key).await {
                        break;
                    }
                }
                // The store only ever contains committed snapshots, so a
                // periodic reload is all the dashboard needs
                Event::Tick => self.reload().await,
                Event::Resize => {}
            }
        }
        Ok(())
    }

    /// Returns true when the dashboard should exit.
    async fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('r') => self.reload().await,
            KeyCode::Tab => self.state.next_tab(),
            KeyCode::Char('j') | KeyCode::Down => self.state.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.state.scroll_up(),
            _ => {}
        }
        false
    }

    async fn reload(&mut self) {
        match self.store.load().await {
            Ok(project) => self.state.set_project(project),
            Err(e) => debug!(error = %e, "dashboard reload failed; keeping last snapshot"),
        }
    }
}
