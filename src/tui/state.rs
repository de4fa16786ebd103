//! Dashboard view state
//!
//! A read-only view model over committed project snapshots. The dashboard
//! never mutates project state; it just reloads the store.

use crate::domain::ProjectState;

/// Which pane is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Tasks,
    Approvals,
    Discussion,
}

impl Tab {
    pub fn next(self) -> Self {
        match self {
            Self::Tasks => Self::Approvals,
            Self::Approvals => Self::Discussion,
            Self::Discussion => Self::Tasks,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Tasks => "Tasks",
            Self::Approvals => "Approvals",
            Self::Discussion => "Discussion",
        }
    }
}

pub struct DashboardState {
    /// Latest committed snapshot, if a project exists.
    pub project: Option<ProjectState>,
    pub tab: Tab,
    /// Scroll offset within the focused pane.
    pub scroll: usize,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            project: None,
            tab: Tab::Tasks,
            scroll: 0,
        }
    }

    pub fn set_project(&mut self, project: Option<ProjectState>) {
        self.project = project;
    }

    pub fn next_tab(&mut self) {
        self.tab = self.tab.next();
        self.scroll = 0;
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}
