//! Dashboard rendering
//!
//! Draws the UI from DashboardState; never modifies it.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, Wrap};

use crate::domain::{Phase, ProjectState, TaskStatus};

use super::state::{DashboardState, Tab};

fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Idle => Color::DarkGray,
        Phase::Planning => Color::Cyan,
        Phase::AwaitingClarification => Color::Yellow,
        Phase::AwaitingApproval | Phase::AwaitingExecutionApproval => Color::Magenta,
        Phase::Executing => Color::Green,
        Phase::Paused => Color::Yellow,
        Phase::Completed => Color::LightGreen,
        Phase::Error => Color::Red,
    }
}

fn status_style(status: TaskStatus) -> Style {
    let color = match status {
        TaskStatus::Pending => Color::Yellow,
        TaskStatus::InProgress => Color::Green,
        TaskStatus::Completed => Color::LightGreen,
        TaskStatus::Failed => Color::Red,
    };
    Style::default().fg(color)
}

/// Main render entry point.
pub fn render(state: &DashboardState, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    render_header(state, frame, chunks[0]);

    match &state.project {
        Some(project) => match state.tab {
            Tab::Tasks => render_tasks(project, state.scroll, frame, chunks[1]),
            Tab::Approvals => render_approvals(project, frame, chunks[1]),
            Tab::Discussion => render_discussion(project, state.scroll, frame, chunks[1]),
        },
        None => render_empty(frame, chunks[1]),
    }

    render_footer(state, frame, chunks[2]);
}

fn render_header(state: &DashboardState, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(
        " Helmsman ",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];

    if let Some(project) = &state.project {
        spans.push(Span::raw("│ "));
        spans.push(Span::raw(project.project_id.clone()));
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            project.phase.to_string(),
            Style::default()
                .fg(phase_color(project.phase))
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" │ v{}", project.version),
            Style::default().fg(Color::DarkGray),
        ));
        if let Some(exec) = &project.execution {
            spans.push(Span::styled(
                format!(
                    " │ tasks {}/{} done, {} failed",
                    exec.summary.completed, exec.summary.total, exec.summary.failed
                ),
                Style::default().fg(Color::DarkGray),
            ));
        }
    } else {
        spans.push(Span::styled(
            "│ no project",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn render_empty(frame: &mut Frame, area: Rect) {
    let text = Paragraph::new("No project in this store yet. Run `helmsman init <goal>`.")
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(text, area);
}

fn render_tasks(project: &ProjectState, scroll: usize, frame: &mut Frame, area: Rect) {
    let rows: Vec<Row> = project
        .pending_tasks
        .iter()
        .skip(scroll)
        .map(|task| {
            let title = task
                .input
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("(planning round)");
            Row::new(vec![
                Span::raw(short(&task.id, 18)),
                Span::raw(format!("{:?}", task.kind).to_lowercase()),
                Span::styled(task.status.to_string(), status_style(task.status)),
                Span::raw(title.to_string()),
                Span::raw(task.dispatched_at.clone().unwrap_or_default()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Min(20),
            Constraint::Length(26),
        ],
    )
    .header(
        Row::new(vec!["ID", "TYPE", "STATUS", "TITLE", "DISPATCHED"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Tasks ({}) ", project.pending_tasks.len())),
    );
    frame.render_widget(table, area);
}

fn render_approvals(project: &ProjectState, frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    if project.approvals.is_empty() {
        lines.push(Line::from(Span::styled(
            "No pending approvals.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for approval in &project.approvals {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", approval.kind),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ),
            Span::raw(approval.id.clone()),
        ]));
        if let Some(plan_id) = &approval.plan_id {
            lines.push(Line::from(Span::raw(format!("  plan: {}", plan_id))));
        }
        if let Some(task_ids) = &approval.task_ids {
            lines.push(Line::from(Span::raw(format!("  tasks: {}", task_ids.len()))));
        }
        lines.push(Line::from(""));
    }

    // Open clarifications sit with approvals: both wait on the user
    for clarification in &project.clarifications {
        if clarification.is_answered() {
            continue;
        }
        lines.push(Line::from(Span::styled(
            "open clarification",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        for question in &clarification.questions {
            lines.push(Line::from(Span::raw(format!("  Q: {}", question))));
        }
        lines.push(Line::from(Span::styled(
            format!("  answer with: helmsman answer --clarification-id {} <answers>", clarification.id),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(""));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Approvals "))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_discussion(project: &ProjectState, scroll: usize, frame: &mut Frame, area: Rect) {
    let lines: Vec<Line> = project
        .discussion
        .iter()
        .rev()
        .skip(scroll)
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    format!("{} ", entry.timestamp),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("[{}] ", entry.kind),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(entry.message.clone()),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Discussion ({}) ", project.discussion.len())),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_footer(state: &DashboardState, frame: &mut Frame, area: Rect) {
    let spans = vec![
        Span::styled(" tab ", Style::default().fg(Color::Cyan)),
        Span::raw(format!("{} │ ", state.tab.title())),
        Span::styled("j/k", Style::default().fg(Color::Cyan)),
        Span::raw(" scroll │ "),
        Span::styled("r", Style::default().fg(Color::Cyan)),
        Span::raw(" reload │ "),
        Span::styled("q", Style::default().fg(Color::Cyan)),
        Span::raw(" quit"),
    ];
    let footer = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

fn short(id: &str, max: usize) -> String {
    if id.len() <= max {
        id.to_string()
    } else {
        format!("{}…", &id[..max.saturating_sub(1)])
    }
}
