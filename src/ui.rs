use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use betpool_terminal::bet_window::{BET_CUTOFF_MINUTES, format_kickoff, local_now, window_label};
use betpool_terminal::forms::Form;
use betpool_terminal::images::{MAX_STADIUM_IMAGES, is_data_image};
use betpool_terminal::state::{AppState, Page, RowStatus, UNKNOWN_STADIUM};

struct TableRow {
    cells: Vec<String>,
    style: Style,
}

impl TableRow {
    fn plain(cells: Vec<String>) -> Self {
        Self {
            cells,
            style: Style::default(),
        }
    }
}

pub fn ui(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_status_line(frame, chunks[1], state);

    match state.page {
        Page::Login | Page::Register => render_public(frame, chunks[2], state),
        Page::Home => render_home(frame, chunks[2], state),
        Page::Teams => render_teams(frame, chunks[2], state),
        Page::Groups => render_groups(frame, chunks[2], state),
        Page::Stadiums => render_stadiums(frame, chunks[2], state),
        Page::Matches => render_matches(frame, chunks[2], state),
        Page::Bets => render_bets(frame, chunks[2], state),
        Page::MassBets => render_mass_bets(frame, chunks[2], state),
        Page::Standings => render_standings(frame, chunks[2], state),
        Page::Scoreboard => render_scoreboard(frame, chunks[2], state),
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[3]);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[4]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let who = match &state.session {
        Some(s) if s.is_admin() => format!("user #{} (admin)", s.user_id),
        Some(s) => format!("user #{}", s.user_id),
        None => "signed out".to_string(),
    };
    let nav = if state.session.is_some() {
        Page::NAV
            .iter()
            .filter(|p| !p.requires_admin() || state.is_admin())
            .filter_map(|p| p.hotkey().map(|k| format!("{k} {}", p.title())))
            .collect::<Vec<_>>()
            .join("  ")
    } else {
        "F2 switch login/register".to_string()
    };
    format!(" BETPOOL | {} | {who}\n {nav}", state.page.title())
}

fn footer_text(state: &AppState) -> String {
    if state.form.is_some() {
        let mut keys = "Tab/↑/↓ Field | ←/→ Choose | Space Toggle | Enter Submit".to_string();
        if state.page.is_public() {
            keys.push_str(" | F2 Login/Register");
        } else {
            keys.push_str(" | Esc Cancel");
        }
        keys.push_str(" | Ctrl-C Quit");
        return keys;
    }
    let page_keys = match state.page {
        Page::Teams | Page::Matches => "n New | e Edit | ",
        Page::Groups => "n Assign | ",
        Page::Stadiums => "n New | e Edit | Enter Images | ",
        Page::Bets => "e/Enter Bet | ",
        Page::MassBets => "g Generate | ",
        Page::Standings | Page::Scoreboard => "x Export | ",
        _ => "",
    };
    let process = if state.page == Page::Matches {
        "p Process | "
    } else {
        ""
    };
    format!("j/k Move | {page_keys}{process}r Refresh | o Logout | ? Help | q Quit")
}

fn render_status_line(frame: &mut Frame, area: Rect, state: &AppState) {
    let status = state.status(state.page);
    let (text, style) = if let Some(err) = status.error {
        (err, Style::default().fg(Color::Red))
    } else if status.submitting {
        ("Saving...".to_string(), Style::default().fg(Color::Yellow))
    } else if status.loading {
        ("Loading...".to_string(), Style::default().fg(Color::Yellow))
    } else if let Some(notice) = status.notice {
        (notice, Style::default().fg(Color::Green))
    } else {
        (String::new(), Style::default())
    };
    frame.render_widget(Paragraph::new(format!(" {text}")).style(style), area);
}

/// Splits off a right-hand form panel when a form is open.
fn with_form_panel(frame: &mut Frame, area: Rect, state: &AppState) -> Rect {
    let Some(form) = &state.form else {
        return area;
    };
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(48)])
        .split(area);
    render_form(frame, cols[1], form);
    cols[0]
}

fn render_form(frame: &mut Frame, area: Rect, form: &Form) {
    let mut lines = Vec::new();
    for (idx, field) in form.fields.iter().enumerate() {
        let focused = idx == form.focus;
        let style = if focused {
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan)
        } else {
            Style::default()
        };
        let marker = if focused { "> " } else { "  " };
        lines.push(Line::styled(format!("{marker}{}", field.label), style));
        lines.push(Line::raw(format!("    {}", field.display())));
    }
    let form_widget = Paragraph::new(lines)
        .block(Block::default().title(form.title.clone()).borders(Borders::ALL));
    frame.render_widget(form_widget, area);
}

fn render_public(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup = centered_rect(50, 70, area);
    frame.render_widget(Clear, popup);
    if let Some(form) = &state.form {
        render_form(frame, popup, form);
    }
}

fn render_home(frame: &mut Frame, area: Rect, _state: &AppState) {
    let cutoff = format!(
        "  Bets can be created or changed until {BET_CUTOFF_MINUTES} minutes before kickoff."
    );
    let text = [
        "Pool rules",
        "",
        cutoff.as_str(),
        "",
        "  Exact score ............ 10 points",
        "  Correct outcome ........  3 points",
        "  One team's score right .  1 point",
        "",
        "Prizes",
        "  1st place 70% | 2nd place 20% | 3rd place 10%",
    ]
    .join("\n");
    let home = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Home").borders(Borders::ALL));
    frame.render_widget(home, area);
}

fn render_teams(frame: &mut Frame, area: Rect, state: &AppState) {
    let area = with_form_panel(frame, area, state);
    let rows = state
        .teams
        .iter()
        .map(|team| {
            let shield = match team.shield.as_deref() {
                Some(s) if is_data_image(s) => "image",
                Some(s) if !s.is_empty() => "invalid",
                _ => "-",
            };
            TableRow::plain(vec![team.id.to_string(), team.name.clone(), shield.to_string()])
        })
        .collect::<Vec<_>>();
    render_table(
        frame,
        area,
        "Teams",
        &["ID", "Name", "Shield"],
        &[Constraint::Length(6), Constraint::Min(20), Constraint::Length(8)],
        &rows,
        Some(state.selected),
        "No teams yet (n to create)",
    );
}

fn render_groups(frame: &mut Frame, area: Rect, state: &AppState) {
    let area = with_form_panel(frame, area, state);
    render_group_tables(frame, area, state, "Groups");
}

fn render_standings(frame: &mut Frame, area: Rect, state: &AppState) {
    render_group_tables(frame, area, state, "Standings");
}

fn render_group_tables(frame: &mut Frame, area: Rect, state: &AppState, title: &str) {
    let tables = state.group_tables();
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    if tables.is_empty() {
        let empty = Paragraph::new("No group entries yet")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let mut lines = Vec::new();
    let (start, _) = visible_range(state.selected, tables.len(), 1);
    for (idx, table) in tables.iter().enumerate().skip(start) {
        let style = if idx == state.selected {
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        lines.push(Line::styled(
            format!(
                "Group {:<22} {:>3} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4}",
                table.letter, "PJ", "PG", "PP", "GF", "GC", "DG", "Pts"
            ),
            style,
        ));
        for (pos, entry) in table.entries.iter().enumerate() {
            let name = state.team_name(entry.team_id);
            lines.push(Line::raw(format!(
                "{:>2}. {:<22} {:>3} {:>3} {:>3} {:>3} {:>3} {:>+4} {:>4}",
                pos + 1,
                truncate(name, 22),
                entry.played,
                entry.won,
                entry.lost,
                entry.goals_for,
                entry.goals_against,
                entry.goal_diff,
                entry.points
            )));
        }
        lines.push(Line::raw(""));
    }
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_stadiums(frame: &mut Frame, area: Rect, state: &AppState) {
    let area = with_form_panel(frame, area, state);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(30)])
        .split(area);

    let rows = state
        .stadiums
        .iter()
        .map(|s| {
            TableRow::plain(vec![
                s.id.to_string(),
                s.name.clone(),
                s.characteristics.clone(),
            ])
        })
        .collect::<Vec<_>>();
    render_table(
        frame,
        cols[0],
        "Stadiums",
        &["ID", "Name", "Characteristics"],
        &[Constraint::Length(6), Constraint::Length(24), Constraint::Min(10)],
        &rows,
        Some(state.selected),
        "No stadiums yet (n to create)",
    );

    let text = match state.selected_stadium() {
        Some(stadium) => match state.stadium_images.get(&stadium.id) {
            Some(images) => {
                let mut lines = vec![format!("{}/{MAX_STADIUM_IMAGES} images", images.len())];
                for img in images {
                    let kind = if is_data_image(&img.image) {
                        "ok"
                    } else {
                        "invalid"
                    };
                    lines.push(format!("#{} {kind}", img.id));
                }
                lines.join("\n")
            }
            None => "Enter to load images".to_string(),
        },
        None => "No stadium selected".to_string(),
    };
    let images = Paragraph::new(text).block(Block::default().title("Images").borders(Borders::ALL));
    frame.render_widget(images, cols[1]);
}

fn render_matches(frame: &mut Frame, area: Rect, state: &AppState) {
    let area = with_form_panel(frame, area, state);
    let rows = state
        .matches
        .iter()
        .map(|m| {
            let score = match (m.score1, m.score2) {
                (Some(a), Some(b)) => format!("{a}-{b}"),
                _ => "-".to_string(),
            };
            let (row_text, style) = row_status_cell(state.match_rows.get(&m.id));
            TableRow {
                cells: vec![
                    format_kickoff(Some(&m.date_time)),
                    state.match_title(m),
                    state.stadium_name(m.stadium_id).to_string(),
                    score,
                    if m.processed { "yes" } else { "no" }.to_string(),
                    row_text,
                ],
                style,
            }
        })
        .collect::<Vec<_>>();
    render_table(
        frame,
        area,
        "Matches",
        &["Kickoff", "Match", "Stadium", "Score", "Done", "Status"],
        &[
            Constraint::Length(17),
            Constraint::Min(24),
            Constraint::Length(18),
            Constraint::Length(6),
            Constraint::Length(5),
            Constraint::Length(24),
        ],
        &rows,
        Some(state.selected),
        "No matches scheduled (n to create)",
    );
}

fn render_bets(frame: &mut Frame, area: Rect, state: &AppState) {
    let area = with_form_panel(frame, area, state);
    let now = local_now();
    let rows = state
        .bets
        .iter()
        .map(|row| {
            let s = &row.schedule;
            let pair = |a: Option<u32>, b: Option<u32>| match (a, b) {
                (Some(a), Some(b)) => format!("{a}-{b}"),
                _ => "-".to_string(),
            };
            let (row_text, style) = row_status_cell(state.bet_rows.get(&row.id));
            let status = if row_text.is_empty() {
                window_label(s.date_time.as_deref(), now)
            } else {
                row_text
            };
            TableRow {
                cells: vec![
                    format_kickoff(s.date_time.as_deref()),
                    format!("{} vs {}", s.team1.name, s.team2.name),
                    s.stadium_name().unwrap_or(UNKNOWN_STADIUM).to_string(),
                    pair(row.predicted1, row.predicted2),
                    pair(s.score1, s.score2),
                    row.points.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
                    status,
                ],
                style,
            }
        })
        .collect::<Vec<_>>();
    let title = match state.selected_bet().and_then(|row| row.schedule.stadium_details()) {
        Some(details) => format!("My bets | {}", truncate(&details, 60)),
        None => "My bets".to_string(),
    };
    render_table(
        frame,
        area,
        &title,
        &["Kickoff", "Match", "Stadium", "Bet", "Result", "Pts", "Window"],
        &[
            Constraint::Length(17),
            Constraint::Min(24),
            Constraint::Length(18),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(4),
            Constraint::Length(24),
        ],
        &rows,
        Some(state.selected),
        "No bets yet",
    );
}

fn render_mass_bets(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(result) = &state.mass_bets else {
        let empty = Paragraph::new("Press g to generate bets for every user and match")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title("Mass bets").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };
    let rows = result
        .bets
        .iter()
        .map(|bet| {
            let opt = |v: Option<u64>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
            TableRow::plain(vec![
                bet.id.to_string(),
                opt(bet.user_id),
                opt(bet.match_id),
                match (bet.score1, bet.score2) {
                    (Some(a), Some(b)) => format!("{a}-{b}"),
                    _ => "-".to_string(),
                },
                bet.created_at.clone().unwrap_or_default(),
            ])
        })
        .collect::<Vec<_>>();
    render_table(
        frame,
        area,
        &format!("Mass bets ({} total)", result.total_bets),
        &["Bet", "User", "Match", "Score", "Created"],
        &[
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Min(20),
        ],
        &rows,
        Some(state.selected),
        "The backend created no bets",
    );
}

fn render_scoreboard(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);
    let mine = match state.my_position() {
        Some((pos, points)) => format!(" Your position: {pos} with {points} points"),
        None => " You are not on the scoreboard yet".to_string(),
    };
    frame.render_widget(
        Paragraph::new(mine).style(Style::default().add_modifier(Modifier::BOLD)),
        sections[0],
    );

    let me = state.session.as_ref().map(|s| s.user_id);
    let rows = state
        .scoreboard
        .iter()
        .enumerate()
        .map(|(idx, entry)| TableRow {
            cells: vec![
                (idx + 1).to_string(),
                entry.name.clone(),
                entry.email.clone(),
                entry.total_points.to_string(),
            ],
            style: if Some(entry.id) == me {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            },
        })
        .collect::<Vec<_>>();
    render_table(
        frame,
        sections[1],
        "Scoreboard",
        &["#", "Name", "Email", "Points"],
        &[
            Constraint::Length(4),
            Constraint::Min(20),
            Constraint::Min(24),
            Constraint::Length(7),
        ],
        &rows,
        Some(state.selected),
        "No scores yet",
    );
}

fn row_status_cell(status: Option<&RowStatus>) -> (String, Style) {
    match status {
        Some(RowStatus::Pending) => ("working...".to_string(), Style::default().fg(Color::Yellow)),
        Some(RowStatus::Saved(msg)) => (msg.clone(), Style::default().fg(Color::Green)),
        Some(RowStatus::Failed(msg)) => (msg.clone(), Style::default().fg(Color::Red)),
        None => (String::new(), Style::default()),
    }
}

#[allow(clippy::too_many_arguments)]
fn render_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    headers: &[&str],
    widths: &[Constraint],
    rows: &[TableRow],
    selected: Option<usize>,
    empty_text: &str,
) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let header_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(sections[0]);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    for (col, header) in header_cols.iter().zip(headers) {
        render_cell_text(frame, *col, header, bold);
    }

    let list_area = sections[1];
    if rows.is_empty() {
        let empty = Paragraph::new(empty_text.to_string()).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let visible = list_area.height as usize;
    let (start, end) = visible_range(selected.unwrap_or(0), rows.len(), visible);
    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let row = &rows[idx];
        let is_selected = selected == Some(idx);
        let style = if is_selected {
            row.style.bg(Color::DarkGray)
        } else {
            row.style
        };
        if is_selected {
            frame.render_widget(Block::default().style(style), row_area);
        }
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);
        for (col, cell) in cols.iter().zip(&row.cells) {
            render_cell_text(frame, *col, cell, style);
        }
    }
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text.to_string()).style(style);
    frame.render_widget(paragraph, text_area);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = s.chars().take(max.saturating_sub(1)).collect::<String>();
    out.push('…');
    out
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No activity yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Betpool Terminal - Help",
        "",
        "Global:",
        "  1-9          Pages (admin pages hidden for bettors)",
        "  j/k or ↑/↓   Move selection",
        "  r            Refresh page",
        "  o            Log out",
        "  ?            Toggle help",
        "  q / Ctrl-C   Quit",
        "",
        "Lists:",
        "  n            New (teams, groups, stadiums, matches)",
        "  e            Edit selected row / place bet",
        "  p            Process selected match",
        "  g            Generate mass bets",
        "  x            Export standings + scoreboard (.xlsx)",
        "",
        "Forms:",
        "  Tab/Shift-Tab Next/previous field",
        "  ←/→          Change choice, Space toggles",
        "  Enter        Submit, Esc cancels",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
