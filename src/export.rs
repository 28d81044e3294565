use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::models::{GroupEntry, ScoreboardEntry, Team};
use crate::standings::{self, GroupTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub standings_rows: usize,
    pub scoreboard_rows: usize,
}

pub fn export_workbook(
    path: &Path,
    groups: &[GroupEntry],
    teams: &[Team],
    scoreboard: &[ScoreboardEntry],
) -> Result<ExportReport> {
    let tables = standings::group_standings(groups);
    let standings = standings_rows(&tables, teams);

    let mut ranked = scoreboard.to_vec();
    standings::rank_scoreboard(&mut ranked);
    let board = scoreboard_rows(&ranked);

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create export dir {}", dir.display()))?;
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Standings")?;
        write_rows(sheet, &standings)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Scoreboard")?;
        write_rows(sheet, &board)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        standings_rows: standings.len().saturating_sub(1),
        scoreboard_rows: board.len().saturating_sub(1),
    })
}

pub fn standings_rows(tables: &[GroupTable], teams: &[Team]) -> Vec<Vec<String>> {
    let mut rows = vec![
        ["Group", "Pos", "Team", "PJ", "PG", "PP", "GF", "GC", "DG", "Pts"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>(),
    ];
    for table in tables {
        for (idx, entry) in table.entries.iter().enumerate() {
            let team = teams
                .iter()
                .find(|t| t.id == entry.team_id)
                .map(|t| t.name.clone())
                .unwrap_or_else(|| format!("team #{}", entry.team_id));
            rows.push(vec![
                table.letter.clone(),
                (idx + 1).to_string(),
                team,
                entry.played.to_string(),
                entry.won.to_string(),
                entry.lost.to_string(),
                entry.goals_for.to_string(),
                entry.goals_against.to_string(),
                entry.goal_diff.to_string(),
                entry.points.to_string(),
            ]);
        }
    }
    rows
}

/// Expects an already ranked board.
pub fn scoreboard_rows(entries: &[ScoreboardEntry]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Pos".to_string(),
        "Name".to_string(),
        "Email".to_string(),
        "Points".to_string(),
    ]];
    rows.extend(entries.iter().enumerate().map(|(idx, entry)| {
        vec![
            (idx + 1).to_string(),
            entry.name.clone(),
            entry.email.clone(),
            entry.total_points.to_string(),
        ]
    }));
    rows
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standings_rows_use_team_names_and_positions() {
        let groups = vec![
            GroupEntry {
                id: 1,
                description: "A".to_string(),
                team_id: 10,
                played: 1,
                won: 0,
                lost: 1,
                goals_for: 0,
                goals_against: 2,
                goal_diff: -2,
                points: 0,
            },
            GroupEntry {
                id: 2,
                description: "A".to_string(),
                team_id: 20,
                played: 1,
                won: 1,
                lost: 0,
                goals_for: 2,
                goals_against: 0,
                goal_diff: 2,
                points: 3,
            },
        ];
        let teams = vec![Team {
            id: 20,
            name: "Brasil".to_string(),
            shield: None,
        }];
        let rows = standings_rows(&standings::group_standings(&groups), &teams);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][..3], ["A", "1", "Brasil"]);
        assert_eq!(rows[2][2], "team #10");
        assert_eq!(rows[1][9], "3");
    }
}
