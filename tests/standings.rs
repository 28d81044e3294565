use std::cmp::Ordering;

use betpool_terminal::models::{GroupEntry, ScoreboardEntry};
use betpool_terminal::standings::{
    compare_entries, group_standings, position_of, rank_scoreboard, sort_standings,
};
use proptest::prelude::*;

fn entry(id: u64, points: i32, goal_diff: i32, goals_for: i32, won: i32) -> GroupEntry {
    GroupEntry {
        id,
        description: "A".to_string(),
        team_id: id,
        played: 3,
        won,
        lost: 0,
        goals_for,
        goals_against: 0,
        goal_diff,
        points,
    }
}

fn player(id: u64, total_points: i64) -> ScoreboardEntry {
    ScoreboardEntry {
        id,
        name: format!("user {id}"),
        email: format!("user{id}@example.com"),
        total_points,
    }
}

#[test]
fn goal_difference_breaks_points_tie() {
    let mut entries = vec![entry(1, 6, 2, 4, 2), entry(2, 6, 5, 5, 2)];
    sort_standings(&mut entries);
    let ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[test]
fn goals_for_then_wins_break_remaining_ties() {
    let mut entries = vec![
        entry(1, 4, 1, 3, 1),
        entry(2, 4, 1, 5, 1),
        entry(3, 4, 1, 3, 2),
    ];
    sort_standings(&mut entries);
    let ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![2, 3, 1]);
}

#[test]
fn every_team_lands_in_exactly_one_group() {
    let mut raw = vec![entry(1, 3, 0, 1, 1), entry(2, 0, -1, 0, 0), entry(3, 1, 0, 1, 0)];
    raw[1].description = "c".to_string();
    let tables = group_standings(&raw);
    let total: usize = tables.iter().map(|t| t.entries.len()).sum();
    assert_eq!(total, raw.len());
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[1].letter, "C");
}

#[test]
fn scoreboard_ranks_descending_and_finds_position() {
    let mut board = vec![player(1, 5), player(2, 12), player(3, 5), player(4, 0)];
    rank_scoreboard(&mut board);
    let ids: Vec<u64> = board.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![2, 1, 3, 4]);
    assert_eq!(position_of(&board, 3), Some(3));
    assert_eq!(position_of(&board, 99), None);
}

fn arb_entries() -> impl Strategy<Value = Vec<GroupEntry>> {
    prop::collection::vec((0i32..10, -5i32..5, 0i32..6, 0i32..3), 0..24).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(idx, (pts, gd, gf, won))| entry(idx as u64, pts, gd, gf, won))
            .collect()
    })
}

proptest! {
    #[test]
    fn sorted_standings_are_ordered_and_stable(mut entries in arb_entries()) {
        let before = entries.len();
        sort_standings(&mut entries);
        prop_assert_eq!(entries.len(), before);
        for pair in entries.windows(2) {
            match compare_entries(&pair[0], &pair[1]) {
                Ordering::Greater => prop_assert!(false, "out of order: {:?}", pair),
                Ordering::Equal => prop_assert!(pair[0].id < pair[1].id),
                Ordering::Less => {}
            }
        }
    }

    #[test]
    fn ranked_scoreboard_is_descending(points in prop::collection::vec(0i64..50, 0..30)) {
        let mut board: Vec<ScoreboardEntry> = points
            .iter()
            .enumerate()
            .map(|(idx, p)| player(idx as u64, *p))
            .collect();
        rank_scoreboard(&mut board);
        for pair in board.windows(2) {
            prop_assert!(pair[0].total_points >= pair[1].total_points);
            if pair[0].total_points == pair[1].total_points {
                prop_assert!(pair[0].id < pair[1].id);
            }
        }
    }
}
