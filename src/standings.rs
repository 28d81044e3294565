use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{GroupEntry, ScoreboardEntry, UserId};

pub const GROUP_LETTERS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// Descending by points, goal difference, goals for, then wins.
pub fn compare_entries(a: &GroupEntry, b: &GroupEntry) -> Ordering {
    b.points
        .cmp(&a.points)
        .then(b.goal_diff.cmp(&a.goal_diff))
        .then(b.goals_for.cmp(&a.goals_for))
        .then(b.won.cmp(&a.won))
}

/// Stable: entries tied on every key keep their input order.
pub fn sort_standings(entries: &mut [GroupEntry]) {
    entries.sort_by(compare_entries);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTable {
    pub letter: String,
    pub entries: Vec<GroupEntry>,
}

/// Buckets entries by group letter (ordered) and sorts each bucket.
pub fn group_standings(entries: &[GroupEntry]) -> Vec<GroupTable> {
    let mut buckets: BTreeMap<String, Vec<GroupEntry>> = BTreeMap::new();
    for entry in entries {
        let letter = entry.description.trim().to_uppercase();
        buckets.entry(letter).or_default().push(entry.clone());
    }
    buckets
        .into_iter()
        .map(|(letter, mut entries)| {
            sort_standings(&mut entries);
            GroupTable { letter, entries }
        })
        .collect()
}

pub fn parse_group_letter(raw: &str) -> Option<char> {
    let mut chars = raw.trim().chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() {
        return None;
    }
    GROUP_LETTERS.contains(&letter).then_some(letter)
}

/// Leaderboard order: descending total points, stable on ties.
pub fn rank_scoreboard(entries: &mut [ScoreboardEntry]) {
    entries.sort_by(|a, b| b.total_points.cmp(&a.total_points));
}

/// 1-based position of `user_id` in an already ranked board.
pub fn position_of(entries: &[ScoreboardEntry], user_id: UserId) -> Option<usize> {
    entries
        .iter()
        .position(|entry| entry.id == user_id)
        .map(|idx| idx + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, group: &str, points: i32, gd: i32) -> GroupEntry {
        GroupEntry {
            id,
            description: group.to_string(),
            team_id: id,
            played: 3,
            won: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_diff: gd,
            points,
        }
    }

    #[test]
    fn buckets_are_lettered_and_sorted() {
        let tables = group_standings(&[
            entry(1, "b", 3, 0),
            entry(2, "A", 1, 0),
            entry(3, "A", 4, -1),
            entry(4, "B", 6, 2),
        ]);
        let letters: Vec<&str> = tables.iter().map(|t| t.letter.as_str()).collect();
        assert_eq!(letters, vec!["A", "B"]);
        assert_eq!(tables[0].entries[0].id, 3);
        assert_eq!(tables[1].entries[0].id, 4);
    }

    #[test]
    fn group_letter_parsing() {
        assert_eq!(parse_group_letter(" c "), Some('C'));
        assert_eq!(parse_group_letter("H"), Some('H'));
        assert_eq!(parse_group_letter("I"), None);
        assert_eq!(parse_group_letter("AB"), None);
        assert_eq!(parse_group_letter(""), None);
    }
}
