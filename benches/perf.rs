use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use betpool_terminal::models::{
    GroupEntry, ScoreboardEntry, parse_scoreboard_json, parse_user_bets_json,
};
use betpool_terminal::standings::{group_standings, rank_scoreboard};
use betpool_terminal::state::{AppState, Delta, apply_delta};

fn sample_groups() -> Vec<GroupEntry> {
    let letters = ["A", "B", "C", "D", "E", "F", "G", "H"];
    (0..32u64)
        .map(|id| GroupEntry {
            id,
            description: letters[(id % 8) as usize].to_string(),
            team_id: id,
            played: 3,
            won: (id % 4) as i32,
            lost: 3 - (id % 4) as i32,
            goals_for: (id % 7) as i32,
            goals_against: (id % 5) as i32,
            goal_diff: (id % 7) as i32 - (id % 5) as i32,
            points: 3 * (id % 4) as i32,
        })
        .collect()
}

fn sample_scoreboard() -> Vec<ScoreboardEntry> {
    (1..=500u64)
        .map(|id| ScoreboardEntry {
            id,
            name: format!("user {id}"),
            email: format!("user{id}@example.com"),
            total_points: ((id * 37) % 101) as i64,
        })
        .collect()
}

fn bench_group_standings(c: &mut Criterion) {
    let groups = sample_groups();
    c.bench_function("group_standings", |b| {
        b.iter(|| {
            let tables = group_standings(black_box(&groups));
            black_box(tables.len());
        })
    });
}

fn bench_rank_scoreboard(c: &mut Criterion) {
    let board = sample_scoreboard();
    c.bench_function("rank_scoreboard", |b| {
        b.iter(|| {
            let mut ranked = board.clone();
            rank_scoreboard(black_box(&mut ranked));
            black_box(ranked.first().map(|e| e.id));
        })
    });
}

fn bench_user_bets_parse(c: &mut Criterion) {
    c.bench_function("user_bets_parse", |b| {
        b.iter(|| {
            let rows = parse_user_bets_json(black_box(USER_BETS_JSON)).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_scoreboard_parse(c: &mut Criterion) {
    c.bench_function("scoreboard_parse", |b| {
        b.iter(|| {
            let rows = parse_scoreboard_json(black_box(SCOREBOARD_JSON)).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_bets_delta(c: &mut Criterion) {
    let rows = parse_user_bets_json(USER_BETS_JSON).expect("valid fixture json");
    let many: Vec<_> = (0..100).flat_map(|_| rows.iter().cloned()).collect();
    c.bench_function("bets_delta_apply", |b| {
        b.iter(|| {
            let mut state = AppState::default();
            apply_delta(&mut state, Delta::Bets(black_box(many.clone())));
            black_box(state.bets.len());
        })
    });
}

criterion_group!(
    perf,
    bench_group_standings,
    bench_rank_scoreboard,
    bench_user_bets_parse,
    bench_scoreboard_parse,
    bench_bets_delta
);
criterion_main!(perf);

static USER_BETS_JSON: &str = include_str!("../tests/fixtures/user_bets.json");
static SCOREBOARD_JSON: &str = include_str!("../tests/fixtures/scoreboard.json");
