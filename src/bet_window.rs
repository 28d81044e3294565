use chrono::{DateTime, Duration, Local, NaiveDateTime};

/// Bets close this many minutes before kickoff.
pub const BET_CUTOFF_MINUTES: i64 = 10;

/// True iff kickoff is strictly more than the cutoff after `now`.
pub fn can_place_bet(kickoff: NaiveDateTime, now: NaiveDateTime) -> bool {
    kickoff.signed_duration_since(now) > Duration::minutes(BET_CUTOFF_MINUTES)
}

/// Same rule over the raw backend string; unparseable times are never open.
pub fn can_place_bet_at(date_time: Option<&str>, now: NaiveDateTime) -> bool {
    date_time
        .and_then(parse_match_time)
        .is_some_and(|kickoff| can_place_bet(kickoff, now))
}

pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Whole minutes until kickoff, negative once it has passed.
pub fn minutes_until(kickoff: NaiveDateTime, now: NaiveDateTime) -> i64 {
    kickoff.signed_duration_since(now).num_minutes()
}

pub fn parse_match_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    // Offsets are folded into local time so both sides stay comparable.
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

pub fn format_kickoff(raw: Option<&str>) -> String {
    match raw.and_then(parse_match_time) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "N/A".to_string(),
    }
}

/// Short label for the bet window column.
pub fn window_label(date_time: Option<&str>, now: NaiveDateTime) -> String {
    let Some(kickoff) = date_time.and_then(parse_match_time) else {
        return "no time".to_string();
    };
    if can_place_bet(kickoff, now) {
        let mins = minutes_until(kickoff, now) - BET_CUTOFF_MINUTES;
        if mins >= 60 * 24 {
            format!("open {}d", mins / (60 * 24))
        } else if mins >= 60 {
            format!("open {}h", mins / 60)
        } else {
            format!("open {mins}m")
        }
    } else {
        "closed".to_string()
    }
}
