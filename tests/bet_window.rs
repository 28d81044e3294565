use betpool_terminal::bet_window::{BET_CUTOFF_MINUTES, can_place_bet, can_place_bet_at};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use rstest::rstest;

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 14)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

#[rstest]
#[case::well_before(at(12, 0, 0), true)]
#[case::fifteen_minutes(at(13, 45, 0), true)]
#[case::eleven_minutes(at(13, 49, 0), true)]
#[case::one_second_past_cutoff(at(13, 49, 59), true)]
#[case::exactly_at_cutoff(at(13, 50, 0), false)]
#[case::inside_cutoff(at(13, 50, 1), false)]
#[case::at_kickoff(at(14, 0, 0), false)]
#[case::after_kickoff(at(15, 30, 0), false)]
fn two_pm_kickoff(#[case] now: NaiveDateTime, #[case] open: bool) {
    assert_eq!(can_place_bet(at(14, 0, 0), now), open);
    assert_eq!(can_place_bet_at(Some("2025-06-14 14:00:00"), now), open);
}

proptest! {
    #[test]
    fn open_exactly_when_more_than_cutoff_remains(offset in -86_400i64..86_400) {
        let now = at(12, 0, 0);
        let kickoff = now + Duration::seconds(offset);
        prop_assert_eq!(can_place_bet(kickoff, now), offset > BET_CUTOFF_MINUTES * 60);
    }

    #[test]
    fn backend_string_agrees_with_parsed_time(minutes in -600i64..600) {
        let now = at(12, 0, 0);
        let kickoff = now + Duration::minutes(minutes);
        let raw = kickoff.format("%Y-%m-%d %H:%M:%S").to_string();
        prop_assert_eq!(can_place_bet_at(Some(&raw), now), can_place_bet(kickoff, now));
    }
}
