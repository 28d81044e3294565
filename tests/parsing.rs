use std::fs;
use std::path::PathBuf;

use betpool_terminal::error::ApiError;
use betpool_terminal::models::{
    parse_groups_json, parse_login_json, parse_mass_bets_json, parse_matches_json,
    parse_scoreboard_json, parse_stadium_images_json, parse_teams_json, parse_user_bets_json,
};
use betpool_terminal::session::{Role, Session};

const ADMIN_GREETING: &str = "Bienvenido, Admin User!";

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_wrapped_teams_fixture() {
    let teams = parse_teams_json(&read_fixture("teams.json")).expect("fixture should parse");
    assert_eq!(teams.len(), 3);
    assert_eq!(teams[0].name, "Colombia");
    assert!(teams[0].shield.as_deref().is_some_and(|s| s.starts_with("data:image/")));
    assert_eq!(teams[1].shield, None);
    assert_eq!(teams[2].shield, None);
}

#[test]
fn groups_accept_numeric_strings() {
    let groups = parse_groups_json(&read_fixture("groups.json")).expect("fixture should parse");
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[1].goal_diff, 5);
    assert_eq!(groups[1].points, 6);
    assert_eq!(groups[2].goal_diff, -3);
    assert_eq!(groups[2].description, "b");
}

#[test]
fn parses_user_bets_fixture() {
    let bets = parse_user_bets_json(&read_fixture("user_bets.json")).expect("fixture should parse");
    assert_eq!(bets.len(), 2);

    let open = &bets[0];
    assert_eq!(open.id_bet, Some(501));
    assert_eq!((open.predicted1, open.predicted2), (Some(2), Some(1)));
    assert_eq!(open.points, None);
    assert_eq!(open.schedule.team1.name, "Colombia");
    assert_eq!(
        open.schedule.stadium.as_ref().map(|s| s.name.as_str()),
        Some("El Campin")
    );

    assert_eq!(open.schedule.stadium_name(), Some("El Campin"));
    assert_eq!(open.schedule.stadium_details().as_deref(), Some("El Campin: Bogota"));

    let played = &bets[1];
    assert_eq!(played.predicted1, None);
    assert_eq!(played.points, Some(10));
    assert_eq!(played.schedule.score2, Some(0));
    assert!(played.schedule.stadium.is_none());
    assert_eq!(played.schedule.stadium_name(), None);
}

#[test]
fn user_bets_without_bets_key_is_an_error() {
    let err = parse_user_bets_json(r#"{"data":[]}"#).unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
    let err = parse_user_bets_json("[]").unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[test]
fn scoreboard_points_tolerate_strings_and_null() {
    let board = parse_scoreboard_json(&read_fixture("scoreboard.json")).expect("fixture should parse");
    let points: Vec<i64> = board.iter().map(|e| e.total_points).collect();
    assert_eq!(points, vec![12, 0, 23]);
    assert_eq!(board[2].email, "sofia@example.com");
}

#[test]
fn stadium_images_are_read_from_images_key() {
    let images =
        parse_stadium_images_json(&read_fixture("stadium_images.json")).expect("fixture should parse");
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].stadium_id, Some(4));
    assert!(images[1].image.starts_with("https://"));
}

#[test]
fn parses_mass_bets_fixture() {
    let result = parse_mass_bets_json(&read_fixture("mass_bets.json")).expect("fixture should parse");
    assert_eq!(result.total_bets, 2);
    assert_eq!(result.bets.len(), 2);
    assert_eq!(result.bets[1].user_id, Some(8));
    assert_eq!(result.bets[0].match_id, Some(40));
}

#[test]
fn parses_matches_fixture() {
    let matches = parse_matches_json(&read_fixture("matches.json")).expect("fixture should parse");
    assert_eq!(matches.len(), 2);
    assert!(matches[0].processed);
    assert!(matches[0].has_result());
    assert!(!matches[1].processed);
    assert!(!matches[1].has_result());
}

#[test]
fn login_fixture_builds_admin_session() {
    let resp = parse_login_json(&read_fixture("login.json")).expect("fixture should parse");
    let session = Session::from_login(resp, ADMIN_GREETING).expect("session should build");
    assert_eq!(session.user_id, 1);
    assert_eq!(session.token, "1|abcdef");
    assert_eq!(session.role, Role::Admin);
}

#[test]
fn login_without_user_id_is_refused() {
    let resp = parse_login_json(r#"{"message":"Bienvenido, Ana!","token":"2|xyz","user":{"name":"Ana"}}"#)
        .expect("payload should parse");
    let err = Session::from_login(resp, ADMIN_GREETING).unwrap_err();
    assert!(matches!(err, ApiError::Invalid(_)));
}

#[test]
fn empty_bodies_are_empty_lists() {
    assert!(parse_teams_json("").unwrap().is_empty());
    assert!(parse_scoreboard_json("null").unwrap().is_empty());
    assert_eq!(parse_mass_bets_json("null").unwrap().total_bets, 0);
}
