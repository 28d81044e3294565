use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

pub type TeamId = u64;
pub type MatchId = u64;
pub type StadiumId = u64;
pub type UserId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default, rename = "team_shield")]
    pub shield: Option<String>,
}

/// One team's row inside a group (A-H) as the backend aggregates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub id: u64,
    pub description: String,
    #[serde(rename = "id_team", deserialize_with = "de_u64")]
    pub team_id: TeamId,
    #[serde(rename = "PJ", default, deserialize_with = "de_i32")]
    pub played: i32,
    #[serde(rename = "PG", default, deserialize_with = "de_i32")]
    pub won: i32,
    #[serde(rename = "PP", default, deserialize_with = "de_i32")]
    pub lost: i32,
    #[serde(rename = "GF", default, deserialize_with = "de_i32")]
    pub goals_for: i32,
    #[serde(rename = "GC", default, deserialize_with = "de_i32")]
    pub goals_against: i32,
    #[serde(rename = "DG", default, deserialize_with = "de_i32")]
    pub goal_diff: i32,
    #[serde(rename = "Points", default, deserialize_with = "de_i32")]
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stadium {
    pub id: StadiumId,
    pub name: String,
    #[serde(default)]
    pub characteristics: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StadiumImage {
    pub id: u64,
    #[serde(default)]
    pub image: String,
    #[serde(default, rename = "id_stadium")]
    pub stadium_id: Option<StadiumId>,
}

/// A scheduled match (`schedule_results` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    #[serde(rename = "id_team_1", deserialize_with = "de_u64")]
    pub team1_id: TeamId,
    #[serde(rename = "id_team_2", deserialize_with = "de_u64")]
    pub team2_id: TeamId,
    #[serde(rename = "id_stadium", default, deserialize_with = "de_opt_u64")]
    pub stadium_id: Option<StadiumId>,
    #[serde(default)]
    pub date_time: String,
    #[serde(rename = "score_team1", default, deserialize_with = "de_opt_u32")]
    pub score1: Option<u32>,
    #[serde(rename = "score_team2", default, deserialize_with = "de_opt_u32")]
    pub score2: Option<u32>,
    #[serde(rename = "procesado", default, deserialize_with = "de_flag")]
    pub processed: bool,
}

impl Match {
    pub fn has_result(&self) -> bool {
        self.score1.is_some() && self.score2.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    #[serde(default)]
    pub id: Option<TeamId>,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "team_shield")]
    pub shield: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StadiumRef {
    #[serde(default)]
    pub id: Option<StadiumId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub characteristics: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetSchedule {
    pub id: MatchId,
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(rename = "score_team1", default, deserialize_with = "de_opt_u32")]
    pub score1: Option<u32>,
    #[serde(rename = "score_team2", default, deserialize_with = "de_opt_u32")]
    pub score2: Option<u32>,
    pub team1: TeamRef,
    pub team2: TeamRef,
    #[serde(default)]
    pub stadium: Option<StadiumRef>,
}

impl BetSchedule {
    pub fn stadium_name(&self) -> Option<&str> {
        self.stadium
            .as_ref()
            .map(|s| s.name.trim())
            .filter(|name| !name.is_empty())
    }

    /// `name: characteristics`, or just the name when there are none.
    pub fn stadium_details(&self) -> Option<String> {
        let name = self.stadium_name()?;
        let about = self
            .stadium
            .as_ref()
            .map(|s| s.characteristics.trim())
            .unwrap_or_default();
        Some(if about.is_empty() {
            name.to_string()
        } else {
            format!("{name}: {about}")
        })
    }
}

/// A bet from `GET /users/{id}/bets`, with its match embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetRow {
    pub id: u64,
    #[serde(default)]
    pub id_bet: Option<u64>,
    #[serde(rename = "score_team1", default, deserialize_with = "de_opt_u32")]
    pub predicted1: Option<u32>,
    #[serde(rename = "score_team2", default, deserialize_with = "de_opt_u32")]
    pub predicted2: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_i32")]
    pub points: Option<i32>,
    pub schedule: BetSchedule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MassBet {
    pub id: u64,
    #[serde(rename = "id_user", default, deserialize_with = "de_opt_u64")]
    pub user_id: Option<UserId>,
    #[serde(rename = "id_schedule", default, deserialize_with = "de_opt_u64")]
    pub match_id: Option<MatchId>,
    #[serde(rename = "score_team1", default, deserialize_with = "de_opt_u32")]
    pub score1: Option<u32>,
    #[serde(rename = "score_team2", default, deserialize_with = "de_opt_u32")]
    pub score2: Option<u32>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MassBetsResult {
    #[serde(default)]
    pub bets: Vec<MassBet>,
    #[serde(default, deserialize_with = "de_u64_or_zero")]
    pub total_bets: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreboardEntry {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "de_points")]
    pub total_points: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<LoginUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub phone_number: String,
    pub birthday: String,
    pub role: String,
}

pub const REGISTER_DEFAULT_PHONE: &str = "1234567890";
pub const REGISTER_DEFAULT_BIRTHDAY: &str = "1990-01-01";
pub const REGISTER_DEFAULT_ROLE: &str = "Bet_User";

impl RegisterRequest {
    pub fn with_defaults(name: &str, email: &str, password: &str, confirmation: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
            password_confirmation: confirmation.to_string(),
            phone_number: REGISTER_DEFAULT_PHONE.to_string(),
            birthday: REGISTER_DEFAULT_BIRTHDAY.to_string(),
            role: REGISTER_DEFAULT_ROLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTeam {
    pub id_tournament: u64,
    pub name: String,
    pub team_shield: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamUpdate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_shield: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(non_snake_case)]
pub struct NewGroupEntry {
    pub description: String,
    pub id_team: TeamId,
    pub GF: i32,
    pub GC: i32,
    pub DG: i32,
    pub Points: i32,
    pub PJ: i32,
    pub PG: i32,
    pub PP: i32,
}

impl NewGroupEntry {
    pub fn empty(letter: char, team_id: TeamId) -> Self {
        Self {
            description: letter.to_string(),
            id_team: team_id,
            GF: 0,
            GC: 0,
            DG: 0,
            Points: 0,
            PJ: 0,
            PG: 0,
            PP: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StadiumPayload {
    pub name: String,
    pub characteristics: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewStadiumImage {
    pub image: String,
    pub id_stadium: StadiumId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMatch {
    pub id_team_1: TeamId,
    pub id_team_2: TeamId,
    pub id_stadium: StadiumId,
    pub date_time: String,
    pub score_team1: Option<u32>,
    pub score_team2: Option<u32>,
    pub procesado: u8,
}

/// Partial `PUT /schedule_results/{id}` body; absent fields are left untouched.
/// Scores are doubly optional: `Some(None)` goes out as `null` and clears the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_team1: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_team2: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procesado: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_stadium: Option<StadiumId>,
}

impl MatchUpdate {
    pub fn mark_processed() -> Self {
        Self {
            procesado: Some(1),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BetUpdate {
    pub id_user: UserId,
    pub id_schedule: MatchId,
    pub score_team1: u32,
    pub score_team2: u32,
}

pub fn parse_teams_json(raw: &str) -> ApiResult<Vec<Team>> {
    parse_list_json(raw, &["data"])
}

pub fn parse_groups_json(raw: &str) -> ApiResult<Vec<GroupEntry>> {
    parse_list_json(raw, &["data"])
}

pub fn parse_stadiums_json(raw: &str) -> ApiResult<Vec<Stadium>> {
    parse_list_json(raw, &["data"])
}

pub fn parse_stadium_images_json(raw: &str) -> ApiResult<Vec<StadiumImage>> {
    parse_list_json(raw, &["images", "data"])
}

pub fn parse_matches_json(raw: &str) -> ApiResult<Vec<Match>> {
    parse_list_json(raw, &["data"])
}

pub fn parse_scoreboard_json(raw: &str) -> ApiResult<Vec<ScoreboardEntry>> {
    parse_list_json(raw, &["data"])
}

/// `GET /users/{id}/bets` answers `{ "bets": [...] }`; anything else is a format error.
pub fn parse_user_bets_json(raw: &str) -> ApiResult<Vec<BetRow>> {
    let root = parse_root(raw)?;
    match root.get("bets") {
        Some(bets @ Value::Array(_)) => Ok(serde_json::from_value(bets.clone())?),
        _ => Err(ApiError::Decode(
            "expected a `bets` array in the response".to_string(),
        )),
    }
}

pub fn parse_mass_bets_json(raw: &str) -> ApiResult<MassBetsResult> {
    let root = parse_root(raw)?;
    if root.is_null() {
        return Ok(MassBetsResult::default());
    }
    Ok(serde_json::from_value(root)?)
}

pub fn parse_login_json(raw: &str) -> ApiResult<LoginResponse> {
    Ok(serde_json::from_str(raw.trim())?)
}

/// Single-object responses, optionally wrapped in `{ "data": {...} }`.
pub fn parse_object_json<T: DeserializeOwned>(raw: &str) -> ApiResult<T> {
    let root = parse_root(raw)?;
    let inner = match root.get("data") {
        Some(data) if data.is_object() => data.clone(),
        _ => root,
    };
    Ok(serde_json::from_value(inner)?)
}

/// Lists arrive either bare or wrapped under one of `keys`.
pub fn parse_list_json<T: DeserializeOwned>(raw: &str, keys: &[&str]) -> ApiResult<Vec<T>> {
    let root = parse_root(raw)?;
    match root {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => Ok(serde_json::from_value(root)?),
        Value::Object(ref map) => {
            for key in keys {
                if let Some(list @ Value::Array(_)) = map.get(*key) {
                    return Ok(serde_json::from_value(list.clone())?);
                }
            }
            Err(ApiError::Decode(format!(
                "expected a list or one of {keys:?} in the response"
            )))
        }
        _ => Err(ApiError::Decode("expected a list response".to_string())),
    }
}

fn parse_root(raw: &str) -> ApiResult<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(trimmed)?)
}

fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn de_opt_i64<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(de)?;
    if value.is_null() {
        return Ok(None);
    }
    if let Value::String(s) = &value {
        if s.trim().is_empty() {
            return Ok(None);
        }
    }
    value_to_i64(&value)
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("expected an integer, got {value}")))
}

fn de_u64<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    de_opt_i64(de)?
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| de::Error::custom("expected a non-negative id"))
}

fn de_opt_u64<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u64>, D::Error> {
    Ok(de_opt_i64(de)?.and_then(|v| u64::try_from(v).ok()))
}

fn de_u64_or_zero<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    Ok(de_opt_u64(de)?.unwrap_or(0))
}

fn de_opt_u32<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u32>, D::Error> {
    Ok(de_opt_i64(de)?.and_then(|v| u32::try_from(v).ok()))
}

fn de_opt_i32<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i32>, D::Error> {
    Ok(de_opt_i64(de)?.and_then(|v| i32::try_from(v).ok()))
}

fn de_i32<'de, D: Deserializer<'de>>(de: D) -> Result<i32, D::Error> {
    Ok(de_opt_i32(de)?.unwrap_or(0))
}

fn de_points<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
    Ok(de_opt_i64(de)?.unwrap_or(0))
}

fn de_flag<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    Ok(de_opt_i64(de)?.unwrap_or(0) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_update_skips_absent_fields() {
        let body = serde_json::to_value(MatchUpdate::mark_processed()).unwrap();
        assert_eq!(body, serde_json::json!({ "procesado": 1 }));
    }

    #[test]
    fn cleared_scores_are_sent_as_null() {
        let body = serde_json::to_value(MatchUpdate {
            score_team1: Some(None),
            score_team2: Some(Some(2)),
            ..MatchUpdate::default()
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "score_team1": null, "score_team2": 2 })
        );
    }

    #[test]
    fn team_update_omits_unchanged_shield() {
        let body = serde_json::to_value(TeamUpdate {
            name: "Millonarios".to_string(),
            team_shield: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "name": "Millonarios" }));
    }

    #[test]
    fn new_group_entry_uses_backend_keys() {
        let body = serde_json::to_value(NewGroupEntry::empty('C', 7)).unwrap();
        assert_eq!(body["description"], "C");
        assert_eq!(body["id_team"], 7);
        assert_eq!(body["Points"], 0);
        assert_eq!(body["PP"], 0);
    }

    #[test]
    fn processed_flag_accepts_numbers_and_bools() {
        let raw = r#"[
            {"id":1,"id_team_1":1,"id_team_2":2,"id_stadium":3,"date_time":"2025-06-14 14:00:00","score_team1":null,"score_team2":null,"procesado":0},
            {"id":2,"id_team_1":"1","id_team_2":"2","id_stadium":null,"date_time":"2025-06-15 14:00:00","score_team1":"2","score_team2":1,"procesado":true}
        ]"#;
        let matches = parse_matches_json(raw).unwrap();
        assert!(!matches[0].processed);
        assert!(!matches[0].has_result());
        assert!(matches[1].processed);
        assert_eq!(matches[1].score1, Some(2));
        assert_eq!(matches[1].stadium_id, None);
    }

    #[test]
    fn non_list_object_is_a_decode_error() {
        let err = parse_teams_json(r#"{"message":"oops"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
