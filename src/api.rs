use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::http_client::http_client;
use crate::models::{
    self, BetRow, BetUpdate, GroupEntry, LoginRequest, LoginResponse, MassBetsResult, Match,
    MatchId, MatchUpdate, NewGroupEntry, NewMatch, NewStadiumImage, NewTeam, RegisterRequest,
    ScoreboardEntry, Stadium, StadiumId, StadiumImage, StadiumPayload, Team, TeamId, TeamUpdate,
    UserId,
};

#[cfg(test)]
use mockall::automock;

/// Every backend call the client makes. The worker talks to this trait so the
/// processing workflows can be driven by a test double.
#[cfg_attr(test, automock)]
pub trait BetPoolApi {
    /// Bearer token sent with every later request; `None` signs out.
    fn set_token(&mut self, token: Option<String>);

    fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse>;
    fn register(&self, request: &RegisterRequest) -> ApiResult<()>;

    fn teams(&self) -> ApiResult<Vec<Team>>;
    fn create_team(&self, team: &NewTeam) -> ApiResult<()>;
    fn update_team(&self, id: TeamId, update: &TeamUpdate) -> ApiResult<()>;

    fn groups(&self) -> ApiResult<Vec<GroupEntry>>;
    fn create_group_entry(&self, entry: &NewGroupEntry) -> ApiResult<()>;

    fn stadiums(&self) -> ApiResult<Vec<Stadium>>;
    fn stadium_images(&self, id: StadiumId) -> ApiResult<Vec<StadiumImage>>;
    fn create_stadium(&self, payload: &StadiumPayload) -> ApiResult<Stadium>;
    fn update_stadium(&self, id: StadiumId, payload: &StadiumPayload) -> ApiResult<()>;
    fn add_stadium_image(&self, image: &NewStadiumImage) -> ApiResult<()>;
    fn delete_stadium_image(&self, image_id: u64) -> ApiResult<()>;

    fn matches(&self) -> ApiResult<Vec<Match>>;
    fn create_match(&self, new_match: &NewMatch) -> ApiResult<()>;
    fn update_match(&self, id: MatchId, update: &MatchUpdate) -> ApiResult<()>;
    fn update_group_statistics(&self, id: MatchId) -> ApiResult<()>;
    fn revert_group_statistics(&self, id: MatchId) -> ApiResult<()>;
    fn update_bet_points(&self, id: MatchId) -> ApiResult<()>;

    fn create_mass_bets(&self) -> ApiResult<MassBetsResult>;
    fn user_bets(&self, user_id: UserId) -> ApiResult<Vec<BetRow>>;
    fn update_bet(&self, bet_id: u64, update: &BetUpdate) -> ApiResult<()>;
    fn scoreboard(&self) -> ApiResult<Vec<ScoreboardEntry>>;
}

pub struct HttpApi {
    base_url: Option<String>,
    timeout: Duration,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.backend_url.clone(),
            timeout: config.http_timeout,
            token: None,
        }
    }

    fn get(&self, path: &str) -> ApiResult<String> {
        self.send(Method::GET, path, None)
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<String> {
        self.send(Method::POST, path, Some(serde_json::to_value(body)?))
    }

    fn post_empty(&self, path: &str) -> ApiResult<String> {
        self.send(Method::POST, path, None)
    }

    fn put<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<String> {
        self.send(Method::PUT, path, Some(serde_json::to_value(body)?))
    }

    fn delete(&self, path: &str) -> ApiResult<String> {
        self.send(Method::DELETE, path, None)
    }

    fn send(&self, method: Method, path: &str, body: Option<Value>) -> ApiResult<String> {
        let base = self.base_url.as_deref().ok_or(ApiError::NotConfigured)?;
        let client =
            http_client(self.timeout).map_err(|err| ApiError::Transport(format!("{err:#}")))?;

        let url = format!("{base}{path}");
        let mut req = client.request(method.clone(), &url);
        if let Some(token) = self.token.as_deref() {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body.as_ref() {
            req = req.json(body);
        }

        debug!(%method, path, "api request");
        let resp = req.send()?;
        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            warn!(%method, path, %status, "api request rejected");
            return Err(ApiError::Status {
                status,
                message: server_message(&text),
            });
        }
        Ok(text)
    }
}

/// Pulls `message` (or `error`) out of an error body.
pub fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body.trim()).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

impl BetPoolApi for HttpApi {
    fn set_token(&mut self, token: Option<String>) {
        self.token = token.filter(|t| !t.trim().is_empty());
    }

    fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let body = self.post(
            "/login",
            &LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            },
        )?;
        models::parse_login_json(&body)
    }

    fn register(&self, request: &RegisterRequest) -> ApiResult<()> {
        self.post("/register", request).map(drop)
    }

    fn teams(&self) -> ApiResult<Vec<Team>> {
        models::parse_teams_json(&self.get("/teams")?)
    }

    fn create_team(&self, team: &NewTeam) -> ApiResult<()> {
        self.post("/teams", team).map(drop)
    }

    fn update_team(&self, id: TeamId, update: &TeamUpdate) -> ApiResult<()> {
        self.put(&format!("/teams/{id}"), update).map(drop)
    }

    fn groups(&self) -> ApiResult<Vec<GroupEntry>> {
        models::parse_groups_json(&self.get("/groups")?)
    }

    fn create_group_entry(&self, entry: &NewGroupEntry) -> ApiResult<()> {
        self.post("/groups", entry).map(drop)
    }

    fn stadiums(&self) -> ApiResult<Vec<Stadium>> {
        models::parse_stadiums_json(&self.get("/stadiums")?)
    }

    fn stadium_images(&self, id: StadiumId) -> ApiResult<Vec<StadiumImage>> {
        models::parse_stadium_images_json(&self.get(&format!("/stadiums/{id}/images"))?)
    }

    fn create_stadium(&self, payload: &StadiumPayload) -> ApiResult<Stadium> {
        models::parse_object_json(&self.post("/stadiums", payload)?)
    }

    fn update_stadium(&self, id: StadiumId, payload: &StadiumPayload) -> ApiResult<()> {
        self.put(&format!("/stadiums/{id}"), payload).map(drop)
    }

    fn add_stadium_image(&self, image: &NewStadiumImage) -> ApiResult<()> {
        self.post("/associated-images", image).map(drop)
    }

    fn delete_stadium_image(&self, image_id: u64) -> ApiResult<()> {
        self.delete(&format!("/associated-images/{image_id}")).map(drop)
    }

    fn matches(&self) -> ApiResult<Vec<Match>> {
        models::parse_matches_json(&self.get("/schedule_results")?)
    }

    fn create_match(&self, new_match: &NewMatch) -> ApiResult<()> {
        self.post("/schedule_results", new_match).map(drop)
    }

    fn update_match(&self, id: MatchId, update: &MatchUpdate) -> ApiResult<()> {
        self.put(&format!("/schedule_results/{id}"), update).map(drop)
    }

    fn update_group_statistics(&self, id: MatchId) -> ApiResult<()> {
        self.post_empty(&format!("/group-statistics/{id}/update"))
            .map(drop)
    }

    fn revert_group_statistics(&self, id: MatchId) -> ApiResult<()> {
        self.post_empty(&format!("/group-statistics/{id}/revert"))
            .map(drop)
    }

    fn update_bet_points(&self, id: MatchId) -> ApiResult<()> {
        self.post_empty(&format!("/matches/{id}/update-points"))
            .map(drop)
    }

    fn create_mass_bets(&self) -> ApiResult<MassBetsResult> {
        models::parse_mass_bets_json(&self.post_empty("/mass-bets")?)
    }

    fn user_bets(&self, user_id: UserId) -> ApiResult<Vec<BetRow>> {
        models::parse_user_bets_json(&self.get(&format!("/users/{user_id}/bets"))?)
    }

    fn update_bet(&self, bet_id: u64, update: &BetUpdate) -> ApiResult<()> {
        self.put(&format!("/bets/{bet_id}"), update).map(drop)
    }

    fn scoreboard(&self) -> ApiResult<Vec<ScoreboardEntry>> {
        models::parse_scoreboard_json(&self.get("/scoreboard")?)
    }
}
