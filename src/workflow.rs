//! Multi-step operations the client orchestrates against the backend.
//!
//! Ordering matters here: marking a match processed folds its result into the
//! group tables and bet points before the flag is persisted, and clearing the
//! flag reverts those aggregates before the match row changes.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{info, warn};

use crate::api::BetPoolApi;
use crate::bet_window::{can_place_bet_at, parse_match_time};
use crate::error::{ApiError, ApiResult};
use crate::images::{MAX_STADIUM_IMAGES, available_slots};
use crate::models::{
    BetRow, BetUpdate, Match, MatchUpdate, NewGroupEntry, NewMatch, NewStadiumImage, Stadium,
    StadiumId, StadiumImage, StadiumPayload, TeamId, UserId,
};
use crate::standings::parse_group_letter;

pub const TEAM_ALREADY_ASSIGNED: &str = "This team is already assigned to a group";
pub const BET_WINDOW_CLOSED: &str = "The time to modify this bet has expired.";

/// Folds a played match into standings and bet points, then flags it processed.
/// Nothing is persisted on the match unless both backend steps succeed.
pub fn process_match<A: BetPoolApi + ?Sized>(api: &A, m: &Match) -> ApiResult<()> {
    if !m.has_result() {
        return Err(ApiError::Invalid(
            "The match needs a result before its statistics can be processed".to_string(),
        ));
    }
    api.update_group_statistics(m.id)?;
    info!(match_id = m.id, "group statistics updated");
    api.update_bet_points(m.id)?;
    info!(match_id = m.id, "bet points updated");
    api.update_match(m.id, &MatchUpdate::mark_processed())?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEdit {
    pub score1: Option<u32>,
    pub score2: Option<u32>,
    pub processed: bool,
    pub date: String,
    pub time: String,
    pub stadium_id: Option<StadiumId>,
}

impl MatchEdit {
    pub fn from_match(m: &Match) -> Self {
        let (date, time) = split_date_time(&m.date_time);
        Self {
            score1: m.score1,
            score2: m.score2,
            processed: m.processed,
            date,
            time,
            stadium_id: m.stadium_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    pub reverted: bool,
}

/// Saves an edited match. Clearing the processed flag reverts the group
/// statistics first; if that fails the match is left untouched.
pub fn edit_match<A: BetPoolApi + ?Sized>(
    api: &A,
    original: &Match,
    edit: &MatchEdit,
) -> ApiResult<EditOutcome> {
    if edit.processed && !original.processed {
        return Err(ApiError::Invalid(
            "Use process on the match list to mark a match as processed".to_string(),
        ));
    }
    let date_time = match_date_time(&edit.date, &edit.time)?;

    let reverted = original.processed && !edit.processed;
    if reverted {
        api.revert_group_statistics(original.id)?;
        info!(match_id = original.id, "group statistics reverted");
    }

    let update = MatchUpdate {
        score_team1: Some(edit.score1),
        score_team2: Some(edit.score2),
        procesado: Some(u8::from(edit.processed)),
        date_time: Some(date_time),
        id_stadium: edit.stadium_id,
    };
    api.update_match(original.id, &update)?;
    Ok(EditOutcome { reverted })
}

pub fn new_match(
    team1: Option<TeamId>,
    team2: Option<TeamId>,
    stadium: Option<StadiumId>,
    date: &str,
    time: &str,
) -> ApiResult<NewMatch> {
    let (Some(team1), Some(team2)) = (team1, team2) else {
        return Err(ApiError::Invalid("Select both teams".to_string()));
    };
    if team1 == team2 {
        return Err(ApiError::Invalid(
            "A match cannot be created with the same team twice".to_string(),
        ));
    }
    let Some(stadium) = stadium.filter(|_| !date.trim().is_empty() && !time.trim().is_empty())
    else {
        return Err(ApiError::Invalid(
            "Date, time and stadium are required".to_string(),
        ));
    };
    Ok(NewMatch {
        id_team_1: team1,
        id_team_2: team2,
        id_stadium: stadium,
        date_time: match_date_time(date, time)?,
        score_team1: None,
        score_team2: None,
        procesado: 0,
    })
}

/// `YYYY-MM-DD` + `HH:MM` into the backend's `YYYY-MM-DD HH:MM:00`.
pub fn match_date_time(date: &str, time: &str) -> ApiResult<String> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::Invalid("Date must look like YYYY-MM-DD".to_string()))?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map_err(|_| ApiError::Invalid("Time must look like HH:MM".to_string()))?;
    Ok(NaiveDateTime::new(date, time)
        .format("%Y-%m-%d %H:%M:00")
        .to_string())
}

pub fn split_date_time(raw: &str) -> (String, String) {
    match parse_match_time(raw) {
        Some(dt) => (
            dt.format("%Y-%m-%d").to_string(),
            dt.format("%H:%M").to_string(),
        ),
        None => (String::new(), String::new()),
    }
}

/// Both scores present, each a non-negative integer.
pub fn parse_bet_scores(score1: &str, score2: &str) -> ApiResult<(u32, u32)> {
    let (score1, score2) = (score1.trim(), score2.trim());
    if score1.is_empty() || score2.is_empty() {
        return Err(ApiError::Invalid(
            "Enter both scores for the bet".to_string(),
        ));
    }
    match (score1.parse::<u32>(), score2.parse::<u32>()) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        _ => Err(ApiError::Invalid(
            "Scores must be non-negative whole numbers".to_string(),
        )),
    }
}

/// Parses an optional score field; blank means "no result yet".
pub fn parse_optional_score(raw: &str) -> ApiResult<Option<u32>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| ApiError::Invalid("Scores must be non-negative whole numbers".to_string()))
}

/// Updates the prediction on one bet, re-checking the window at submit time.
pub fn place_bet<A: BetPoolApi + ?Sized>(
    api: &A,
    user_id: UserId,
    row: &BetRow,
    score1: &str,
    score2: &str,
    now: NaiveDateTime,
) -> ApiResult<()> {
    if !can_place_bet_at(row.schedule.date_time.as_deref(), now) {
        return Err(ApiError::Invalid(BET_WINDOW_CLOSED.to_string()));
    }
    let (score1, score2) = parse_bet_scores(score1, score2)?;
    api.update_bet(
        row.id,
        &BetUpdate {
            id_user: user_id,
            id_schedule: row.schedule.id,
            score_team1: score1,
            score_team2: score2,
        },
    )
}

pub fn assign_team_to_group<A: BetPoolApi + ?Sized>(
    api: &A,
    letter: &str,
    team_id: Option<TeamId>,
) -> ApiResult<()> {
    let (Some(letter), Some(team_id)) = (parse_group_letter(letter), team_id) else {
        return Err(ApiError::Invalid(
            "Select a group (A-H) and a team".to_string(),
        ));
    };
    api.create_group_entry(&NewGroupEntry::empty(letter, team_id))
        .map_err(|err| {
            if err.is_unprocessable() {
                ApiError::Invalid(TEAM_ALREADY_ASSIGNED.to_string())
            } else {
                err
            }
        })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSyncReport {
    pub deleted: usize,
    pub uploaded: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl ImageSyncReport {
    pub fn summary(&self) -> String {
        let mut out = format!("{} image(s) uploaded", self.uploaded);
        if self.deleted > 0 {
            out.push_str(&format!(", {} removed", self.deleted));
        }
        if self.skipped > 0 {
            out.push_str(&format!(", {} skipped (limit {MAX_STADIUM_IMAGES})", self.skipped));
        }
        if !self.errors.is_empty() {
            out.push_str(&format!(", {} failed", self.errors.len()));
        }
        out
    }
}

pub fn validate_stadium(name: &str, characteristics: &str) -> ApiResult<StadiumPayload> {
    if name.trim().is_empty() {
        return Err(ApiError::Invalid("The stadium needs a name".to_string()));
    }
    Ok(StadiumPayload {
        name: name.trim().to_string(),
        characteristics: characteristics.trim().to_string(),
    })
}

/// Creates a stadium then uploads up to the image cap.
pub fn create_stadium<A: BetPoolApi + ?Sized>(
    api: &A,
    payload: &StadiumPayload,
    images: Vec<String>,
) -> ApiResult<(Stadium, ImageSyncReport)> {
    let stadium = api.create_stadium(payload)?;
    let mut report = ImageSyncReport::default();
    upload_images(api, stadium.id, images, MAX_STADIUM_IMAGES, &mut report);
    Ok((stadium, report))
}

/// Updates stadium fields, deletes removed images, then uploads new ones
/// into whatever slots remain. Per-image failures are collected, not fatal.
pub fn sync_stadium<A: BetPoolApi + ?Sized>(
    api: &A,
    id: StadiumId,
    payload: &StadiumPayload,
    existing: &[StadiumImage],
    remove_ids: &[u64],
    new_images: Vec<String>,
) -> ApiResult<ImageSyncReport> {
    api.update_stadium(id, payload)?;

    let mut report = ImageSyncReport::default();
    for image_id in remove_ids {
        if !existing.iter().any(|img| img.id == *image_id) {
            report
                .errors
                .push(format!("image {image_id} does not belong to this stadium"));
            continue;
        }
        match api.delete_stadium_image(*image_id) {
            Ok(()) => report.deleted += 1,
            Err(err) => {
                warn!(image_id, error = %err, "image delete failed");
                report.errors.push(format!("delete {image_id}: {err}"));
            }
        }
    }

    let slots = available_slots(existing.len(), report.deleted);
    upload_images(api, id, new_images, slots, &mut report);
    Ok(report)
}

fn upload_images<A: BetPoolApi + ?Sized>(
    api: &A,
    stadium_id: StadiumId,
    images: Vec<String>,
    slots: usize,
    report: &mut ImageSyncReport,
) {
    report.skipped += images.len().saturating_sub(slots);
    for (idx, image) in images.into_iter().take(slots).enumerate() {
        match api.add_stadium_image(&NewStadiumImage {
            image,
            id_stadium: stadium_id,
        }) {
            Ok(()) => report.uploaded += 1,
            Err(err) => {
                warn!(stadium_id, error = %err, "image upload failed");
                report.errors.push(format!("upload #{}: {err}", idx + 1));
            }
        }
    }
}
