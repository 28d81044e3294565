use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use crate::bet_window::{can_place_bet_at, local_now, parse_match_time};
use crate::forms::{self, Form, FormKind};
use crate::models::{
    BetRow, GroupEntry, MassBetsResult, Match, MatchId, ScoreboardEntry, Stadium, StadiumId,
    StadiumImage, Team, TeamId,
};
use crate::session::Session;
use crate::standings::{self, GroupTable};
use crate::workflow::{self, BET_WINDOW_CLOSED, MatchEdit};

pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
pub const REGISTERED_NOTICE: &str =
    "Registration successful. Check your email to verify your account, then log in.";
pub const STADIUM_IMAGES_LOADING: &str =
    "Stadium images are still loading; wait for them or press Esc and reopen the form";
pub const UNKNOWN_TEAM: &str = "Unknown team";
pub const UNKNOWN_STADIUM: &str = "Unknown stadium";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Login,
    Register,
    Home,
    Teams,
    Groups,
    Stadiums,
    Matches,
    Bets,
    MassBets,
    Standings,
    Scoreboard,
}

impl Page {
    /// Signed-in pages in hotkey order (`1`..`9`).
    pub const NAV: [Page; 9] = [
        Page::Home,
        Page::Bets,
        Page::Standings,
        Page::Scoreboard,
        Page::Teams,
        Page::Groups,
        Page::Stadiums,
        Page::Matches,
        Page::MassBets,
    ];

    pub fn requires_admin(self) -> bool {
        matches!(
            self,
            Page::Teams | Page::Groups | Page::Stadiums | Page::Matches | Page::MassBets
        )
    }

    pub fn is_public(self) -> bool {
        matches!(self, Page::Login | Page::Register)
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Login => "Login",
            Page::Register => "Register",
            Page::Home => "Home",
            Page::Teams => "Teams",
            Page::Groups => "Groups",
            Page::Stadiums => "Stadiums",
            Page::Matches => "Matches",
            Page::Bets => "My bets",
            Page::MassBets => "Mass bets",
            Page::Standings => "Standings",
            Page::Scoreboard => "Scoreboard",
        }
    }

    pub fn from_hotkey(c: char) -> Option<Page> {
        let idx = c.to_digit(10)?.checked_sub(1)? as usize;
        Page::NAV.get(idx).copied()
    }

    pub fn hotkey(self) -> Option<char> {
        let idx = Page::NAV.iter().position(|p| *p == self)?;
        char::from_digit(idx as u32 + 1, 10)
    }
}

/// Where a navigation request actually lands for the current session.
pub fn route(page: Page, session: Option<&Session>) -> Page {
    match session {
        None if page.is_public() => page,
        None => Page::Login,
        Some(_) if page.is_public() => Page::Home,
        Some(s) if page.requires_admin() && !s.is_admin() => Page::Home,
        Some(_) => page,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenStatus {
    pub loading: bool,
    pub submitting: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    Pending,
    Saved(String),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Bet,
    Match,
}

#[derive(Debug)]
pub struct AppState {
    pub page: Page,
    pub session: Option<Session>,
    pub selected: usize,
    pub form: Option<Form>,
    pub help_overlay: bool,
    pub teams: Vec<Team>,
    pub groups: Vec<GroupEntry>,
    pub stadiums: Vec<Stadium>,
    pub stadium_images: HashMap<StadiumId, Vec<StadiumImage>>,
    pub matches: Vec<Match>,
    pub bets: Vec<BetRow>,
    pub mass_bets: Option<MassBetsResult>,
    pub scoreboard: Vec<ScoreboardEntry>,
    pub status: HashMap<Page, ScreenStatus>,
    pub bet_rows: HashMap<u64, RowStatus>,
    pub match_rows: HashMap<MatchId, RowStatus>,
    pub logs: VecDeque<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AppState {
    pub fn new(session: Option<Session>) -> Self {
        let page = route(Page::Home, session.as_ref());
        let mut state = Self {
            page,
            session,
            selected: 0,
            form: None,
            help_overlay: false,
            teams: Vec::new(),
            groups: Vec::new(),
            stadiums: Vec::new(),
            stadium_images: HashMap::new(),
            matches: Vec::new(),
            bets: Vec::new(),
            mass_bets: None,
            scoreboard: Vec::new(),
            status: HashMap::new(),
            bet_rows: HashMap::new(),
            match_rows: HashMap::new(),
            logs: VecDeque::new(),
        };
        state.form = default_form(page);
        state
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_admin)
    }

    pub fn status(&self, page: Page) -> ScreenStatus {
        self.status.get(&page).cloned().unwrap_or_default()
    }

    pub fn status_mut(&mut self, page: Page) -> &mut ScreenStatus {
        self.status.entry(page).or_default()
    }

    /// Switches page (after routing) and returns the fetch the new page needs.
    pub fn navigate(&mut self, page: Page) -> Option<ProviderCommand> {
        let target = route(page, self.session.as_ref());
        if target != page {
            self.push_log(format!("[INFO] {} is not available", page.title()));
        }
        self.page = target;
        self.selected = 0;
        self.form = default_form(target);
        let status = self.status_mut(target);
        status.error = None;
        status.notice = None;
        self.refresh()
    }

    pub fn refresh(&mut self) -> Option<ProviderCommand> {
        let page = self.page;
        let cmd = load_command(page)?;
        self.status_mut(page).loading = true;
        Some(cmd)
    }

    pub fn list_len(&self) -> usize {
        match self.page {
            Page::Teams => self.teams.len(),
            Page::Stadiums => self.stadiums.len(),
            Page::Matches => self.matches.len(),
            Page::Bets => self.bets.len(),
            Page::MassBets => self.mass_bets.as_ref().map_or(0, |r| r.bets.len()),
            Page::Groups | Page::Standings => self.group_tables().len(),
            Page::Scoreboard => self.scoreboard.len(),
            Page::Login | Page::Register | Page::Home => 0,
        }
    }

    pub fn select_next(&mut self) {
        let len = self.list_len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.list_len().saturating_sub(1));
    }

    pub fn selected_team(&self) -> Option<&Team> {
        self.teams.get(self.selected)
    }

    pub fn selected_stadium(&self) -> Option<&Stadium> {
        self.stadiums.get(self.selected)
    }

    pub fn selected_match(&self) -> Option<&Match> {
        self.matches.get(self.selected)
    }

    pub fn selected_bet(&self) -> Option<&BetRow> {
        self.bets.get(self.selected)
    }

    pub fn team_name(&self, id: TeamId) -> &str {
        self.teams
            .iter()
            .find(|t| t.id == id)
            .map_or(UNKNOWN_TEAM, |t| t.name.as_str())
    }

    pub fn stadium_name(&self, id: Option<StadiumId>) -> &str {
        id.and_then(|id| self.stadiums.iter().find(|s| s.id == id))
            .map_or(UNKNOWN_STADIUM, |s| s.name.as_str())
    }

    pub fn match_title(&self, m: &Match) -> String {
        format!("{} vs {}", self.team_name(m.team1_id), self.team_name(m.team2_id))
    }

    pub fn group_tables(&self) -> Vec<GroupTable> {
        standings::group_standings(&self.groups)
    }

    /// 1-based leaderboard position and points of the signed-in user.
    pub fn my_position(&self) -> Option<(usize, i64)> {
        let user_id = self.session.as_ref()?.user_id;
        let pos = standings::position_of(&self.scoreboard, user_id)?;
        let points = self.scoreboard.get(pos - 1)?.total_points;
        Some((pos, points))
    }

    pub fn begin_submit(&mut self, page: Page) -> bool {
        let status = self.status_mut(page);
        if status.submitting {
            return false;
        }
        status.submitting = true;
        status.error = None;
        status.notice = None;
        true
    }

    pub fn begin_row(&mut self, kind: RowKind, id: u64) -> bool {
        let rows = match kind {
            RowKind::Bet => &mut self.bet_rows,
            RowKind::Match => &mut self.match_rows,
        };
        if rows.get(&id) == Some(&RowStatus::Pending) {
            return false;
        }
        rows.insert(id, RowStatus::Pending);
        true
    }

    fn fail(&mut self, message: impl Into<String>) {
        let page = self.page;
        let status = self.status_mut(page);
        status.error = Some(message.into());
        status.notice = None;
    }

    pub fn open_create_form(&mut self) {
        self.form = match self.page {
            Page::Teams => Some(forms::team_form(None)),
            Page::Groups => Some(forms::assign_group_form(&self.teams)),
            Page::Stadiums => Some(forms::stadium_form(None)),
            Page::Matches => Some(forms::new_match_form(&self.teams, &self.stadiums)),
            _ => return,
        };
    }

    pub fn open_edit_form(&mut self) -> Option<ProviderCommand> {
        match self.page {
            Page::Teams => {
                self.form = self.selected_team().map(|t| forms::team_form(Some(t)));
                None
            }
            Page::Stadiums => {
                let stadium = self.selected_stadium()?.clone();
                self.stadium_images.remove(&stadium.id);
                self.form = Some(forms::stadium_form(Some(&stadium)));
                Some(ProviderCommand::LoadStadiumImages { id: stadium.id })
            }
            Page::Matches => {
                let m = self.selected_match()?;
                let title = self.match_title(m);
                self.form = Some(forms::edit_match_form(m, title, &self.stadiums));
                None
            }
            Page::Bets => {
                let row = self.selected_bet()?;
                if can_place_bet_at(row.schedule.date_time.as_deref(), local_now()) {
                    self.form = Some(forms::bet_form(row));
                } else {
                    self.fail(BET_WINDOW_CLOSED);
                }
                None
            }
            _ => None,
        }
    }

    pub fn load_selected_images(&mut self) -> Option<ProviderCommand> {
        if self.page != Page::Stadiums {
            return None;
        }
        let id = self.selected_stadium()?.id;
        Some(ProviderCommand::LoadStadiumImages { id })
    }

    /// Esc: forms on Login/Register stay, others close.
    pub fn close_form(&mut self) {
        if !self.page.is_public() {
            self.form = None;
        }
    }

    /// Turns the open form into a command, or records why it cannot be sent.
    pub fn submit_form(&mut self) -> Option<ProviderCommand> {
        let form = self.form.clone()?;
        let page = self.page;
        let cmd = match self.build_command(&form) {
            Ok(cmd) => cmd,
            Err(message) => {
                self.fail(message);
                return None;
            }
        };
        if let FormKind::PlaceBet(bet_id) = form.kind {
            if !self.begin_row(RowKind::Bet, bet_id) {
                return None;
            }
            self.form = None;
            return Some(cmd);
        }
        if !self.begin_submit(page) {
            return None;
        }
        Some(cmd)
    }

    fn build_command(&self, form: &Form) -> Result<ProviderCommand, String> {
        let text = |key: &str| form.value(key).trim().to_string();
        let optional = |key: &str| Some(text(key)).filter(|v| !v.is_empty());
        let cmd = match form.kind {
            FormKind::Login => {
                if text("email").is_empty() || form.value("password").is_empty() {
                    return Err("Enter your email and password".to_string());
                }
                ProviderCommand::Login {
                    email: text("email"),
                    password: form.value("password").to_string(),
                }
            }
            FormKind::Register => {
                if text("name").is_empty()
                    || text("email").is_empty()
                    || form.value("password").is_empty()
                {
                    return Err("Name, email and password are required".to_string());
                }
                if form.value("password") != form.value("password_confirmation") {
                    return Err("Passwords do not match".to_string());
                }
                ProviderCommand::Register {
                    name: text("name"),
                    email: text("email"),
                    password: form.value("password").to_string(),
                    confirmation: form.value("password_confirmation").to_string(),
                }
            }
            FormKind::NewTeam | FormKind::EditTeam(_) => {
                if text("name").is_empty() {
                    return Err("The team needs a name".to_string());
                }
                match form.kind {
                    FormKind::EditTeam(id) => ProviderCommand::UpdateTeam {
                        id,
                        name: text("name"),
                        shield_path: optional("shield"),
                    },
                    _ => ProviderCommand::CreateTeam {
                        name: text("name"),
                        shield_path: optional("shield"),
                    },
                }
            }
            FormKind::AssignGroup => ProviderCommand::AssignGroup {
                letter: text("group"),
                team_id: form.choice("team"),
            },
            FormKind::NewStadium => ProviderCommand::CreateStadium {
                name: text("name"),
                characteristics: text("characteristics"),
                image_paths: text("images"),
            },
            FormKind::EditStadium(id) => {
                // Removal and the image cap are checked against this list.
                let existing = self
                    .stadium_images
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| STADIUM_IMAGES_LOADING.to_string())?;
                ProviderCommand::UpdateStadium {
                    id,
                    name: text("name"),
                    characteristics: text("characteristics"),
                    remove_ids: parse_id_list(form.value("remove"))?,
                    existing,
                    image_paths: text("images"),
                }
            }
            FormKind::NewMatch => ProviderCommand::CreateMatch {
                team1: form.choice("team1"),
                team2: form.choice("team2"),
                stadium: form.choice("stadium"),
                date: text("date"),
                time: text("time"),
            },
            FormKind::EditMatch(id) => {
                let original = self
                    .matches
                    .iter()
                    .find(|m| m.id == id)
                    .cloned()
                    .ok_or_else(|| "That match is no longer listed; refresh".to_string())?;
                let score = |key: &str| {
                    workflow::parse_optional_score(form.value(key))
                        .map_err(|err| err.user_message("Invalid score"))
                };
                let edit = MatchEdit {
                    score1: score("score1")?,
                    score2: score("score2")?,
                    processed: form.flag("processed"),
                    date: text("date"),
                    time: text("time"),
                    stadium_id: form.choice("stadium"),
                };
                ProviderCommand::UpdateMatch { original, edit }
            }
            FormKind::PlaceBet(bet_id) => {
                let row = self
                    .bets
                    .iter()
                    .find(|b| b.id == bet_id)
                    .cloned()
                    .ok_or_else(|| "That bet is no longer listed; refresh".to_string())?;
                ProviderCommand::PlaceBet {
                    row,
                    score1: form.value("score1").to_string(),
                    score2: form.value("score2").to_string(),
                }
            }
        };
        Ok(cmd)
    }

    pub fn process_selected(&mut self) -> Option<ProviderCommand> {
        if self.page != Page::Matches {
            return None;
        }
        let m = self.selected_match()?.clone();
        if m.processed {
            self.match_rows
                .insert(m.id, RowStatus::Failed("Already processed".to_string()));
            return None;
        }
        if !self.begin_row(RowKind::Match, m.id) {
            return None;
        }
        Some(ProviderCommand::ProcessMatch(m))
    }

    pub fn generate_mass_bets(&mut self) -> Option<ProviderCommand> {
        if self.page != Page::MassBets || !self.begin_submit(Page::MassBets) {
            return None;
        }
        Some(ProviderCommand::GenerateMassBets)
    }

    pub fn export(&mut self, path: PathBuf) -> Option<ProviderCommand> {
        let page = self.page;
        if !matches!(page, Page::Standings | Page::Scoreboard) || !self.begin_submit(page) {
            return None;
        }
        Some(ProviderCommand::Export { page, path })
    }

    pub fn logout(&mut self) -> ProviderCommand {
        self.clear_user_data();
        self.session = None;
        self.page = Page::Login;
        self.form = default_form(Page::Login);
        self.push_log("[INFO] Logged out");
        ProviderCommand::Logout
    }

    fn clear_user_data(&mut self) {
        self.bets.clear();
        self.bet_rows.clear();
        self.match_rows.clear();
        self.mass_bets = None;
        self.scoreboard.clear();
        self.status.clear();
        self.selected = 0;
    }
}

fn default_form(page: Page) -> Option<Form> {
    match page {
        Page::Login => Some(forms::login_form()),
        Page::Register => Some(forms::register_form()),
        _ => None,
    }
}

fn load_command(page: Page) -> Option<ProviderCommand> {
    match page {
        Page::Login | Page::Register | Page::Home | Page::MassBets => None,
        _ => Some(ProviderCommand::Load(page)),
    }
}

fn parse_id_list(raw: &str) -> Result<Vec<u64>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map_err(|_| format!("'{s}' is not an image id"))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCommand {
    Login {
        email: String,
        password: String,
    },
    Register {
        name: String,
        email: String,
        password: String,
        confirmation: String,
    },
    Logout,
    Load(Page),
    LoadStadiumImages {
        id: StadiumId,
    },
    CreateTeam {
        name: String,
        shield_path: Option<String>,
    },
    UpdateTeam {
        id: TeamId,
        name: String,
        shield_path: Option<String>,
    },
    AssignGroup {
        letter: String,
        team_id: Option<TeamId>,
    },
    CreateStadium {
        name: String,
        characteristics: String,
        image_paths: String,
    },
    UpdateStadium {
        id: StadiumId,
        name: String,
        characteristics: String,
        remove_ids: Vec<u64>,
        existing: Vec<StadiumImage>,
        image_paths: String,
    },
    CreateMatch {
        team1: Option<TeamId>,
        team2: Option<TeamId>,
        stadium: Option<StadiumId>,
        date: String,
        time: String,
    },
    UpdateMatch {
        original: Match,
        edit: MatchEdit,
    },
    ProcessMatch(Match),
    PlaceBet {
        row: BetRow,
        score1: String,
        score2: String,
    },
    GenerateMassBets,
    Export {
        page: Page,
        path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    LoggedIn(Session),
    SessionExpired,
    Registered,
    Teams(Vec<Team>),
    Groups(Vec<GroupEntry>),
    Stadiums(Vec<Stadium>),
    StadiumImages {
        id: StadiumId,
        images: Vec<StadiumImage>,
    },
    Matches(Vec<Match>),
    Bets(Vec<BetRow>),
    MassBets(MassBetsResult),
    Scoreboard(Vec<ScoreboardEntry>),
    Loaded(Page),
    Succeeded {
        page: Page,
        message: String,
    },
    Failed {
        page: Page,
        message: String,
    },
    RowFinished {
        kind: RowKind,
        id: u64,
        result: Result<String, String>,
    },
    Log(String),
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::LoggedIn(session) => {
            state.push_log(format!(
                "[INFO] Signed in as user {} ({})",
                session.user_id,
                if session.is_admin() { "admin" } else { "bettor" }
            ));
            state.session = Some(session);
            state.status.remove(&Page::Login);
            state.page = Page::Home;
            state.form = None;
            state.selected = 0;
        }
        Delta::SessionExpired => {
            state.clear_user_data();
            state.session = None;
            state.page = Page::Login;
            state.form = default_form(Page::Login);
            state.status_mut(Page::Login).error = Some(SESSION_EXPIRED.to_string());
            state.push_log("[WARN] Session expired; please log in again");
        }
        Delta::Registered => {
            state.status.remove(&Page::Register);
            state.page = Page::Login;
            state.form = default_form(Page::Login);
            state.status_mut(Page::Login).notice = Some(REGISTERED_NOTICE.to_string());
            state.push_log("[INFO] Account created");
        }
        Delta::Teams(teams) => {
            state.teams = teams;
            state.clamp_selection();
        }
        Delta::Groups(groups) => {
            state.groups = groups;
            state.clamp_selection();
        }
        Delta::Stadiums(stadiums) => {
            state.stadiums = stadiums;
            state.clamp_selection();
        }
        Delta::StadiumImages { id, images } => {
            state.stadium_images.insert(id, images);
        }
        Delta::Matches(matches) => {
            state.matches = matches;
            state.clamp_selection();
        }
        Delta::Bets(mut bets) => {
            bets.sort_by_key(|row| {
                let kickoff = row.schedule.date_time.as_deref().and_then(parse_match_time);
                (kickoff.is_none(), kickoff)
            });
            state.bets = bets;
            state.clamp_selection();
        }
        Delta::MassBets(result) => {
            state.mass_bets = Some(result);
            state.clamp_selection();
        }
        Delta::Scoreboard(mut entries) => {
            standings::rank_scoreboard(&mut entries);
            state.scoreboard = entries;
            state.clamp_selection();
        }
        Delta::Loaded(page) => {
            state.status_mut(page).loading = false;
        }
        Delta::Succeeded { page, message } => {
            let status = state.status_mut(page);
            status.loading = false;
            status.submitting = false;
            status.error = None;
            status.notice = Some(message.clone());
            if state.page == page && !page.is_public() {
                state.form = None;
            }
            state.push_log(format!("[INFO] {message}"));
        }
        Delta::Failed { page, message } => {
            let status = state.status_mut(page);
            status.loading = false;
            status.submitting = false;
            status.notice = None;
            status.error = Some(message.clone());
            state.push_log(format!("[WARN] {}: {message}", page.title()));
        }
        Delta::RowFinished { kind, id, result } => {
            let (status, line) = match result {
                Ok(msg) => (RowStatus::Saved(msg.clone()), format!("[INFO] #{id}: {msg}")),
                Err(msg) => (RowStatus::Failed(msg.clone()), format!("[WARN] #{id}: {msg}")),
            };
            match kind {
                RowKind::Bet => state.bet_rows.insert(id, status),
                RowKind::Match => state.match_rows.insert(id, status),
            };
            state.push_log(line);
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
