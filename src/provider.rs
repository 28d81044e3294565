use std::path::Path;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::api::{BetPoolApi, HttpApi};
use crate::bet_window::local_now;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::export;
use crate::images;
use crate::models::{NewTeam, RegisterRequest, TeamUpdate, UserId};
use crate::session::{Session, SessionStore};
use crate::state::{Delta, Page, ProviderCommand, RowKind};
use crate::workflow;

/// Runs every backend call off the UI thread; exits when the UI drops its sender.
pub fn spawn_provider(
    config: Config,
    session: Option<Session>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let api = HttpApi::new(&config);
        let store = SessionStore::new(config.session_file.clone());
        let mut worker = Worker::new(api, store, &config, session);
        while let Ok(cmd) = cmd_rx.recv() {
            worker.handle(cmd, &tx);
        }
        info!("provider stopped");
    })
}

pub struct Worker<A> {
    api: A,
    store: SessionStore,
    admin_greeting: String,
    tournament_id: u64,
    user_id: Option<UserId>,
}

impl<A: BetPoolApi> Worker<A> {
    pub fn new(mut api: A, store: SessionStore, config: &Config, session: Option<Session>) -> Self {
        let user_id = session.as_ref().map(|s| s.user_id);
        api.set_token(session.map(|s| s.token));
        Self {
            api,
            store,
            admin_greeting: config.admin_greeting.clone(),
            tournament_id: config.tournament_id,
            user_id,
        }
    }

    pub fn handle(&mut self, cmd: ProviderCommand, tx: &Sender<Delta>) {
        match cmd {
            ProviderCommand::Login { email, password } => self.login(&email, &password, tx),
            ProviderCommand::Register {
                name,
                email,
                password,
                confirmation,
            } => {
                let request = RegisterRequest::with_defaults(&name, &email, &password, &confirmation);
                match self.api.register(&request) {
                    Ok(()) => {
                        info!("account registered");
                        let _ = tx.send(Delta::Registered);
                    }
                    Err(err) => fail(tx, Page::Register, &err, "Registration failed"),
                }
            }
            ProviderCommand::Logout => {
                self.api.set_token(None);
                self.user_id = None;
                if let Err(err) = self.store.clear() {
                    warn!(error = %err, "session file not removed");
                    let _ = tx.send(Delta::Log(format!("[WARN] {err:#}")));
                }
                info!("signed out");
            }
            ProviderCommand::Load(page) => match self.load(page, tx) {
                Ok(()) => {
                    let _ = tx.send(Delta::Loaded(page));
                }
                Err(err) if page == Page::Bets && err.is_unauthorized() => {
                    self.expire_session(tx)
                }
                Err(err) => fail(tx, page, &err, "Could not load data"),
            },
            ProviderCommand::LoadStadiumImages { id } => match self.api.stadium_images(id) {
                Ok(images) => {
                    let _ = tx.send(Delta::StadiumImages { id, images });
                }
                Err(err) => fail(tx, Page::Stadiums, &err, "Could not load stadium images"),
            },
            ProviderCommand::CreateTeam { name, shield_path } => {
                let team_shield = match encode_optional(shield_path.as_deref()) {
                    Ok(shield) => shield,
                    Err(err) => return fail_plain(tx, Page::Teams, format!("{err:#}")),
                };
                let team = NewTeam {
                    id_tournament: self.tournament_id,
                    name,
                    team_shield,
                };
                self.submit(tx, Page::Teams, "Could not create the team", |api| {
                    api.create_team(&team)?;
                    Ok(format!("Team {} created", team.name))
                });
                self.reload(Page::Teams, tx);
            }
            ProviderCommand::UpdateTeam {
                id,
                name,
                shield_path,
            } => {
                let team_shield = match encode_optional(shield_path.as_deref()) {
                    Ok(shield) => shield,
                    Err(err) => return fail_plain(tx, Page::Teams, format!("{err:#}")),
                };
                let update = TeamUpdate { name, team_shield };
                self.submit(tx, Page::Teams, "Could not update the team", |api| {
                    api.update_team(id, &update)?;
                    Ok(format!("Team {} updated", update.name))
                });
                self.reload(Page::Teams, tx);
            }
            ProviderCommand::AssignGroup { letter, team_id } => {
                self.submit(tx, Page::Groups, "Could not assign the team", |api| {
                    workflow::assign_team_to_group(api, &letter, team_id)?;
                    Ok(format!("Team assigned to group {}", letter.trim().to_uppercase()))
                });
                self.reload(Page::Groups, tx);
            }
            ProviderCommand::CreateStadium {
                name,
                characteristics,
                image_paths,
            } => {
                let encoded = match images::encode_image_list(&image_paths) {
                    Ok(encoded) => encoded,
                    Err(err) => return fail_plain(tx, Page::Stadiums, format!("{err:#}")),
                };
                self.submit(tx, Page::Stadiums, "Could not create the stadium", |api| {
                    let payload = workflow::validate_stadium(&name, &characteristics)?;
                    let (stadium, report) = workflow::create_stadium(api, &payload, encoded)?;
                    log_image_errors(tx, &report.errors);
                    Ok(format!("Stadium {} created; {}", stadium.name, report.summary()))
                });
                self.reload(Page::Stadiums, tx);
            }
            ProviderCommand::UpdateStadium {
                id,
                name,
                characteristics,
                remove_ids,
                existing,
                image_paths,
            } => {
                let encoded = match images::encode_image_list(&image_paths) {
                    Ok(encoded) => encoded,
                    Err(err) => return fail_plain(tx, Page::Stadiums, format!("{err:#}")),
                };
                self.submit(tx, Page::Stadiums, "Could not update the stadium", |api| {
                    let payload = workflow::validate_stadium(&name, &characteristics)?;
                    let report =
                        workflow::sync_stadium(api, id, &payload, &existing, &remove_ids, encoded)?;
                    log_image_errors(tx, &report.errors);
                    Ok(format!("Stadium {} updated; {}", payload.name, report.summary()))
                });
                self.reload(Page::Stadiums, tx);
                if let Ok(images) = self.api.stadium_images(id) {
                    let _ = tx.send(Delta::StadiumImages { id, images });
                }
            }
            ProviderCommand::CreateMatch {
                team1,
                team2,
                stadium,
                date,
                time,
            } => {
                self.submit(tx, Page::Matches, "Could not create the match", |api| {
                    let new_match = workflow::new_match(team1, team2, stadium, &date, &time)?;
                    api.create_match(&new_match)?;
                    Ok(format!("Match scheduled for {}", new_match.date_time))
                });
                self.reload(Page::Matches, tx);
            }
            ProviderCommand::UpdateMatch { original, edit } => {
                self.submit(tx, Page::Matches, "Could not update the match", |api| {
                    let outcome = workflow::edit_match(api, &original, &edit)?;
                    Ok(if outcome.reverted {
                        format!("Match #{} updated; group statistics reverted", original.id)
                    } else {
                        format!("Match #{} updated", original.id)
                    })
                });
                self.reload(Page::Matches, tx);
            }
            ProviderCommand::ProcessMatch(m) => {
                let result = workflow::process_match(&self.api, &m)
                    .map(|()| "Statistics and points updated".to_string())
                    .map_err(|err| err.user_message("Could not process the match"));
                let processed = result.is_ok();
                let _ = tx.send(Delta::RowFinished {
                    kind: RowKind::Match,
                    id: m.id,
                    result,
                });
                if processed {
                    self.reload(Page::Matches, tx);
                }
            }
            ProviderCommand::PlaceBet {
                row,
                score1,
                score2,
            } => {
                let result = self.require_user().and_then(|user_id| {
                    workflow::place_bet(&self.api, user_id, &row, &score1, &score2, local_now())
                });
                match result {
                    Ok(()) => {
                        let _ = tx.send(Delta::RowFinished {
                            kind: RowKind::Bet,
                            id: row.id,
                            result: Ok("Bet saved".to_string()),
                        });
                        self.reload(Page::Bets, tx);
                    }
                    Err(err) if err.is_unauthorized() => self.expire_session(tx),
                    Err(err) => {
                        let _ = tx.send(Delta::RowFinished {
                            kind: RowKind::Bet,
                            id: row.id,
                            result: Err(err.user_message("Could not save the bet")),
                        });
                    }
                }
            }
            ProviderCommand::GenerateMassBets => {
                self.submit(tx, Page::MassBets, "Could not generate bets", |api| {
                    let result = api.create_mass_bets()?;
                    let message = format!("{} bets generated", result.total_bets);
                    let _ = tx.send(Delta::MassBets(result));
                    Ok(message)
                });
            }
            ProviderCommand::Export { page, path } => {
                match self.export(&path, tx) {
                    Ok(message) => {
                        let _ = tx.send(Delta::Succeeded { page, message });
                    }
                    Err(err) => fail_plain(tx, page, format!("Export failed: {err:#}")),
                }
            }
        }
    }

    fn login(&mut self, email: &str, password: &str, tx: &Sender<Delta>) {
        let result = self
            .api
            .login(email, password)
            .and_then(|resp| Session::from_login(resp, &self.admin_greeting));
        match result {
            Ok(session) => {
                self.api.set_token(Some(session.token.clone()));
                self.user_id = Some(session.user_id);
                if let Err(err) = self.store.save(&session) {
                    warn!(error = %err, "session not persisted");
                    let _ = tx.send(Delta::Log(format!("[WARN] Session not saved: {err:#}")));
                }
                info!(user_id = session.user_id, admin = session.is_admin(), "signed in");
                let _ = tx.send(Delta::LoggedIn(session));
            }
            Err(err) => {
                warn!(error = %err, "login rejected");
                fail(tx, Page::Login, &err, "Login failed. Check your credentials.");
            }
        }
    }

    fn load(&self, page: Page, tx: &Sender<Delta>) -> ApiResult<()> {
        match page {
            Page::Teams => {
                let _ = tx.send(Delta::Teams(self.api.teams()?));
            }
            Page::Groups | Page::Standings => {
                let _ = tx.send(Delta::Teams(self.api.teams()?));
                let _ = tx.send(Delta::Groups(self.api.groups()?));
            }
            Page::Stadiums => {
                let _ = tx.send(Delta::Stadiums(self.api.stadiums()?));
            }
            Page::Matches => {
                let _ = tx.send(Delta::Teams(self.api.teams()?));
                let _ = tx.send(Delta::Stadiums(self.api.stadiums()?));
                let _ = tx.send(Delta::Matches(self.api.matches()?));
            }
            Page::Bets => {
                let user_id = self.require_user()?;
                let _ = tx.send(Delta::Bets(self.api.user_bets(user_id)?));
            }
            Page::Scoreboard => {
                let _ = tx.send(Delta::Scoreboard(self.api.scoreboard()?));
            }
            Page::Login | Page::Register | Page::Home | Page::MassBets => {}
        }
        Ok(())
    }

    /// Refetches after a write; failures only reach the console.
    fn reload(&mut self, page: Page, tx: &Sender<Delta>) {
        match self.load(page, tx) {
            Ok(()) => {}
            Err(err) if page == Page::Bets && err.is_unauthorized() => self.expire_session(tx),
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Refresh failed: {err}")));
            }
        }
    }

    fn submit<F>(&mut self, tx: &Sender<Delta>, page: Page, fallback: &str, op: F)
    where
        F: FnOnce(&A) -> ApiResult<String>,
    {
        match op(&self.api) {
            Ok(message) => {
                let _ = tx.send(Delta::Succeeded { page, message });
            }
            Err(err) => fail(tx, page, &err, fallback),
        }
    }

    fn export(&self, path: &Path, tx: &Sender<Delta>) -> anyhow::Result<String> {
        let teams = self.api.teams()?;
        let groups = self.api.groups()?;
        let scoreboard = self.api.scoreboard()?;
        let report = export::export_workbook(path, &groups, &teams, &scoreboard)?;
        let _ = tx.send(Delta::Teams(teams));
        let _ = tx.send(Delta::Groups(groups));
        let _ = tx.send(Delta::Scoreboard(scoreboard));
        info!(path = %path.display(), "export written");
        Ok(format!(
            "Exported {} standings rows and {} users to {}",
            report.standings_rows,
            report.scoreboard_rows,
            path.display()
        ))
    }

    fn require_user(&self) -> ApiResult<UserId> {
        self.user_id
            .ok_or_else(|| ApiError::Invalid("You are not signed in.".to_string()))
    }

    fn expire_session(&mut self, tx: &Sender<Delta>) {
        warn!("backend rejected the token; clearing session");
        self.api.set_token(None);
        self.user_id = None;
        if let Err(err) = self.store.clear() {
            let _ = tx.send(Delta::Log(format!("[WARN] {err:#}")));
        }
        let _ = tx.send(Delta::SessionExpired);
    }
}

fn encode_optional(path: Option<&str>) -> anyhow::Result<Option<String>> {
    path.map(|p| images::encode_image_file(Path::new(p)))
        .transpose()
}

fn log_image_errors(tx: &Sender<Delta>, errors: &[String]) {
    for err in errors {
        let _ = tx.send(Delta::Log(format!("[WARN] Image: {err}")));
    }
}

fn fail(tx: &Sender<Delta>, page: Page, err: &ApiError, fallback: &str) {
    warn!(page = page.title(), error = %err, "request failed");
    fail_plain(tx, page, err.user_message(fallback));
}

fn fail_plain(tx: &Sender<Delta>, page: Page, message: String) {
    let _ = tx.send(Delta::Failed { page, message });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockBetPoolApi;
    use crate::models::{BetRow, BetSchedule, LoginResponse, LoginUser, TeamRef};
    use crate::session::Role;
    use reqwest::StatusCode;
    use std::path::PathBuf;
    use std::sync::mpsc;

    fn temp_session_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("betpool-provider-{}-{name}", std::process::id()))
            .join("session.json")
    }

    fn session(user_id: UserId) -> Session {
        Session {
            token: "tok".to_string(),
            user_id,
            message: "Bienvenido, Ana!".to_string(),
            role: Role::Bettor,
        }
    }

    fn worker(api: MockBetPoolApi, path: &Path, session: Option<Session>) -> Worker<MockBetPoolApi> {
        Worker::new(
            api,
            SessionStore::new(Some(path.to_path_buf())),
            &Config::default(),
            session,
        )
    }

    #[test]
    fn login_without_user_id_stores_nothing() {
        let path = temp_session_path("no-id");
        let mut api = MockBetPoolApi::new();
        api.expect_set_token().returning(|_| ());
        api.expect_login().times(1).returning(|_, _| {
            Ok(LoginResponse {
                message: "Bienvenido, Ana!".to_string(),
                token: Some("tok".to_string()),
                user: Some(LoginUser {
                    id: None,
                    name: "Ana".to_string(),
                    role: None,
                }),
            })
        });

        let mut worker = worker(api, &path, None);
        let (tx, rx) = mpsc::channel();
        worker.handle(
            ProviderCommand::Login {
                email: "ana@x.co".to_string(),
                password: "secret".to_string(),
            },
            &tx,
        );

        let deltas: Vec<Delta> = rx.try_iter().collect();
        assert!(matches!(deltas.as_slice(), [Delta::Failed { page: Page::Login, .. }]));
        assert!(!path.exists());
    }

    #[test]
    fn admin_login_persists_session_and_token() {
        let path = temp_session_path("admin");
        let mut api = MockBetPoolApi::new();
        api.expect_set_token()
            .withf(|token| token.is_none())
            .times(1)
            .returning(|_| ());
        api.expect_set_token()
            .withf(|token| token.as_deref() == Some("abc"))
            .times(1)
            .returning(|_| ());
        api.expect_login().times(1).returning(|_, _| {
            Ok(LoginResponse {
                message: "Bienvenido, Admin User!".to_string(),
                token: Some("abc".to_string()),
                user: Some(LoginUser {
                    id: Some(1),
                    name: "Admin User".to_string(),
                    role: None,
                }),
            })
        });

        let mut worker = worker(api, &path, None);
        let (tx, rx) = mpsc::channel();
        worker.handle(
            ProviderCommand::Login {
                email: "admin@x.co".to_string(),
                password: "secret".to_string(),
            },
            &tx,
        );

        let deltas: Vec<Delta> = rx.try_iter().collect();
        let [Delta::LoggedIn(session)] = deltas.as_slice() else {
            panic!("unexpected deltas: {deltas:?}");
        };
        assert!(session.is_admin());
        let stored = SessionStore::new(Some(path.clone())).load().unwrap();
        assert_eq!(&stored, session);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unauthorized_bets_clear_the_session() {
        let path = temp_session_path("expired");
        let store = SessionStore::new(Some(path.clone()));
        store.save(&session(9)).unwrap();

        let mut api = MockBetPoolApi::new();
        api.expect_set_token().returning(|_| ());
        api.expect_user_bets().times(1).returning(|_| {
            Err(ApiError::Status {
                status: StatusCode::UNAUTHORIZED,
                message: Some("Unauthenticated.".to_string()),
            })
        });

        let mut worker = worker(api, &path, Some(session(9)));
        let (tx, rx) = mpsc::channel();
        worker.handle(ProviderCommand::Load(Page::Bets), &tx);

        let deltas: Vec<Delta> = rx.try_iter().collect();
        assert_eq!(deltas, vec![Delta::SessionExpired]);
        assert!(store.load().is_none());
        assert!(worker.user_id.is_none());
    }

    #[test]
    fn unauthorized_bet_update_expires_the_session() {
        let path = temp_session_path("bet-expired");
        let store = SessionStore::new(Some(path.clone()));
        store.save(&session(9)).unwrap();

        let mut api = MockBetPoolApi::new();
        api.expect_set_token().returning(|_| ());
        api.expect_update_bet()
            .withf(|id, update| *id == 501 && update.id_user == 9 && update.score_team1 == 2)
            .times(1)
            .returning(|_, _| {
                Err(ApiError::Status {
                    status: StatusCode::UNAUTHORIZED,
                    message: Some("Unauthenticated.".to_string()),
                })
            });
        api.expect_user_bets().never();

        let mut worker = worker(api, &path, Some(session(9)));
        let (tx, rx) = mpsc::channel();
        let row = BetRow {
            id: 501,
            id_bet: Some(501),
            predicted1: None,
            predicted2: None,
            points: None,
            schedule: BetSchedule {
                id: 41,
                date_time: Some("2099-06-20 18:00:00".to_string()),
                score1: None,
                score2: None,
                team1: TeamRef {
                    id: Some(1),
                    name: "Colombia".to_string(),
                    shield: None,
                },
                team2: TeamRef {
                    id: Some(2),
                    name: "Brasil".to_string(),
                    shield: None,
                },
                stadium: None,
            },
        };
        worker.handle(
            ProviderCommand::PlaceBet {
                row,
                score1: "2".to_string(),
                score2: "1".to_string(),
            },
            &tx,
        );

        let deltas: Vec<Delta> = rx.try_iter().collect();
        assert_eq!(deltas, vec![Delta::SessionExpired]);
        assert!(!path.exists());
        assert!(worker.user_id.is_none());
    }

    #[test]
    fn failed_processing_reports_on_the_row_only() {
        let path = temp_session_path("process");
        let mut api = MockBetPoolApi::new();
        api.expect_set_token().returning(|_| ());
        api.expect_update_group_statistics()
            .times(1)
            .returning(|_| Ok(()));
        api.expect_update_bet_points().times(1).returning(|_| {
            Err(ApiError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: None,
            })
        });
        api.expect_update_match().never();
        api.expect_matches().never();

        let mut worker = worker(api, &path, Some(session(1)));
        let (tx, rx) = mpsc::channel();
        let m = crate::models::Match {
            id: 3,
            team1_id: 1,
            team2_id: 2,
            stadium_id: None,
            date_time: "2025-06-14 14:00:00".to_string(),
            score1: Some(0),
            score2: Some(0),
            processed: false,
        };
        worker.handle(ProviderCommand::ProcessMatch(m), &tx);

        let deltas: Vec<Delta> = rx.try_iter().collect();
        assert_eq!(
            deltas,
            vec![Delta::RowFinished {
                kind: RowKind::Match,
                id: 3,
                result: Err("Could not process the match".to_string()),
            }]
        );
    }
}
