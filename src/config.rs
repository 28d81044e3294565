use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ADMIN_GREETING: &str = "Bienvenido, Admin User!";
pub const DEFAULT_EXPORT_FILE: &str = "betpool_export.xlsx";
const APP_DIR: &str = "betpool_terminal";

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: Option<String>,
    pub http_timeout: Duration,
    pub admin_greeting: String,
    pub session_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub export_path: PathBuf,
    pub tournament_id: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: None,
            http_timeout: Duration::from_secs(15),
            admin_greeting: DEFAULT_ADMIN_GREETING.to_string(),
            session_file: default_config_dir().map(|dir| dir.join("session.json")),
            log_file: default_state_dir().map(|dir| dir.join("betpool.log")),
            export_path: PathBuf::from(DEFAULT_EXPORT_FILE),
            tournament_id: 1,
        }
    }
}

impl Config {
    /// Reads the environment; call after `load_dotenv`.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        let backend_url = env::var("BETPOOL_BACKEND_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        let timeout_secs = env::var("BETPOOL_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(15)
            .clamp(3, 120);
        let admin_greeting = env::var("BETPOOL_ADMIN_GREETING")
            .ok()
            .filter(|val| !val.trim().is_empty())
            .unwrap_or(defaults.admin_greeting);
        let tournament_id = env::var("BETPOOL_TOURNAMENT_ID")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.tournament_id);

        Self {
            backend_url,
            http_timeout: Duration::from_secs(timeout_secs),
            admin_greeting,
            session_file: path_env("BETPOOL_SESSION_FILE").or(defaults.session_file),
            log_file: path_env("BETPOOL_LOG_FILE").or(defaults.log_file),
            export_path: path_env("BETPOOL_EXPORT_PATH").unwrap_or(defaults.export_path),
            tournament_id,
        }
    }
}

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

fn path_env(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|val| !val.trim().is_empty())
        .map(PathBuf::from)
}

fn default_config_dir() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

fn default_state_dir() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", ".local/state")
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Ok(base) = env::var(var) {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(home_fallback).join(APP_DIR))
}
