use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::{LoginResponse, UserId};

const SESSION_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Bettor,
}

impl Role {
    /// An explicit backend role wins; otherwise fall back to the greeting text.
    pub fn resolve(explicit: Option<&str>, message: &str, admin_greeting: &str) -> Self {
        if let Some(role) = explicit.map(str::trim).filter(|r| !r.is_empty()) {
            return if role.eq_ignore_ascii_case("admin") || role.eq_ignore_ascii_case("administrator")
            {
                Role::Admin
            } else {
                Role::Bettor
            };
        }
        if message.trim() == admin_greeting.trim() {
            Role::Admin
        } else {
            Role::Bettor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub message: String,
    pub role: Role,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Builds a session from `POST /login`; refuses responses lacking a token or user id.
    pub fn from_login(resp: LoginResponse, admin_greeting: &str) -> Result<Self, ApiError> {
        let token = resp
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ApiError::Invalid("Login response did not include a token.".into()))?;
        let user = resp.user.as_ref();
        let user_id = user.and_then(|u| u.id).ok_or_else(|| {
            ApiError::Invalid(
                "Could not read the user id from the login response. Please log in again.".into(),
            )
        })?;
        let role = Role::resolve(
            user.and_then(|u| u.role.as_deref()),
            &resp.message,
            admin_greeting,
        );
        Ok(Self {
            token,
            user_id,
            message: resp.message,
            role,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    session: Session,
}

/// Persists the session between runs; a missing path disables persistence.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: Option<PathBuf>,
}

impl SessionStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Reads the stored session; anything unreadable counts as logged out.
    pub fn load(&self) -> Option<Session> {
        let path = self.path.as_ref()?;
        let raw = fs::read_to_string(path).ok()?;
        let file = serde_json::from_str::<SessionFile>(&raw).ok()?;
        if file.version != SESSION_VERSION {
            return None;
        }
        let session = file.session;
        if session.token.trim().is_empty() {
            return None;
        }
        Some(session)
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).ok();
        }
        let file = SessionFile {
            version: SESSION_VERSION,
            session: session.clone(),
        };
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&file).context("serialize session")?;
        fs::write(&tmp, json).context("write session")?;
        fs::rename(&tmp, path).context("swap session")?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_role_beats_greeting() {
        let greeting = "Bienvenido, Admin User!";
        assert_eq!(Role::resolve(Some("admin"), "hola", greeting), Role::Admin);
        assert_eq!(Role::resolve(Some("Bet_User"), greeting, greeting), Role::Bettor);
        assert_eq!(Role::resolve(None, greeting, greeting), Role::Admin);
        assert_eq!(Role::resolve(Some("  "), "Bienvenido, Ana!", greeting), Role::Bettor);
    }
}
