use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Id;

use super::jwt::{decode_claims, Claims};
use super::Role;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Lifetime assumed for tokens that carry no `exp` claim
const DEFAULT_EXPIRY_HOURS: i64 = 12;

/// Buffer time before expiry to trigger refresh (5 minutes)
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub claims: Claims,
    /// E-mail the user logged in with
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    /// Decode `token` and start a session for `email`
    pub fn from_token(token: impl Into<String>, email: &str) -> Result<Self> {
        let token = token.into();
        let claims = decode_claims(&token).context("Login returned an unreadable token")?;
        debug!(sub = ?claims.sub, role = ?claims.role(), gym_id = ?claims.gym_id, "Decoded token");
        Ok(Self {
            token,
            claims,
            email: email.to_string(),
            created_at: Utc::now(),
        })
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.claims
            .expires_at()
            .unwrap_or(self.created_at + Duration::hours(DEFAULT_EXPIRY_HOURS))
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at()
    }

    /// Check if the session will expire soon and should be refreshed
    pub fn needs_refresh(&self) -> bool {
        let refresh_at = self.expires_at() - Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES);
        Utc::now() > refresh_at
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at() - Utc::now()
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }

    pub fn role(&self) -> Option<Role> {
        self.claims.role()
    }

    pub fn gym_id(&self) -> Option<Id> {
        self.claims.gym_id
    }

    /// Name from the token, else the login e-mail
    pub fn display_name(&self) -> &str {
        self.claims
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.email)
    }
}

pub struct Session {
    cache_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: None,
        }
    }

    /// Load session from disk; expired sessions are ignored
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read session file")?;
            let data: SessionData = serde_json::from_str(&contents)
                .context("Failed to parse session file")?;

            if !data.is_expired() {
                self.data = Some(data);
                return Ok(true);
            }
            debug!("Stored session expired");
        }
        Ok(false)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(&path, contents).context("Failed to write session file")?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }

    /// Update session with new data
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Get the bearer token if a session exists
    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }

    pub fn role(&self) -> Option<Role> {
        self.data.as_ref().and_then(SessionData::role)
    }

    pub fn gym_id(&self) -> Option<Id> {
        self.data.as_ref().and_then(SessionData::gym_id)
    }

    // ===== Role checks =====

    pub fn is_system_admin(&self) -> bool {
        self.role() == Some(Role::SystemAdmin)
    }

    /// Admin or System Admin
    pub fn is_admin(&self) -> bool {
        self.role() >= Some(Role::Admin)
    }

    pub fn is_staff_or_above(&self) -> bool {
        self.role() >= Some(Role::Staff)
    }

    pub fn is_trainer(&self) -> bool {
        self.role() == Some(Role::Trainer)
    }

    pub fn is_member(&self) -> bool {
        self.role() == Some(Role::Member)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.role().map(|r| roles.contains(&r)).unwrap_or(false)
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::tests::token;
    use serde_json::json;

    fn session_for(role: &str, exp: Option<i64>) -> Session {
        let mut claims = json!({"sub": "1", "role": role, "gymId": 5});
        if let Some(exp) = exp {
            claims["exp"] = json!(exp);
        }
        let mut session = Session::new(PathBuf::from("/nonexistent"));
        session.update(SessionData::from_token(token(claims), "user@gym.test").unwrap());
        session
    }

    fn in_hours(h: i64) -> i64 {
        (Utc::now() + Duration::hours(h)).timestamp()
    }

    #[test]
    fn test_expiry_from_claim() {
        let session = session_for("ADMIN", Some(in_hours(1)));
        assert!(session.is_valid());
        let data = session.data.as_ref().unwrap();
        assert!(!data.needs_refresh());
        assert!(data.minutes_until_expiry() > 55);

        let expired = session_for("ADMIN", Some(in_hours(-1)));
        assert!(!expired.is_valid());
    }

    #[test]
    fn test_refresh_window() {
        let soon = (Utc::now() + Duration::minutes(3)).timestamp();
        let session = session_for("STAFF", Some(soon));
        assert!(session.data.as_ref().unwrap().needs_refresh());
        assert!(session.is_valid());
    }

    #[test]
    fn test_default_expiry_without_exp() {
        let session = session_for("MEMBER", None);
        let data = session.data.as_ref().unwrap();
        let hours = data.time_until_expiry().num_minutes() as f64 / 60.0;
        assert!((11.9..=12.0).contains(&hours));
    }

    #[test]
    fn test_role_predicates() {
        let sys = session_for("SYSTEM_ADMIN", None);
        assert!(sys.is_system_admin());
        assert!(sys.is_admin());
        assert!(sys.is_staff_or_above());

        let staff = session_for("STAFF", None);
        assert!(!staff.is_admin());
        assert!(staff.is_staff_or_above());
        assert!(staff.has_any_role(&[Role::Staff, Role::Trainer]));

        let trainer = session_for("TRAINER", None);
        assert!(trainer.is_trainer());
        assert!(!trainer.is_staff_or_above());
        assert_eq!(trainer.gym_id(), Some(5));

        let empty = Session::new(PathBuf::from("/nonexistent"));
        assert!(!empty.is_admin());
        assert!(!empty.has_any_role(&Role::ALL));
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let session = session_for("ADMIN", None);
        assert_eq!(session.data.as_ref().unwrap().display_name(), "user@gym.test");
    }
}
