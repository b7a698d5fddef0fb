use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rand::distributions::{Alphanumeric, DistString};
use tracing::{debug, info};

const SESSION_TOKEN_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect password. Please try again.")]
    InvalidPassword,
    #[error("Incorrect access code.")]
    InvalidAccessCode,
    #[error("admin session required")]
    MissingSession,
    #[error("admin session expired or revoked")]
    ExpiredSession,
}

/// Secrets checked server-side: the dashboard password and the optional form access code.
#[derive(Clone)]
pub struct AccessGate {
    admin_password: String,
    form_access_code: Option<String>,
}

impl AccessGate {
    pub fn new(admin_password: impl Into<String>, form_access_code: Option<String>) -> Self {
        Self {
            admin_password: admin_password.into(),
            form_access_code: form_access_code.filter(|code| !code.is_empty()),
        }
    }

    pub fn verify_password(&self, candidate: &str) -> Result<(), AuthError> {
        if self.admin_password == candidate {
            Ok(())
        } else {
            Err(AuthError::InvalidPassword)
        }
    }

    pub fn requires_access_code(&self) -> bool {
        self.form_access_code.is_some()
    }

    /// Passes when no code is configured.
    pub fn verify_access_code(&self, candidate: Option<&str>) -> Result<(), AuthError> {
        match &self.form_access_code {
            None => Ok(()),
            Some(code) if code == candidate.unwrap_or_default().trim() => Ok(()),
            Some(_) => Err(AuthError::InvalidAccessCode),
        }
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("admin_password", &"<redacted>")
            .field("form_access_code", &self.form_access_code.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Bearer sessions issued after a successful login. Each use slides the expiry forward.
#[derive(Debug)]
pub struct AdminSessions {
    ttl: Duration,
    sessions: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl AdminSessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn login(&self, gate: &AccessGate, password: &str) -> Result<String, AuthError> {
        self.login_at(gate, password, Utc::now())
    }

    pub fn login_at(
        &self,
        gate: &AccessGate,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        gate.verify_password(password)?;
        let token = Alphanumeric.sample_string(&mut rand::thread_rng(), SESSION_TOKEN_LEN);
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), now + self.ttl);
        info!("admin session opened");
        Ok(token)
    }

    pub fn verify(&self, token: Option<&str>) -> Result<(), AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: Option<&str>, now: DateTime<Utc>) -> Result<(), AuthError> {
        let token = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingSession)?;

        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        match sessions.get_mut(token) {
            Some(expires_at) if *expires_at > now => {
                *expires_at = now + self.ttl;
                Ok(())
            }
            Some(_) => {
                sessions.remove(token);
                debug!("admin session expired");
                Err(AuthError::ExpiredSession)
            }
            None => Err(AuthError::ExpiredSession),
        }
    }

    pub fn logout(&self, token: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }

    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, expires_at| *expires_at > now);
        before - sessions.len()
    }

    pub fn active(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
