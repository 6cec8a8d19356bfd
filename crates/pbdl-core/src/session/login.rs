//! Best-effort form login.
//!
//! Guesses a handful of conventional endpoints and treats HTTP 200/302 on the
//! form POST as "probably authenticated". Nothing checks that the server
//! actually accepted the credentials; a failed login only means later
//! requests run without a session cookie.

use anyhow::Result;
use std::fmt;

use super::Session;

/// Username/password pair. Only built when both parts are non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Option<Self> {
        let username = username.filter(|u| !u.trim().is_empty())?;
        let password = password.filter(|p| !p.is_empty())?;
        Some(Self { username, password })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// An endpoint answered the form POST with 200 or 302.
    Accepted { endpoint: String, status: u32 },
    /// No endpoint accepted the form; the run continues unauthenticated.
    Failed,
}

/// Try each of `paths` (relative to the session's site root) until one accepts the form.
pub fn login(session: &mut Session, creds: &Credentials, paths: &[String]) -> LoginOutcome {
    let root = session.site_root();
    for path in paths {
        let endpoint = if path.starts_with('/') {
            format!("{}{}", root, path)
        } else {
            format!("{}/{}", root, path)
        };
        match attempt(session, &endpoint, creds) {
            Ok(status) if status == 200 || status == 302 => {
                tracing::info!(endpoint = %endpoint, status, "login attempt accepted");
                return LoginOutcome::Accepted { endpoint, status };
            }
            Ok(status) => {
                tracing::debug!(endpoint = %endpoint, status, "login endpoint rejected form");
            }
            Err(e) => {
                tracing::debug!(endpoint = %endpoint, "login attempt failed: {:#}", e);
            }
        }
    }
    tracing::warn!(user = %creds.username, "all login attempts failed; continuing unauthenticated");
    LoginOutcome::Failed
}

/// GET the endpoint first so any session cookie is set, then submit the form.
fn attempt(session: &mut Session, endpoint: &str, creds: &Credentials) -> Result<u32> {
    session.get_text(endpoint)?;
    let head = session.post_form(
        endpoint,
        &[
            ("username", creds.username.as_str()),
            ("password", creds.password.as_str()),
            ("login", "Login"),
            ("submit", "Login"),
        ],
    )?;
    Ok(head.status)
}
