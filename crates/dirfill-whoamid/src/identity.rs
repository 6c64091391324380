//! OS identity collection. Every path degrades instead of failing: the
//! service reports what it can determine and `None`/fallbacks otherwise.

use serde::Serialize;
use tokio::process::Command;
use tracing::debug;

/// The service process's own user, from the `whoami` OS command with an
/// environment fallback. `DOMAIN\user` output is split into its parts.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessUser {
    pub raw: String,
    pub domain: Option<String>,
    pub username: String,
}

pub async fn process_user() -> ProcessUser {
    let mut raw = match Command::new("whoami").output().await {
        Ok(out) if out.status.success() => {
            String::from_utf8_lossy(&out.stdout).trim().to_string()
        }
        Ok(out) => {
            debug!(status = ?out.status, "whoami exited non-zero");
            String::new()
        }
        Err(e) => {
            debug!(error = %e, "whoami unavailable");
            String::new()
        }
    };
    if raw.is_empty() {
        raw = env_user().unwrap_or_else(|| "unknown".to_string());
    }

    let (domain, username) = split_domain(&raw);
    ProcessUser {
        raw,
        domain,
        username,
    }
}

/// The interactively logged-in user, when one is visible from this
/// process's environment. `None` when the service runs detached from any
/// login session.
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleUser {
    pub domain: Option<String>,
    pub username: String,
}

pub fn console_user() -> Option<ConsoleUser> {
    let raw = env_user()?;
    let (domain, username) = split_domain(&raw);
    Some(ConsoleUser { domain, username })
}

fn env_user() -> Option<String> {
    ["USERNAME", "USER", "LOGNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .filter(|v| !v.trim().is_empty())
}

fn split_domain(raw: &str) -> (Option<String>, String) {
    match raw.split_once('\\') {
        Some((domain, user)) => (Some(domain.to_string()), user.to_string()),
        None => (None, raw.to_string()),
    }
}
