//! Username resolution: manual override, then cache, then remote lookup.

use crate::config::StoreError;
use async_trait::async_trait;
use dirfill_common::error::LookupError;
use dirfill_common::settings::Settings;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Deadline the identity-service collaborator must honor per lookup.
pub const REMOTE_LOOKUP_DEADLINE: Duration = Duration::from_secs(5);

/// Capability for the remote identity lookup. The transport (in-process
/// call, HTTP to a loopback service) is the implementation's concern.
#[async_trait]
pub trait UsernameLookup: Send + Sync {
    async fn lookup(&self, deadline: Duration) -> Result<String, LookupError>;
}

/// Persistence collaborator for the username cache. Writes are
/// single-record, last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn save_username(&self, username: &str, cached_at: u64) -> Result<(), StoreError>;
}

/// Resolve the best-available username, first match wins:
///
/// 1. the manual override, trimmed, if non-empty (never cached);
/// 2. the cached username, as stored, regardless of its age;
/// 3. the remote lookup; on success the trimmed value is written to the
///    cache before being returned.
///
/// Returns `None` when all three fail. No retries happen here; retry
/// scheduling belongs to the fill engine.
pub async fn resolve(
    settings: &Settings,
    lookup: &dyn UsernameLookup,
    cache: &dyn CacheStore,
) -> Option<String> {
    let manual = settings.manual_username.trim();
    if !manual.is_empty() {
        debug!(username = manual, "using manual override");
        return Some(manual.to_string());
    }

    if !settings.cached_username.trim().is_empty() {
        debug!(username = %settings.cached_username, "using cached username");
        return Some(settings.cached_username.clone());
    }

    match lookup.lookup(REMOTE_LOOKUP_DEADLINE).await {
        Ok(raw) => {
            let username = raw.trim().to_string();
            if username.is_empty() {
                debug!("remote lookup returned a blank username");
                return None;
            }
            if let Err(e) = cache.save_username(&username, now_millis()).await {
                warn!(error = %e, "failed to persist username cache");
            }
            debug!(username = %username, "using remote username");
            Some(username)
        }
        Err(e) => {
            debug!(error = %e, "remote lookup failed");
            None
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
