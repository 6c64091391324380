use async_trait::async_trait;
use dirfill_common::error::LookupError;
use dirfill_common::settings::Settings;
use dirfill_engine::config::StoreError;
use dirfill_engine::resolver::{CacheStore, UsernameLookup, resolve};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
struct RecordingCache {
    saved: Mutex<Vec<(String, u64)>>,
}

#[async_trait]
impl CacheStore for RecordingCache {
    async fn save_username(&self, username: &str, cached_at: u64) -> Result<(), StoreError> {
        self.saved
            .lock()
            .unwrap()
            .push((username.to_string(), cached_at));
        Ok(())
    }
}

struct StaticLookup {
    username: &'static str,
    calls: AtomicUsize,
}

impl StaticLookup {
    fn new(username: &'static str) -> Self {
        Self {
            username,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl UsernameLookup for StaticLookup {
    async fn lookup(&self, _deadline: Duration) -> Result<String, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.username.to_string())
    }
}

struct FailingLookup;

#[async_trait]
impl UsernameLookup for FailingLookup {
    async fn lookup(&self, _deadline: Duration) -> Result<String, LookupError> {
        Err(LookupError::Network("connection refused".to_string()))
    }
}

/// Honors the deadline the way the HTTP collaborator does, against a
/// service that never answers.
struct SlowLookup;

#[async_trait]
impl UsernameLookup for SlowLookup {
    async fn lookup(&self, deadline: Duration) -> Result<String, LookupError> {
        match tokio::time::timeout(deadline, tokio::time::sleep(Duration::from_secs(600))).await {
            Ok(()) => Ok("too-late".to_string()),
            Err(_) => Err(LookupError::Timeout),
        }
    }
}

#[tokio::test]
async fn manual_override_wins_and_is_trimmed() {
    let settings = Settings {
        manual_username: "  jdoe  ".to_string(),
        cached_username: "stale".to_string(),
        ..Settings::default()
    };
    let lookup = StaticLookup::new("remote");
    let cache = RecordingCache::default();

    let resolved = resolve(&settings, &lookup, &cache).await;

    assert_eq!(resolved.as_deref(), Some("jdoe"));
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    assert!(cache.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cached_username_is_used_without_a_remote_call() {
    let settings = Settings {
        cached_username: "cached-user".to_string(),
        ..Settings::default()
    };
    let lookup = StaticLookup::new("remote");
    let cache = RecordingCache::default();

    let resolved = resolve(&settings, &lookup, &cache).await;

    assert_eq!(resolved.as_deref(), Some("cached-user"));
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    assert!(cache.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn remote_success_is_trimmed_and_cached() {
    let settings = Settings::default();
    let lookup = StaticLookup::new("  jdoe  ");
    let cache = RecordingCache::default();
    let before = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64;

    let resolved = resolve(&settings, &lookup, &cache).await;

    assert_eq!(resolved.as_deref(), Some("jdoe"));
    let saved = cache.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "jdoe");
    assert!(saved[0].1 >= before);
}

#[tokio::test]
async fn remote_failure_resolves_to_nothing_and_leaves_the_cache() {
    let settings = Settings::default();
    let cache = RecordingCache::default();

    let resolved = resolve(&settings, &FailingLookup, &cache).await;

    assert!(resolved.is_none());
    assert!(cache.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn blank_remote_username_is_a_failure() {
    let settings = Settings::default();
    let lookup = StaticLookup::new("   ");
    let cache = RecordingCache::default();

    let resolved = resolve(&settings, &lookup, &cache).await;

    assert!(resolved.is_none());
    assert!(cache.saved.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn remote_timeout_fails_at_the_deadline() {
    let settings = Settings::default();
    let cache = RecordingCache::default();
    let start = tokio::time::Instant::now();

    let resolved = resolve(&settings, &SlowLookup, &cache).await;

    assert!(resolved.is_none());
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(5), "failed early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(6), "failed late: {elapsed:?}");
}
