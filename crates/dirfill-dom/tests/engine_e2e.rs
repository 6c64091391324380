use async_trait::async_trait;
use dirfill_common::error::LookupError;
use dirfill_dom::{MemoryDom, NodeSpec};
use dirfill_engine::config::StoreError;
use dirfill_engine::engine::{FillEngine, PassOutcome};
use dirfill_engine::resolver::{CacheStore, UsernameLookup};
use dirfill_engine::settings::Settings;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct StaticLookup(&'static str);

#[async_trait]
impl UsernameLookup for StaticLookup {
    async fn lookup(&self, _deadline: Duration) -> Result<String, LookupError> {
        Ok(self.0.to_string())
    }
}

struct CountingLookup {
    calls: AtomicUsize,
}

#[async_trait]
impl UsernameLookup for CountingLookup {
    async fn lookup(&self, _deadline: Duration) -> Result<String, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("asmith".to_string())
    }
}

struct NullCache;

#[async_trait]
impl CacheStore for NullCache {
    async fn save_username(&self, _username: &str, _cached_at: u64) -> Result<(), StoreError> {
        Ok(())
    }
}

fn settings(tries: u32, interval_ms: u64) -> Settings {
    Settings {
        tries,
        interval_ms,
        ..Settings::default()
    }
}

fn engine(dom: &Arc<MemoryDom>, lookup: Arc<dyn UsernameLookup>, cfg: Settings) -> Arc<FillEngine> {
    Arc::new(FillEngine::new(
        dom.clone(),
        lookup,
        Arc::new(NullCache),
        cfg,
    ))
}

#[tokio::test(start_paused = true)]
async fn cascade_fills_on_the_initial_pass_and_stops() {
    let dom = Arc::new(MemoryDom::new());
    let id = dom.insert(None, &NodeSpec::new("input").attr("id", "customfield_12345"));
    let lookup = Arc::new(CountingLookup {
        calls: AtomicUsize::new(0),
    });
    let engine = engine(&dom, lookup.clone(), settings(3, 100));

    let outcome = engine.run_cascade().await;

    match outcome {
        PassOutcome::Filled(o) => {
            assert_eq!(o.filled, 1);
            assert_eq!(o.total, 1);
        }
        other => panic!("expected Filled, got {other:?}"),
    }
    assert_eq!(dom.value_of(id).as_deref(), Some("asmith"));
    // Success is terminal: one pass, one lookup.
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cascade_picks_up_a_field_appearing_mid_retry() {
    let dom = Arc::new(MemoryDom::new());
    let engine = engine(&dom, Arc::new(StaticLookup("asmith")), settings(5, 100));

    let dom_late = dom.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        dom_late.insert(None, &NodeSpec::new("input").attr("name", "username"));
    });

    let outcome = engine.run_cascade().await;
    assert!(outcome.is_success());

    let id = dom.find_by_attr("name", "username").unwrap();
    assert_eq!(dom.value_of(id).as_deref(), Some("asmith"));
}

#[tokio::test(start_paused = true)]
async fn mutation_pass_fills_a_field_appearing_after_exhaustion() {
    let dom = Arc::new(MemoryDom::new());
    let engine = engine(&dom, Arc::new(StaticLookup("asmith")), settings(2, 100));

    let watcher = engine.clone().watch_mutations();
    let outcome = engine.run_cascade().await;
    assert!(matches!(outcome, PassOutcome::NoCandidates));

    // Long after the cascade gave up, the page renders the field.
    tokio::time::sleep(Duration::from_secs(30)).await;
    let id = dom.insert(
        None,
        &NodeSpec::new("div").child(NodeSpec::new("input").attr("id", "customfield_12345")),
    );
    tokio::time::sleep(Duration::from_millis(50)).await;

    let input = dom.find_by_attr("id", "customfield_12345").unwrap();
    assert_ne!(input, id);
    assert_eq!(dom.value_of(input).as_deref(), Some("asmith"));
    assert_eq!(dom.events(input), vec!["input", "change"]);

    watcher.abort();
}

#[tokio::test(start_paused = true)]
async fn overlapping_passes_fill_a_field_exactly_once() {
    let dom = Arc::new(MemoryDom::new());
    let engine = engine(&dom, Arc::new(StaticLookup("asmith")), settings(0, 100));

    dom.insert(None, &NodeSpec::new("input").attr("name", "username"));

    // A mutation-triggered pass and a direct pass race the same field.
    let watcher = engine.clone().watch_mutations();
    dom.insert(None, &NodeSpec::new("div"));
    let direct = engine.run_pass().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(direct.is_success());
    let id = dom.find_by_attr("name", "username").unwrap();
    assert_eq!(dom.value_of(id).as_deref(), Some("asmith"));
    // Exactly one writer synthesized events; the loser saw a filled field.
    assert_eq!(dom.events(id), vec!["input", "change"]);

    watcher.abort();
}

#[tokio::test(start_paused = true)]
async fn already_filled_field_counts_as_success_without_a_write() {
    let dom = Arc::new(MemoryDom::new());
    let id = dom.insert(
        None,
        &NodeSpec::new("input")
            .attr("id", "customfield_12345")
            .value("prefilled"),
    );
    let engine = engine(&dom, Arc::new(StaticLookup("asmith")), settings(3, 100));

    let outcome = engine.run_cascade().await;

    match outcome {
        PassOutcome::Filled(o) => {
            assert_eq!(o.filled, 0);
            assert_eq!(o.already_filled, 1);
        }
        other => panic!("expected Filled, got {other:?}"),
    }
    assert_eq!(dom.value_of(id).as_deref(), Some("prefilled"));
}
