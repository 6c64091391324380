//! Retry and mutation-reactive scheduling around single scanning passes.

use crate::backend::DomBackend;
use crate::discovery;
use crate::fill;
use crate::resolver::{self, CacheStore, UsernameLookup};
use dirfill_common::page::FillOutcome;
use dirfill_common::settings::Settings;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outcome of one scanning pass (discovery, then resolution, then fill).
#[derive(Debug)]
pub enum PassOutcome {
    /// At least one candidate is filled, whether or not this pass wrote it.
    Filled(FillOutcome),
    /// Candidates and a username were available, but nothing became filled.
    NothingFillable(FillOutcome),
    /// No discovery strategy produced a candidate.
    NoCandidates,
    /// Manual override, cache and remote lookup were all unavailable.
    NoUsername,
}

impl PassOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PassOutcome::Filled(_))
    }
}

/// Drives discovery, resolution and fill over one document, with a bounded
/// retry cascade and fire-and-forget mutation-triggered passes.
pub struct FillEngine {
    backend: Arc<dyn DomBackend>,
    lookup: Arc<dyn UsernameLookup>,
    cache: Arc<dyn CacheStore>,
    settings: Settings,
}

impl FillEngine {
    pub fn new(
        backend: Arc<dyn DomBackend>,
        lookup: Arc<dyn UsernameLookup>,
        cache: Arc<dyn CacheStore>,
        settings: Settings,
    ) -> Self {
        Self {
            backend,
            lookup,
            cache,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// One scanning pass. Discovery strictly precedes resolution, which
    /// strictly precedes fill application. All failures are absorbed into
    /// the outcome; nothing is surfaced to the page.
    pub async fn run_pass(&self) -> PassOutcome {
        let elements = match self.backend.snapshot().await {
            Ok(els) => els,
            Err(e) => {
                warn!(error = %e, "document snapshot failed");
                return PassOutcome::NoCandidates;
            }
        };

        let candidates = discovery::discover(&elements, &self.settings);
        if candidates.is_empty() {
            debug!("no candidate field found");
            return PassOutcome::NoCandidates;
        }

        let Some(username) =
            resolver::resolve(&self.settings, self.lookup.as_ref(), self.cache.as_ref()).await
        else {
            debug!("no username available");
            return PassOutcome::NoUsername;
        };

        match fill::apply(self.backend.as_ref(), &candidates, &username).await {
            Ok(outcome) if outcome.succeeded() => PassOutcome::Filled(outcome),
            Ok(outcome) => PassOutcome::NothingFillable(outcome),
            Err(e) => {
                warn!(error = %e, "fill application failed");
                PassOutcome::NothingFillable(FillOutcome {
                    total: candidates.len(),
                    ..Default::default()
                })
            }
        }
    }

    /// One bounded cascade: an immediate pass, then up to `tries` retries
    /// spaced `interval_ms` apart. Stops permanently on success or
    /// exhaustion; exhaustion is logged, never surfaced.
    pub async fn run_cascade(&self) -> PassOutcome {
        let mut outcome = self.run_pass().await;
        if outcome.is_success() {
            info!("filled on initial pass");
            return outcome;
        }

        let interval = Duration::from_millis(self.settings.interval_ms);
        for attempt in 1..=self.settings.tries {
            tokio::time::sleep(interval).await;
            debug!(attempt, max = self.settings.tries, "retrying fill");
            outcome = self.run_pass().await;
            if outcome.is_success() {
                info!(attempt, "filled after retry");
                return outcome;
            }
        }

        debug!(tries = self.settings.tries, "retry budget exhausted");
        outcome
    }

    /// React to live document mutations with fire-and-forget single
    /// passes. Each notification spawns one pass; no new cascade is
    /// started and no de-duplication against an in-flight pass is
    /// attempted. The fill policy is idempotent per field, so overlap is
    /// safe. A lagging subscriber drops missed notifications and keeps
    /// watching.
    pub fn watch_mutations(self: Arc<Self>) -> JoinHandle<()> {
        let engine = self;
        let mut rx = engine.backend.mutations();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(mutation) => {
                        debug!(id = mutation.id, kind = ?mutation.kind, "document mutated");
                        let engine = Arc::clone(&engine);
                        tokio::spawn(async move {
                            engine.run_pass().await;
                        });
                    }
                    Err(RecvError::Lagged(missed)) => {
                        debug!(missed, "mutation feed lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
