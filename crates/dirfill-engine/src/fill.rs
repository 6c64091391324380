//! Fill policy and application.

use crate::backend::DomBackend;
use crate::discovery::Candidate;
use dirfill_common::error::DomError;
use dirfill_common::page::FillOutcome;
use std::time::Duration;
use tracing::debug;

/// How long the cosmetic highlight stays on a freshly filled element.
pub const HIGHLIGHT_CLEAR_AFTER: Duration = Duration::from_millis(2000);

/// Apply the fill policy to each candidate independently.
///
/// Every candidate is re-read from the document: discovery may be stale by
/// the time the write happens, and a concurrent pass may already have
/// filled a field. Non-empty content is never overwritten, which makes
/// repeated application idempotent per field.
pub async fn apply<B: DomBackend + ?Sized>(
    backend: &B,
    candidates: &[Candidate],
    username: &str,
) -> Result<FillOutcome, DomError> {
    let mut outcome = FillOutcome {
        total: candidates.len(),
        ..Default::default()
    };

    for candidate in candidates {
        let element = match backend.element(candidate.id).await {
            Ok(el) => el,
            Err(DomError::ElementNotFound { id }) => {
                debug!(id, "candidate vanished before fill");
                continue;
            }
            Err(e) => return Err(e),
        };

        if !element.is_writable() {
            debug!(id = element.id, "skipping disabled/readonly candidate");
            continue;
        }

        if !element.current_content().trim().is_empty() {
            outcome.already_filled += 1;
            continue;
        }

        if element.is_content_editable() {
            backend.write_text(element.id, username).await?;
        } else {
            backend.write_value(element.id, username).await?;
        }
        backend.dispatch_input_events(element.id).await?;
        backend.highlight(element.id, HIGHLIGHT_CLEAR_AFTER).await?;
        outcome.filled += 1;
        debug!(id = element.id, method = ?candidate.method, "filled candidate");
    }

    Ok(outcome)
}
