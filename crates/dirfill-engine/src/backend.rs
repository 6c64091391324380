use async_trait::async_trait;
use dirfill_common::error::DomError;
use dirfill_common::page::{Element, Mutation};
use std::time::Duration;
use tokio::sync::broadcast;

/// The DomBackend trait is the document interface the fill engine drives.
///
/// Methods take `&self`: a scheduled retry pass and a mutation-triggered
/// pass may run concurrently against the same document, so implementations
/// use interior mutability.
#[async_trait]
pub trait DomBackend: Send + Sync {
    /// Snapshot of all elements in document order.
    async fn snapshot(&self) -> Result<Vec<Element>, DomError>;

    /// Fresh read of a single element.
    async fn element(&self, id: u32) -> Result<Element, DomError>;

    /// Write the value of an input-like element.
    async fn write_value(&self, id: u32, value: &str) -> Result<(), DomError>;

    /// Write the text content of a content-editable element.
    async fn write_text(&self, id: u32, text: &str) -> Result<(), DomError>;

    /// Synthesize `input` and `change` events so host-page logic observing
    /// them reacts normally.
    async fn dispatch_input_events(&self, id: u32) -> Result<(), DomError>;

    /// Cosmetic highlight on a freshly filled element, cleared by the
    /// document after `clear_after`.
    async fn highlight(&self, id: u32, clear_after: Duration) -> Result<(), DomError> {
        let _ = (id, clear_after);
        Ok(())
    }

    /// Subscribe to subtree mutation notifications.
    fn mutations(&self) -> broadcast::Receiver<Mutation>;
}
