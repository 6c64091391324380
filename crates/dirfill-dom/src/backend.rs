use crate::fixture::NodeSpec;
use async_trait::async_trait;
use dirfill_common::error::DomError;
use dirfill_common::page::{Element, ElementState, Mutation, MutationKind};
use dirfill_engine::backend::DomBackend;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

const MUTATION_CHANNEL_CAPACITY: usize = 64;

/// An in-memory live document.
///
/// Elements are held in document order. Subtree insertions and removals
/// publish mutation notifications; value writes do not, mirroring a
/// child-list subtree observer. State sits behind a mutex so the document
/// can be driven concurrently from overlapping passes.
pub struct MemoryDom {
    inner: Mutex<DocumentState>,
    mutations: broadcast::Sender<Mutation>,
}

#[derive(Default)]
struct DocumentState {
    elements: Vec<Element>,
    next_id: u32,
    events: HashMap<u32, Vec<String>>,
    highlights: HashMap<u32, Instant>,
}

impl MemoryDom {
    pub fn new() -> Self {
        let (mutations, _) = broadcast::channel(MUTATION_CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(DocumentState::default()),
            mutations,
        }
    }

    pub fn from_fixture(nodes: &[NodeSpec]) -> Self {
        let dom = Self::new();
        {
            let mut state = dom.state();
            for node in nodes {
                Self::insert_node(&mut state, node, None);
            }
        }
        dom
    }

    /// Insert a subtree and publish an `Added` mutation for its root.
    pub fn insert(&self, parent: Option<u32>, node: &NodeSpec) -> u32 {
        let id = {
            let mut state = self.state();
            Self::insert_node(&mut state, node, parent)
        };
        let _ = self.mutations.send(Mutation {
            id,
            kind: MutationKind::Added,
        });
        id
    }

    /// Remove an element and its descendants, publishing a `Removed`
    /// mutation for the subtree root.
    pub fn remove(&self, id: u32) {
        {
            let mut state = self.state();
            let mut doomed = vec![id];
            let mut i = 0;
            while i < doomed.len() {
                let current = doomed[i];
                doomed.extend(
                    state
                        .elements
                        .iter()
                        .filter(|e| e.parent == Some(current))
                        .map(|e| e.id),
                );
                i += 1;
            }
            state.elements.retain(|e| !doomed.contains(&e.id));
            for el in state.elements.iter_mut() {
                el.children.retain(|c| !doomed.contains(c));
            }
        }
        let _ = self.mutations.send(Mutation {
            id,
            kind: MutationKind::Removed,
        });
    }

    /// Events synthesized on an element, in dispatch order.
    pub fn events(&self, id: u32) -> Vec<String> {
        self.state().events.get(&id).cloned().unwrap_or_default()
    }

    /// Whether the fill highlight is currently visible on an element.
    pub fn is_highlighted(&self, id: u32) -> bool {
        self.state()
            .highlights
            .get(&id)
            .is_some_and(|until| Instant::now() < *until)
    }

    pub fn value_of(&self, id: u32) -> Option<String> {
        self.state()
            .elements
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.value.clone())
    }

    pub fn text_of(&self, id: u32) -> Option<String> {
        self.state()
            .elements
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.text.clone())
    }

    /// First element carrying the given attribute value, for tests and
    /// demo reporting.
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<u32> {
        self.state()
            .elements
            .iter()
            .find(|e| e.attr(name) == Some(value))
            .map(|e| e.id)
    }

    fn state(&self) -> MutexGuard<'_, DocumentState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert_node(state: &mut DocumentState, node: &NodeSpec, parent: Option<u32>) -> u32 {
        state.next_id += 1;
        let id = state.next_id;
        state.elements.push(Element {
            id,
            tag: node.tag.clone(),
            attributes: node.attrs.clone(),
            text: node.text.clone(),
            value: node.value.clone(),
            state: ElementState {
                disabled: node.disabled,
                readonly: node.readonly,
            },
            parent,
            children: Vec::new(),
        });
        if let Some(pid) = parent {
            if let Some(p) = state.elements.iter_mut().find(|e| e.id == pid) {
                p.children.push(id);
            }
        }
        for child in &node.children {
            Self::insert_node(state, child, Some(id));
        }
        id
    }

    fn with_element<T>(
        &self,
        id: u32,
        f: impl FnOnce(&mut Element) -> Result<T, DomError>,
    ) -> Result<T, DomError> {
        let mut state = self.state();
        match state.elements.iter_mut().find(|e| e.id == id) {
            Some(el) => f(el),
            None => Err(DomError::ElementNotFound { id }),
        }
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DomBackend for MemoryDom {
    async fn snapshot(&self) -> Result<Vec<Element>, DomError> {
        Ok(self.state().elements.clone())
    }

    async fn element(&self, id: u32) -> Result<Element, DomError> {
        self.state()
            .elements
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(DomError::ElementNotFound { id })
    }

    async fn write_value(&self, id: u32, value: &str) -> Result<(), DomError> {
        self.with_element(id, |el| {
            if el.state.disabled {
                return Err(DomError::ElementDisabled { id });
            }
            el.value = Some(value.to_string());
            Ok(())
        })
    }

    async fn write_text(&self, id: u32, text: &str) -> Result<(), DomError> {
        self.with_element(id, |el| {
            if el.state.disabled {
                return Err(DomError::ElementDisabled { id });
            }
            el.text = Some(text.to_string());
            Ok(())
        })
    }

    async fn dispatch_input_events(&self, id: u32) -> Result<(), DomError> {
        let mut state = self.state();
        if !state.elements.iter().any(|e| e.id == id) {
            return Err(DomError::ElementNotFound { id });
        }
        state
            .events
            .entry(id)
            .or_default()
            .extend(["input".to_string(), "change".to_string()]);
        Ok(())
    }

    async fn highlight(&self, id: u32, clear_after: Duration) -> Result<(), DomError> {
        let mut state = self.state();
        if !state.elements.iter().any(|e| e.id == id) {
            return Err(DomError::ElementNotFound { id });
        }
        state.highlights.insert(id, Instant::now() + clear_after);
        Ok(())
    }

    fn mutations(&self) -> broadcast::Receiver<Mutation> {
        self.mutations.subscribe()
    }
}
