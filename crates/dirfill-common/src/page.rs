use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A document node as seen by the fill engine.
///
/// Ids are assigned in document order and are the identity used for
/// candidate deduplication. Parent/child links are kept so discovery can
/// walk enclosing containers without re-querying the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: u32,
    pub tag: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    pub text: Option<String>,
    pub value: Option<String>,
    #[serde(default)]
    pub state: ElementState,
    pub parent: Option<u32>,
    #[serde(default)]
    pub children: Vec<u32>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Content-editable hosts carry the attribute in any form, including
    /// `contenteditable=""`.
    pub fn is_content_editable(&self) -> bool {
        self.attributes.contains_key("contenteditable")
    }

    /// Current user-visible content: text content for content-editable
    /// elements, the value otherwise.
    pub fn current_content(&self) -> &str {
        if self.is_content_editable() {
            self.text.as_deref().unwrap_or("")
        } else {
            self.value.as_deref().unwrap_or("")
        }
    }

    pub fn is_writable(&self) -> bool {
        !self.state.disabled && !self.state.readonly
    }

    pub fn is_text_entry(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ElementState {
    pub disabled: bool,
    pub readonly: bool,
}

/// Subtree change notification published by a live document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mutation {
    /// Root of the added or removed subtree.
    pub id: u32,
    pub kind: MutationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Added,
    Removed,
}

/// Counters for one fill application over a candidate set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FillOutcome {
    pub filled: usize,
    pub already_filled: usize,
    pub total: usize,
}

impl FillOutcome {
    /// "Something is filled", not necessarily "something changed".
    pub fn succeeded(&self) -> bool {
        self.filled > 0 || self.already_filled > 0
    }
}
