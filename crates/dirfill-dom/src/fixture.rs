//! Declarative page descriptions for building a `MemoryDom`.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One node of a page fixture.
///
/// ```yaml
/// - tag: div
///   children:
///     - tag: label
///       attrs: { for: username }
///       text: AD Username
///     - tag: input
///       attrs: { id: username }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    pub tag: String,
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: HashMap::new(),
            text: None,
            value: None,
            disabled: false,
            readonly: false,
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Failed to read page fixture: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse page fixture: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Load a page fixture from a YAML file.
pub fn load(path: &Path) -> Result<Vec<NodeSpec>, FixtureError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_yaml_parses_with_defaults() {
        let nodes: Vec<NodeSpec> = serde_yaml::from_str(
            r#"
- tag: div
  children:
    - tag: label
      attrs: { for: username }
      text: AD Username
    - tag: input
      attrs: { id: username }
      readonly: true
"#,
        )
        .unwrap();

        assert_eq!(nodes.len(), 1);
        let children = &nodes[0].children;
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].attrs.get("for").map(String::as_str), Some("username"));
        assert!(!children[0].readonly);
        assert!(children[1].readonly);
        assert!(!children[1].disabled);
    }
}
