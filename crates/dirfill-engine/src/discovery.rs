//! Candidate discovery over a document snapshot.
//!
//! Three strategies run unconditionally and are unioned: identifier
//! patterns built from the configured field id, label-text association,
//! and attribute-substring fallbacks. Candidates are deduplicated by
//! element id; order is strategy order, then document order within a
//! strategy. This is a best-effort heuristic: wrong matches and misses
//! are both acceptable outcomes.

use dirfill_common::page::Element;
use dirfill_common::settings::Settings;
use std::collections::HashSet;
use tracing::debug;

/// How a candidate was located. Carried for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryMethod {
    Identifier { selector: String },
    Label { text: String },
    Fallback { selector: String },
}

/// A plausible target for username injection, valid for one scan.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: u32,
    pub method: DiscoveryMethod,
}

pub fn discover(elements: &[Element], settings: &Settings) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    by_identifier(elements, &settings.field_id, &mut seen, &mut candidates);
    by_label(elements, &settings.field_label, &mut seen, &mut candidates);
    by_fallback(elements, &mut seen, &mut candidates);

    candidates
}

/// Fixed selector patterns derived from the configured field id. Each
/// pattern contributes at most its first document-order match.
fn by_identifier(
    elements: &[Element],
    field_id: &str,
    seen: &mut HashSet<u32>,
    out: &mut Vec<Candidate>,
) {
    if field_id.is_empty() {
        return;
    }

    let suffixed = format!("{field_id}-field");
    let patterns = [
        ("name", field_id, format!("[name=\"{field_id}\"]")),
        ("id", field_id, format!("#{field_id}")),
        ("id", suffixed.as_str(), format!("#{suffixed}")),
        ("data-testid", field_id, format!("[data-testid=\"{field_id}\"]")),
    ];

    for (attr, expected, selector) in patterns {
        if let Some(el) = elements.iter().find(|e| e.attr(attr) == Some(expected)) {
            push_unique(seen, out, el.id, DiscoveryMethod::Identifier { selector });
        }
    }
}

/// Label-like elements whose text contains the configured label are
/// associated with a control: explicit `for` reference first, then the
/// first text entry under the nearest enclosing block container.
fn by_label(
    elements: &[Element],
    field_label: &str,
    seen: &mut HashSet<u32>,
    out: &mut Vec<Candidate>,
) {
    if field_label.is_empty() {
        return;
    }

    let needle = field_label.to_lowercase();
    for label in elements.iter().filter(|e| is_label_like(e)) {
        let text = label.text.as_deref().unwrap_or("").trim();
        if !text.to_lowercase().contains(&needle) {
            continue;
        }

        let target = label
            .attr("for")
            .and_then(|for_id| elements.iter().find(|e| e.attr("id") == Some(for_id)))
            .or_else(|| first_text_entry_in_scope(elements, label));

        if let Some(el) = target {
            push_unique(
                seen,
                out,
                el.id,
                DiscoveryMethod::Label {
                    text: text.to_string(),
                },
            );
        }
    }
}

/// Fixed attribute-substring patterns over all inputs, every match in
/// document order.
fn by_fallback(elements: &[Element], seen: &mut HashSet<u32>, out: &mut Vec<Candidate>) {
    let patterns = [
        ("placeholder", "username"),
        ("placeholder", "ad"),
        ("id", "username"),
        ("name", "username"),
    ];

    for (attr, needle) in patterns {
        for el in elements.iter().filter(|e| e.tag == "input") {
            let hit = el
                .attr(attr)
                .is_some_and(|v| v.to_lowercase().contains(needle));
            if hit {
                push_unique(
                    seen,
                    out,
                    el.id,
                    DiscoveryMethod::Fallback {
                        selector: format!("input[{attr}*=\"{needle}\" i]"),
                    },
                );
            }
        }
    }
}

fn is_label_like(e: &Element) -> bool {
    e.tag == "label" || e.attr("role") == Some("label")
}

/// Search scope for a label without a usable `for` reference: nearest
/// enclosing `div`/`section`/`li`, falling back to the direct parent,
/// then the whole document.
fn first_text_entry_in_scope<'a>(
    elements: &'a [Element],
    label: &Element,
) -> Option<&'a Element> {
    match enclosing_block(elements, label).or(label.parent) {
        Some(root) => elements
            .iter()
            .find(|e| e.is_text_entry() && is_descendant(elements, e, root)),
        None => elements.iter().find(|e| e.is_text_entry()),
    }
}

fn enclosing_block(elements: &[Element], from: &Element) -> Option<u32> {
    let mut cur = from.parent;
    while let Some(id) = cur {
        let el = elements.iter().find(|e| e.id == id)?;
        if matches!(el.tag.as_str(), "div" | "section" | "li") {
            return Some(id);
        }
        cur = el.parent;
    }
    None
}

fn is_descendant(elements: &[Element], element: &Element, ancestor: u32) -> bool {
    let mut cur = element.parent;
    while let Some(id) = cur {
        if id == ancestor {
            return true;
        }
        cur = elements.iter().find(|e| e.id == id).and_then(|e| e.parent);
    }
    false
}

fn push_unique(
    seen: &mut HashSet<u32>,
    out: &mut Vec<Candidate>,
    id: u32,
    method: DiscoveryMethod,
) {
    if seen.insert(id) {
        debug!(id, ?method, "candidate found");
        out.push(Candidate { id, method });
    }
}
