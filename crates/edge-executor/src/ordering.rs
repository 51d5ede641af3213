//! Out-of-order streaming support.

use std::collections::HashMap;

use edge_streaming::{escape_html, slot_dom_id};

/// Strategy for when a finished slot fill may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingStrategy {
    /// Write fills in slot declaration order.
    /// May delay fast slots waiting for slow ones.
    Strict,

    /// Write fills as they complete; the browser moves each into its slot.
    #[default]
    OutOfOrder,
}

impl OrderingStrategy {
    /// Check if this strategy allows out-of-order delivery.
    pub fn allows_out_of_order(&self) -> bool {
        matches!(self, Self::OutOfOrder)
    }
}

/// Script that moves streamed fills into their slots.
///
/// Include once in the shell head. Each fill is a `<template data-fill>`
/// followed by a script calling `__edgeFill(document.currentScript)`.
pub fn fill_runtime_script() -> String {
    let prefix = slot_dom_id("");
    format!(
        r#"window.__edgeFill = function (script) {{
  var tpl = script.previousElementSibling;
  if (!tpl || tpl.tagName !== 'TEMPLATE') return;
  var slot = document.getElementById('{prefix}' + tpl.dataset.fill);
  if (slot) {{
    slot.replaceChildren(tpl.content.cloneNode(true));
    slot.removeAttribute('aria-busy');
  }}
  tpl.remove();
  script.remove();
}};"#
    )
}

/// Wrap rendered slot HTML so the fill runtime can place it.
pub fn fill_fragment(slot: &str, html: &str) -> String {
    format!(
        r#"<template data-fill="{}">{}</template><script>__edgeFill(document.currentScript)</script>"#,
        escape_html(slot),
        html
    )
}

/// Holds finished fills until the ordering strategy lets them out.
#[derive(Debug)]
pub struct FillQueue {
    strategy: OrderingStrategy,
    order: Vec<String>,
    ready: HashMap<String, String>,
    next: usize,
}

impl FillQueue {
    /// Create a queue for slots declared in `order`.
    pub fn new(strategy: OrderingStrategy, order: Vec<String>) -> Self {
        Self {
            strategy,
            order,
            ready: HashMap::new(),
            next: 0,
        }
    }

    /// Record a finished fill and return every fill that may now be written,
    /// in write order. Undeclared slots are released immediately.
    pub fn push(&mut self, slot: impl Into<String>, html: String) -> Vec<(String, String)> {
        let slot = slot.into();

        if self.strategy.allows_out_of_order() || !self.order.contains(&slot) {
            return vec![(slot, html)];
        }

        self.ready.insert(slot, html);

        let mut released = Vec::new();
        while let Some(name) = self.order.get(self.next) {
            match self.ready.remove(name) {
                Some(html) => {
                    released.push((name.clone(), html));
                    self.next += 1;
                }
                None => break,
            }
        }
        released
    }

    /// Whether fills are still being held back.
    pub fn has_held(&self) -> bool {
        !self.ready.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(released: &[(String, String)]) -> Vec<&str> {
        released.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn order() -> Vec<String> {
        vec!["sizes".into(), "recommended".into(), "reviews".into()]
    }

    #[test]
    fn test_out_of_order_releases_immediately() {
        let mut queue = FillQueue::new(OrderingStrategy::OutOfOrder, order());

        assert_eq!(names(&queue.push("reviews", "r".into())), vec!["reviews"]);
        assert_eq!(names(&queue.push("sizes", "s".into())), vec!["sizes"]);
        assert!(!queue.has_held());
    }

    #[test]
    fn test_strict_holds_until_predecessors_finish() {
        let mut queue = FillQueue::new(OrderingStrategy::Strict, order());

        assert!(queue.push("reviews", "r".into()).is_empty());
        assert!(queue.push("recommended", "p".into()).is_empty());
        assert!(queue.has_held());

        let released = queue.push("sizes", "s".into());
        assert_eq!(names(&released), vec!["sizes", "recommended", "reviews"]);
        assert!(!queue.has_held());
    }

    #[test]
    fn test_strict_releases_undeclared_slot() {
        let mut queue = FillQueue::new(OrderingStrategy::Strict, order());
        assert_eq!(names(&queue.push("banner", "b".into())), vec!["banner"]);
    }

    #[test]
    fn test_fill_fragment_targets_slot() {
        let html = fill_fragment("sizes", "<b>M</b>");
        assert!(html.starts_with(r#"<template data-fill="sizes"><b>M</b></template>"#));
        assert!(html.ends_with("<script>__edgeFill(document.currentScript)</script>"));
    }

    #[test]
    fn test_runtime_uses_slot_id_prefix() {
        assert!(fill_runtime_script().contains("getElementById('slot-' + tpl.dataset.fill)"));
    }
}
