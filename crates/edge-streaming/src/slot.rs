//! Slots: named placeholders in the streamed body that are filled later.

use crate::escape::escape_html;

/// A named slot in the page body.
///
/// The placeholder is sent with the body; the real content arrives later in
/// the stream as a fill for the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Slot name. Unique within a page.
    pub name: String,
    /// Placeholder HTML shown until the fill arrives.
    pub placeholder: String,
    /// Names of the data dependencies this slot waits on.
    pub dependencies: Vec<String>,
}

impl Slot {
    /// Create a slot with an empty placeholder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            placeholder: String::new(),
            dependencies: Vec::new(),
        }
    }

    /// Set the placeholder HTML.
    pub fn with_placeholder(mut self, html: impl Into<String>) -> Self {
        self.placeholder = html.into();
        self
    }

    /// Add a dependency name.
    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    /// DOM id of the slot container.
    pub fn dom_id(&self) -> String {
        slot_dom_id(&self.name)
    }

    /// Render the slot container with its placeholder.
    pub fn render(&self) -> String {
        format!(
            r#"<div id="{}" data-slot="{}" aria-busy="true">{}</div>"#,
            escape_html(&self.dom_id()),
            escape_html(&self.name),
            self.placeholder
        )
    }
}

/// DOM id used for a slot container.
pub fn slot_dom_id(name: &str) -> String {
    format!("slot-{}", name)
}
