//! Fallback strategies for slot failures.

use edge_streaming::escape_html;

/// What to fill a slot with when its data failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FallbackStrategy {
    /// Render fallback HTML.
    RenderFallback(String),

    /// Fill the slot with nothing.
    Skip,

    /// Show an error message naming the section.
    #[default]
    ShowError,
}

impl FallbackStrategy {
    /// Create a fallback that renders custom HTML.
    pub fn html(html: impl Into<String>) -> Self {
        Self::RenderFallback(html.into())
    }
}

/// Result of applying a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackResult {
    /// Rendered fallback HTML.
    Rendered(String),
    /// Slot is emptied.
    Skipped,
}

impl FallbackResult {
    /// HTML to fill the slot with.
    pub fn into_html(self) -> String {
        match self {
            Self::Rendered(html) => html,
            Self::Skipped => String::new(),
        }
    }
}

/// Apply fallback strategy for the section labelled `label`.
pub fn apply_fallback(strategy: &FallbackStrategy, label: &str, error: &str) -> FallbackResult {
    match strategy {
        FallbackStrategy::RenderFallback(html) => FallbackResult::Rendered(html.clone()),
        FallbackStrategy::Skip => FallbackResult::Skipped,
        FallbackStrategy::ShowError => FallbackResult::Rendered(format!(
            r#"<div class="section-error" role="alert"><p>Couldn't load {}.</p><p class="section-error-detail">{}</p></div>"#,
            escape_html(label),
            escape_html(error)
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_error_escapes() {
        let html = apply_fallback(&FallbackStrategy::ShowError, "reviews", "HTTP <503>").into_html();
        assert!(html.contains("Couldn't load reviews."));
        assert!(html.contains("HTTP &lt;503&gt;"));
    }

    #[test]
    fn test_skip_is_empty() {
        assert_eq!(
            apply_fallback(&FallbackStrategy::Skip, "sizes", "boom").into_html(),
            ""
        );
    }

    #[test]
    fn test_custom_html() {
        let strategy = FallbackStrategy::html("<p>Try again later</p>");
        assert_eq!(
            apply_fallback(&strategy, "picks", "boom"),
            FallbackResult::Rendered("<p>Try again later</p>".into())
        );
    }
}
