//! Section skeletons shown until a slot is filled.

use edge_sdk::edge_streaming::escape_html;

use super::SectionKind;

/// Where a section's data will come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderMode {
    /// Resolved on the server and streamed into the slot later.
    Streaming,
    /// Fetched by the browser from the section fragment route.
    Client,
}

impl PlaceholderMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Streaming => "Streaming Data",
            Self::Client => "Client Loading",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::Client => "client",
        }
    }
}

/// Fragment route for one section of a product.
pub fn section_href(product_id: &str, kind: SectionKind) -> String {
    format!(
        "/product/{}/section/{}",
        urlencoding::encode(product_id),
        kind.as_str()
    )
}

/// Skeleton for `kind`. Client placeholders carry the fragment URL the
/// loader script fetches.
pub fn render_placeholder(kind: SectionKind, mode: PlaceholderMode, product_id: &str) -> String {
    let src = match mode {
        PlaceholderMode::Client => format!(
            r#" data-src="{}""#,
            escape_html(&section_href(product_id, kind))
        ),
        PlaceholderMode::Streaming => String::new(),
    };

    format!(
        r#"<div class="skeleton skeleton--{kind}" data-placeholder="{mode}"{src}><p class="skeleton-label">{label}</p>{shape}</div>"#,
        kind = kind.as_str(),
        mode = mode.as_str(),
        src = src,
        label = mode.label(),
        shape = skeleton_shape(kind),
    )
}

fn skeleton_shape(kind: SectionKind) -> String {
    match kind {
        SectionKind::Sizes => {
            r#"<div class="skeleton-pill"></div>"#.repeat(5)
        }
        SectionKind::Recommended => {
            r#"<div class="skeleton-card"><div class="skeleton-image"></div><div class="skeleton-line"></div><div class="skeleton-line skeleton-line--short"></div></div>"#
                .repeat(4)
        }
        SectionKind::Reviews => {
            r#"<div class="skeleton-row"><div class="skeleton-avatar"></div><div class="skeleton-line"></div><div class="skeleton-line"></div></div>"#
                .repeat(3)
        }
    }
}

/// Loads every client placeholder from its fragment route and announces
/// each filled section with a `pdp:section` event.
pub const CLIENT_LOADER_SCRIPT: &str = r#"document.addEventListener('DOMContentLoaded', function () {
  document.querySelectorAll('[data-placeholder="client"][data-src]').forEach(function (el) {
    var slot = el.closest('[data-slot]');
    fetch(el.dataset.src, { headers: { accept: 'text/html' } })
      .then(function (res) { return res.text(); })
      .then(function (html) {
        if (!slot) return;
        slot.innerHTML = html;
        slot.removeAttribute('aria-busy');
        document.dispatchEvent(new CustomEvent('pdp:section', { detail: slot.dataset.slot }));
      })
      .catch(function () {
        el.querySelector('.skeleton-label').textContent = 'Could not load this section.';
      });
  });
});"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_by_mode() {
        let streaming = render_placeholder(SectionKind::Reviews, PlaceholderMode::Streaming, "42");
        let client = render_placeholder(SectionKind::Reviews, PlaceholderMode::Client, "42");

        assert!(streaming.contains("Streaming Data"));
        assert!(!streaming.contains("data-src"));
        assert!(client.contains("Client Loading"));
        assert!(client.contains(r#"data-src="/product/42/section/reviews""#));
    }

    #[test]
    fn test_shapes_differ_per_section() {
        let shapes: Vec<String> = SectionKind::ALL.into_iter().map(skeleton_shape).collect();
        assert_ne!(shapes[0], shapes[1]);
        assert_ne!(shapes[1], shapes[2]);
        assert_ne!(shapes[0], shapes[2]);
    }

    #[test]
    fn test_href_encodes_id() {
        assert_eq!(
            section_href("a/b", SectionKind::Sizes),
            "/product/a%2Fb/section/sizes"
        );
    }
}
