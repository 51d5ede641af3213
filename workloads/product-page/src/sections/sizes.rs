//! Size picker.

use edge_sdk::edge_streaming::escape_html;

use crate::data::SizeAvailability;

/// The size a shopper picked, scoped to one product.
///
/// Purely local state: selecting never triggers a fetch. Moving to another
/// product clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeSelection {
    product_id: String,
    selected: Option<String>,
}

impl SizeSelection {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            selected: None,
        }
    }

    /// Seed the selection, e.g. from `?size=`.
    pub fn with_size(mut self, size: Option<String>) -> Self {
        self.selected = size.filter(|s| !s.is_empty());
        self
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// Follow the active product. A different id resets the selection.
    pub fn sync(&mut self, product_id: &str) {
        if self.product_id != product_id {
            self.product_id = product_id.to_string();
            self.selected = None;
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selection, if that size can actually be bought.
    pub fn effective(&self, sizes: &SizeAvailability) -> Option<&str> {
        self.selected().filter(|s| sizes.is_available(s))
    }
}

/// One button per size in `total`. Sizes not in `available` are disabled;
/// the selected size is pressed only while it is available.
pub fn render_sizes(sizes: &SizeAvailability, selection: &SizeSelection) -> String {
    let selected = selection.effective(sizes);

    let options = if sizes.total.is_empty() {
        r#"<p class="sizes-empty">No sizes listed for this product.</p>"#.to_string()
    } else {
        let buttons: String = sizes
            .total
            .iter()
            .map(|size| {
                let available = sizes.is_available(size);
                let pressed = selected == Some(size.as_str());
                let mut class = String::from("size-option");
                if pressed {
                    class.push_str(" size-option--selected");
                }
                if !available {
                    class.push_str(" size-option--unavailable");
                }
                format!(
                    r#"<button type="button" class="{class}" data-size="{size}" aria-pressed="{pressed}"{disabled}>{size}</button>"#,
                    size = escape_html(size),
                    disabled = if available { "" } else { " disabled" },
                )
            })
            .collect();
        format!(
            r#"<div class="size-options" role="group" aria-label="Sizes">{}</div>"#,
            buttons
        )
    };

    format!(
        r#"<section class="product-sizes" data-section="sizes" data-product-id="{}"><h2>Select a size</h2>{}</section>"#,
        escape_html(selection.product_id()),
        options
    )
}

/// Toggles the pressed size in the browser and remembers it per product.
/// With nothing stored for the current product, the server-rendered
/// selection is adopted; a stored selection for a different product is
/// dropped.
pub const SIZE_PICKER_SCRIPT: &str = r#"(function () {
  var KEY = 'pdp:size';
  function currentId() {
    var main = document.querySelector('main[data-product-id]');
    return main ? main.dataset.productId : null;
  }
  function load() {
    try { return JSON.parse(sessionStorage.getItem(KEY)) || {}; } catch (e) { return {}; }
  }
  function seed() {
    var pressed = document.querySelector('.size-option[aria-pressed="true"]');
    return { id: currentId(), size: pressed ? pressed.dataset.size : null };
  }
  function apply() {
    var stored = load();
    if (stored.id !== currentId()) {
      stored = seed();
      if (stored.size) { sessionStorage.setItem(KEY, JSON.stringify(stored)); }
      else { sessionStorage.removeItem(KEY); }
    }
    document.querySelectorAll('.size-option').forEach(function (btn) {
      var on = !btn.disabled && btn.dataset.size === stored.size;
      btn.setAttribute('aria-pressed', on ? 'true' : 'false');
      btn.classList.toggle('size-option--selected', on);
    });
  }
  document.addEventListener('click', function (ev) {
    var btn = ev.target.closest && ev.target.closest('.size-option');
    if (!btn || btn.disabled) return;
    var stored = load();
    var size = stored.id === currentId() && stored.size === btn.dataset.size ? null : btn.dataset.size;
    sessionStorage.setItem(KEY, JSON.stringify({ id: currentId(), size: size }));
    apply();
  });
  document.addEventListener('DOMContentLoaded', apply);
  document.addEventListener('pdp:section', apply);
})();"#;
