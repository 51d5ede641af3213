//! Page shell, product body and full-page error documents.

use edge_sdk::edge_executor::fill_runtime_script;
use edge_sdk::edge_streaming::{escape_html, HeadContent, Shell};

use super::gallery::render_gallery;
use super::placeholder::CLIENT_LOADER_SCRIPT;
use super::price::render_price;
use super::ratings::render_ratings;
use super::sizes::SIZE_PICKER_SCRIPT;
use super::SectionKind;
use crate::config::PageConfig;
use crate::data::Product;

const VIEWPORT: &str = "width=device-width, initial-scale=1";

const SITE_FOOTER: &str = r#"<footer class="site-footer"><p>Prices and availability are subject to change.</p></footer>
</body>
</html>"#;

/// Shell for a product page. Carries the slot fill runtime and the size
/// picker, plus the client loader when any section is client-loaded.
pub fn page_shell(product: &Product, config: &PageConfig) -> Shell {
    let mut head = HeadContent::new(format!("{}{}", product.name, config.title_suffix))
        .with_meta("viewport", VIEWPORT)
        .with_meta("description", &product.description)
        .with_style(PAGE_STYLES)
        .with_script(&fill_runtime_script())
        .with_script(SIZE_PICKER_SCRIPT);
    if !config.client_sections.is_empty() {
        head = head.with_script(CLIENT_LOADER_SCRIPT);
    }

    Shell::new(head)
        .with_body_start(format!(
            r#"<body>
<header class="site-header"><nav><a href="/">Home</a> / <span>{}</span></nav></header>
"#,
            escape_html(&product.name)
        ))
        .with_body_end(SITE_FOOTER)
}

/// The product body. `slot` supplies the slot container for each section.
pub fn render_product_body<F>(product: &Product, page_id: &str, slot: F) -> String
where
    F: Fn(SectionKind) -> String,
{
    format!(
        r#"<main class="pdp" data-product-id="{id}">
<div class="pdp-top">
{gallery}
<div class="pdp-info">
<h1 class="product-name">{name}</h1>
{rating}
{price}
<p class="product-description">{description}</p>
{sizes}
</div>
</div>
{recommended}
{reviews}
</main>
"#,
        id = escape_html(page_id),
        gallery = render_gallery(product),
        name = escape_html(&product.name),
        rating = render_ratings(product.rating),
        price = render_price(&product.price),
        description = escape_html(&product.description),
        sizes = slot(SectionKind::Sizes),
        recommended = slot(SectionKind::Recommended),
        reviews = slot(SectionKind::Reviews),
    )
}

/// A complete document for a page that could not be rendered.
pub fn render_error_page(title: &str, message: &str, retry_href: Option<&str>) -> String {
    let shell = Shell::new(
        HeadContent::new(title)
            .with_meta("viewport", VIEWPORT)
            .with_style(PAGE_STYLES),
    )
    .with_body_start(
        r#"<body>
<header class="site-header"><nav><a href="/">Home</a></nav></header>
"#,
    )
    .with_body_end(SITE_FOOTER);

    let retry = match retry_href {
        Some(href) => format!(
            r#"<p><a class="retry-link" href="{}">Try again</a></p>"#,
            escape_html(href)
        ),
        None => String::new(),
    };

    format!(
        r#"{}<main class="page-error"><h1>{}</h1><p>{}</p>{}</main>
{}"#,
        shell.render_opening(),
        escape_html(title),
        escape_html(message),
        retry,
        shell.render_closing()
    )
}

pub fn not_found_page(product_id: &str) -> String {
    render_error_page(
        "Product not found",
        &format!("We couldn't find a product with id {}.", product_id),
        None,
    )
}

/// The catalog failed. Links back to the same page.
pub fn failed_page(path: &str) -> String {
    render_error_page(
        "Something went wrong",
        "We couldn't load this product right now.",
        Some(path),
    )
}

pub fn missing_id_page() -> String {
    render_error_page("Missing product id", "Add a product id to the address.", None)
}

pub fn invalid_id_page() -> String {
    render_error_page("Invalid product id", "Product ids cannot contain control characters.", None)
}

pub fn unknown_page() -> String {
    render_error_page("Page not found", "There is nothing at this address.", None)
}

pub fn method_not_allowed_page() -> String {
    render_error_page("Method not allowed", "This page only supports GET.", None)
}

/// Stylesheet for product pages.
pub const PAGE_STYLES: &str = r#"
* { box-sizing: border-box; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; background: #f5f5f5; color: #222; }
.site-header { background: #333; color: white; padding: 1rem 2rem; }
.site-header a { color: #9cf; }
.site-footer { color: #666; padding: 2rem; text-align: center; font-size: 0.85rem; }
.pdp { max-width: 1200px; margin: 0 auto; padding: 2rem; }
.pdp-top { display: grid; grid-template-columns: 1fr 1fr; gap: 2rem; background: white; padding: 2rem; border-radius: 8px; }

/* Gallery */
.product-gallery { display: grid; grid-template-columns: repeat(3, 1fr); gap: 0.5rem; }
.gallery-main { grid-column: 1 / -1; width: 100%; border-radius: 8px; }
.gallery-thumb { width: 100%; aspect-ratio: 1; object-fit: cover; border-radius: 4px; }

/* Info */
.product-name { font-size: 2rem; margin: 0 0 0.5rem 0; }
.product-rating .star { color: #ff9800; font-size: 1.25rem; }
.product-price { margin: 1rem 0; }
.price-current { font-size: 2rem; font-weight: bold; color: #b12704; }
.price-original { color: #666; margin-left: 1rem; }
.price-discount { background: #cc0c39; color: white; padding: 0.25rem 0.5rem; border-radius: 4px; margin-left: 0.5rem; }
.product-description { line-height: 1.6; }

/* Sizes */
.size-options { display: flex; flex-wrap: wrap; gap: 0.5rem; }
.size-option { min-width: 3rem; padding: 0.5rem 0.75rem; border: 1px solid #999; border-radius: 4px; background: white; cursor: pointer; }
.size-option--selected { border-color: #222; background: #222; color: white; }
.size-option:disabled { opacity: 0.4; cursor: not-allowed; text-decoration: line-through; }

/* Picks and reviews */
.product-picks, .product-reviews { background: white; padding: 2rem; border-radius: 8px; margin-top: 1rem; }
.picks-grid { list-style: none; padding: 0; display: grid; grid-template-columns: repeat(4, 1fr); gap: 1rem; }
.pick-card { border: 1px solid #eee; border-radius: 8px; overflow: hidden; }
.pick-link { text-decoration: none; color: inherit; display: block; padding-bottom: 0.75rem; }
.pick-image { width: 100%; aspect-ratio: 1; object-fit: cover; }
.pick-name, .pick-price, .pick-delivery { margin: 0.25rem 0.75rem; }
.pick-delivery { font-size: 0.8rem; color: #2e7d32; }
.reviews-list { list-style: none; padding: 0; }
.review { border-bottom: 1px solid #eee; padding: 1rem 0; }
.review-header { display: flex; gap: 0.75rem; align-items: center; }
.review-avatar { border-radius: 50%; }
.review-date { color: #666; font-size: 0.85rem; }
.review-body { color: #555; line-height: 1.6; }

/* Placeholders and errors */
.skeleton { padding: 1rem; }
.skeleton-label { font-size: 0.75rem; text-transform: uppercase; color: #888; }
.skeleton--sizes { display: flex; flex-wrap: wrap; gap: 0.5rem; }
.skeleton--recommended { display: grid; grid-template-columns: repeat(4, 1fr); gap: 1rem; }
.skeleton-pill { width: 3rem; height: 2.25rem; border-radius: 4px; background: #e6e6e6; }
.skeleton-card { border-radius: 8px; background: #f0f0f0; padding: 0.5rem; }
.skeleton-image { aspect-ratio: 1; background: #e0e0e0; border-radius: 4px; }
.skeleton-row { display: flex; gap: 0.75rem; align-items: center; padding: 0.75rem 0; }
.skeleton-avatar { width: 40px; height: 40px; border-radius: 50%; background: #e0e0e0; }
.skeleton-line { height: 0.75rem; margin: 0.5rem 0; background: #e6e6e6; border-radius: 4px; flex: 1; }
.skeleton-line--short { width: 50%; flex: none; }
.section-error { background: #fff3f3; border: 1px solid #f5c2c2; border-radius: 8px; padding: 1rem; margin-top: 1rem; }
.section-error-detail { font-size: 0.8rem; color: #888; }
.page-error { max-width: 640px; margin: 4rem auto; background: white; padding: 2rem; border-radius: 8px; text-align: center; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Price;

    fn product() -> Product {
        Product {
            id: "42".into(),
            name: "Trail <Runner>".into(),
            description: "Light & fast".into(),
            images: vec!["https://img/1.jpg".into()],
            price: Price { value: 100.0, discount: Some(20.0) },
            rating: Some(4.2),
        }
    }

    #[test]
    fn test_shell_title_and_scripts() {
        let opening = page_shell(&product(), &PageConfig::default()).render_opening();
        assert!(opening.contains("<title>Trail &lt;Runner&gt; | Storefront</title>"));
        assert!(opening.contains("window.__edgeFill"));
        assert!(opening.contains("pdp:size"));
        assert!(!opening.contains("data-placeholder=\"client\""));
    }

    #[test]
    fn test_client_loader_only_when_configured() {
        let config = PageConfig {
            client_sections: vec![SectionKind::Reviews],
            ..PageConfig::default()
        };
        let opening = page_shell(&product(), &config).render_opening();
        assert!(opening.contains(r#"[data-placeholder="client"][data-src]"#));
    }

    #[test]
    fn test_body_places_slots_in_order() {
        let body = render_product_body(&product(), "42", |kind| format!("[{}]", kind));
        assert!(body.contains(r#"<main class="pdp" data-product-id="42">"#));
        assert!(body.contains("Light &amp; fast"));

        let sizes = body.find("[sizes]").unwrap();
        let recommended = body.find("[recommended]").unwrap();
        let reviews = body.find("[reviews]").unwrap();
        assert!(sizes < recommended && recommended < reviews);
    }

    #[test]
    fn test_failed_page_links_back() {
        let html = failed_page("/product/42?size=M");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"href="/product/42?size=M""#));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_not_found_page() {
        let html = not_found_page("<7>");
        assert!(html.contains("Product not found"));
        assert!(html.contains("&lt;7&gt;"));
    }
}
