//! Image gallery.

use edge_sdk::edge_streaming::escape_html;

use crate::data::Product;

/// Positions in the gallery. Images past the last one are not shown.
pub const GALLERY_SLOTS: usize = 4;

/// Render the gallery. A position whose image is missing or blank renders
/// nothing; the remaining positions keep their place.
pub fn render_gallery(product: &Product) -> String {
    let images: String = (0..GALLERY_SLOTS)
        .map(|position| {
            let Some(url) = product.images.get(position).filter(|u| !u.trim().is_empty()) else {
                return String::new();
            };
            let (class, loading) = if position == 0 {
                ("gallery-main", "eager")
            } else {
                ("gallery-thumb", "lazy")
            };
            format!(
                r#"<img class="{class}" data-position="{position}" src="{src}" alt="{name} image {n}" loading="{loading}">"#,
                src = escape_html(url),
                name = escape_html(&product.name),
                n = position + 1,
            )
        })
        .collect();

    format!(r#"<div class="product-gallery">{}</div>"#, images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Price;

    fn product(images: &[&str]) -> Product {
        Product {
            id: "1".into(),
            name: "Shoe".into(),
            description: String::new(),
            images: images.iter().map(|s| s.to_string()).collect(),
            price: Price { value: 10.0, discount: None },
            rating: None,
        }
    }

    #[test]
    fn test_renders_at_most_four_images() {
        let html = render_gallery(&product(&["a", "b", "c", "d", "e"]));
        assert_eq!(html.matches("<img").count(), 4);
        assert!(!html.contains(r#"src="e""#));
    }

    #[test]
    fn test_missing_positions_render_nothing() {
        let html = render_gallery(&product(&["a", "", "c"]));
        assert_eq!(html.matches("<img").count(), 2);
        assert!(html.contains(r#"data-position="0""#));
        assert!(html.contains(r#"data-position="2""#));
        assert!(!html.contains(r#"data-position="1""#));
    }

    #[test]
    fn test_no_images() {
        assert_eq!(render_gallery(&product(&[])), r#"<div class="product-gallery"></div>"#);
    }
}
