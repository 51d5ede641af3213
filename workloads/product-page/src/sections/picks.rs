//! Recommended picks.

use edge_sdk::edge_streaming::escape_html;

use super::parse_date;
use super::price::{displayed_price, format_money};
use crate::data::RecommendedPick;

/// `Get it by Nov 6`. A date that does not parse is shown as sent.
pub fn delivery_label(raw: &str) -> String {
    match parse_date(raw) {
        Some(date) => format!("Get it by {}", date.format("%b %-d")),
        None => format!("Get it by {}", raw),
    }
}

/// One card per pick, in the order the catalog returned them.
pub fn render_picks(picks: &[RecommendedPick]) -> String {
    let body = if picks.is_empty() {
        r#"<p class="picks-empty">No recommendations for this product yet.</p>"#.to_string()
    } else {
        let cards: String = picks.iter().map(render_pick).collect();
        format!(r#"<ul class="picks-grid">{}</ul>"#, cards)
    };

    format!(
        r#"<section class="product-picks" data-section="recommended"><h2>Recommended for you</h2>{}</section>"#,
        body
    )
}

fn render_pick(pick: &RecommendedPick) -> String {
    let image = match pick.images.first().filter(|u| !u.trim().is_empty()) {
        Some(url) => format!(
            r#"<img class="pick-image" src="{}" alt="" loading="lazy">"#,
            escape_html(url)
        ),
        None => String::new(),
    };

    format!(
        r#"<li class="pick-card" data-pick-id="{id}"><a class="pick-link" href="/product/{href}">{image}<h3 class="pick-name">{name}</h3><p class="pick-price">{price}</p><p class="pick-delivery">{delivery}</p></a></li>"#,
        id = escape_html(&pick.id),
        href = urlencoding::encode(&pick.id),
        image = image,
        name = escape_html(&pick.name),
        price = format_money(displayed_price(&pick.price)),
        delivery = escape_html(&delivery_label(&pick.delivery_date)),
    )
}
