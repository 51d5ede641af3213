//! Star rating indicator.

/// Stars shown for every rating.
pub const RATING_SLOTS: usize = 5;

/// Number of filled stars: the rating clamped to 0..=5, rounded down.
pub fn filled_stars(rating: Option<f32>) -> usize {
    match rating {
        Some(r) if !r.is_nan() => r.clamp(0.0, RATING_SLOTS as f32).floor() as usize,
        _ => 0,
    }
}

pub fn render_ratings(rating: Option<f32>) -> String {
    let filled = filled_stars(rating);
    let label = match rating {
        Some(r) if !r.is_nan() => format!("Rated {} out of 5", r.clamp(0.0, 5.0)),
        _ => "Not yet rated".to_string(),
    };

    let stars: String = (0..RATING_SLOTS)
        .map(|i| {
            if i < filled {
                r#"<span class="star star--filled">★</span>"#
            } else {
                r#"<span class="star star--empty">☆</span>"#
            }
        })
        .collect();

    format!(
        r#"<div class="product-rating" role="img" aria-label="{}">{}</div>"#,
        label, stars
    )
}
