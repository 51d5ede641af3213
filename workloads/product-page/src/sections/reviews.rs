//! Customer reviews.

use edge_sdk::edge_streaming::escape_html;

use super::parse_date;
use crate::config::AvatarConfig;
use crate::data::Comment;

/// Avatar image for a reviewer, generated from their name.
pub fn avatar_url(config: &AvatarConfig, name: &str) -> String {
    format!(
        "{}/{}/{}?colors={}",
        config.base_url.trim_end_matches('/'),
        config.size,
        urlencoding::encode(name),
        config.colors_param()
    )
}

/// `Mar 2, 2024`, or the raw value when it does not parse.
pub fn review_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

/// One row per review, in the order the catalog returned them.
pub fn render_reviews(comments: &[Comment], avatar: &AvatarConfig) -> String {
    let body = if comments.is_empty() {
        r#"<p class="reviews-empty">No reviews yet.</p>"#.to_string()
    } else {
        let rows: String = comments.iter().map(|c| render_review(c, avatar)).collect();
        format!(r#"<ol class="reviews-list">{}</ol>"#, rows)
    };

    format!(
        r#"<section class="product-reviews" data-section="reviews"><h2>Reviews</h2>{}</section>"#,
        body
    )
}

fn render_review(comment: &Comment, avatar: &AvatarConfig) -> String {
    format!(
        r#"<li class="review"><header class="review-header"><img class="review-avatar" src="{avatar}" alt="" width="{size}" height="{size}"><span class="review-author">{author}</span><time class="review-date" datetime="{datetime}">{date}</time></header><h3 class="review-title">{title}</h3><p class="review-body">{body}</p></li>"#,
        avatar = escape_html(&avatar_url(avatar, &comment.author)),
        size = avatar.size,
        author = escape_html(&comment.author),
        datetime = escape_html(&comment.created_at),
        date = escape_html(&review_date(&comment.created_at)),
        title = escape_html(&comment.title),
        body = escape_html(&comment.body),
    )
}
