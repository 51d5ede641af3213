//! Review data models.

use serde::{Deserialize, Serialize};

/// A customer review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(alias = "name")]
    pub author: String,
    #[serde(alias = "createdAt", alias = "date")]
    pub created_at: String,
    #[serde(default)]
    pub title: String,
    #[serde(alias = "content", alias = "text")]
    pub body: String,
}
