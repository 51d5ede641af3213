//! Recommended pick data models.

use serde::{Deserialize, Serialize};

use super::product::{id_string, Price};

/// A product recommended alongside the one being viewed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedPick {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub price: Price,
    /// ISO date, e.g. `2024-11-06`.
    #[serde(alias = "deliveryDate")]
    pub delivery_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_camel_case_delivery_date() {
        let pick: RecommendedPick = serde_json::from_str(
            r#"{"id": "7", "name": "Sock", "price": {"value": 5}, "deliveryDate": "2024-11-06"}"#,
        )
        .unwrap();
        assert_eq!(pick.delivery_date, "2024-11-06");
    }
}
