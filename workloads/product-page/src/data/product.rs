//! Product data models.

use serde::{Deserialize, Deserializer, Serialize};

/// Catalog record for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Image URLs in display order.
    #[serde(default)]
    pub images: Vec<String>,
    pub price: Price,
    /// Average rating, 0 to 5.
    #[serde(default)]
    pub rating: Option<f32>,
}

/// List price with an optional percentage discount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub value: f64,
    /// Percentage off, 0 to 100.
    #[serde(default)]
    pub discount: Option<f64>,
}

impl Price {
    /// Price after the discount.
    pub fn discounted(&self) -> f64 {
        match self.discount {
            Some(d) => self.value - self.value * d / 100.0,
            None => self.value,
        }
    }

    /// The discount, when it actually takes something off.
    pub fn active_discount(&self) -> Option<f64> {
        self.discount.filter(|d| *d > 0.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

/// Accept ids sent as JSON strings or numbers.
pub(crate) fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_numeric_id_and_defaults() {
        let product: Product = serde_json::from_str(
            r#"{"id": 42, "name": "Trail Runner", "price": {"value": 100}}"#,
        )
        .unwrap();

        assert_eq!(product.id, "42");
        assert!(product.images.is_empty());
        assert_eq!(product.rating, None);
        assert_eq!(product.price.discount, None);
    }

    #[test]
    fn test_discounted_price() {
        let price = Price { value: 100.0, discount: Some(20.0) };
        assert_eq!(price.discounted(), 80.0);
        assert_eq!(price.active_discount(), Some(20.0));
    }

    #[test]
    fn test_zero_or_missing_discount_keeps_value() {
        let none = Price { value: 59.99, discount: None };
        let zero = Price { value: 59.99, discount: Some(0.0) };

        assert_eq!(none.discounted(), 59.99);
        assert_eq!(zero.discounted(), 59.99);
        assert_eq!(zero.active_discount(), None);
    }
}
