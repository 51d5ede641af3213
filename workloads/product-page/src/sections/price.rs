//! Price display.

use crate::data::Price;

/// The price a customer pays.
pub fn displayed_price(price: &Price) -> f64 {
    price.discounted()
}

/// `$` followed by the shortest representation of `value`.
pub fn format_money(value: f64) -> String {
    format!("${}", value)
}

/// Render the price block. The original price and the discount badge only
/// appear for a discount above zero.
pub fn render_price(price: &Price) -> String {
    let current = format!(
        r#"<span class="price-current">{}</span>"#,
        format_money(displayed_price(price))
    );

    let sale = match price.active_discount() {
        Some(discount) => format!(
            r#"<s class="price-original">{}</s><span class="price-discount">-{}%</span>"#,
            format_money(price.value),
            discount
        ),
        None => String::new(),
    };

    format!(r#"<div class="product-price">{}{}</div>"#, current, sale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discounted_price_strikes_original() {
        let html = render_price(&Price { value: 100.0, discount: Some(20.0) });
        assert!(html.contains(r#"<span class="price-current">$80</span>"#));
        assert!(html.contains(r#"<s class="price-original">$100</s>"#));
        assert!(html.contains("-20%"));
    }

    #[test]
    fn test_no_discount_shows_value_only() {
        for discount in [None, Some(0.0)] {
            let price = Price { value: 59.99, discount };
            assert_eq!(displayed_price(&price), 59.99);

            let html = render_price(&price);
            assert!(html.contains("$59.99"));
            assert!(!html.contains("price-original"));
            assert!(!html.contains("price-discount"));
        }
    }

    #[test]
    fn test_values_are_not_rounded() {
        let price = Price { value: 19.99, discount: Some(15.0) };
        assert_eq!(displayed_price(&price), 19.99 - 19.99 * 15.0 / 100.0);
        assert_eq!(format_money(12.5), "$12.5");
    }

    #[test]
    fn test_full_discount() {
        let price = Price { value: 40.0, discount: Some(100.0) };
        assert_eq!(displayed_price(&price), 0.0);
        assert!(render_price(&price).contains(r#"<span class="price-current">$0</span>"#));
    }
}
