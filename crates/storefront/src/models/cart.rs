//! Cart models.

use rust_decimal::Decimal;
use serde::Serialize;

use crystal_atelier_core::{format_amount, ProductId};

use super::Product;

/// One (product, quantity) line in a user's cart.
///
/// The product snapshot carries the live price; `line_total` is
/// `price * quantity` at read time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub product: Product,
    pub line_total: String,
}

/// A user's cart as served by `GET /api/cart`.
///
/// A user with no cart row yet gets the empty view, not an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub subtotal: String,
}

impl CartView {
    /// The empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: format_amount(Decimal::ZERO),
        }
    }

    /// Build a view from lines, computing line totals and the subtotal
    /// from live product prices.
    #[must_use]
    pub fn from_lines(lines: Vec<(Product, i32)>) -> Self {
        let mut subtotal = Decimal::ZERO;
        let items = lines
            .into_iter()
            .map(|(product, quantity)| {
                let line_total = product.price * Decimal::from(quantity);
                subtotal += line_total;
                CartLine {
                    product_id: product.id,
                    quantity,
                    line_total: format_amount(line_total),
                    product,
                }
            })
            .collect();
        Self {
            items,
            subtotal: format_amount(subtotal),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crystal_atelier_core::Tone;

    fn product(id: i32, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Geode {id}"),
            subtitle: "hand-polished".to_owned(),
            price: price.parse().unwrap(),
            tone: Tone::Amethyst,
            tag: None,
            category: None,
            images: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_cart_has_zero_subtotal() {
        let view = CartView::empty();
        assert!(view.items.is_empty());
        assert_eq!(view.subtotal, "0.00");
    }

    #[test]
    fn test_subtotal_sums_live_prices() {
        let view = CartView::from_lines(vec![(product(7, "500"), 2), (product(9, "250"), 1)]);
        assert_eq!(view.subtotal, "1250.00");
        assert_eq!(view.items[0].line_total, "1000.00");
        assert_eq!(view.items[1].line_total, "250.00");
    }
}
