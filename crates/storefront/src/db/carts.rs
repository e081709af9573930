//! Cart repository.
//!
//! A cart is created lazily on first add and holds at most one line per
//! product; repeat adds increment the quantity. Subtotals are computed
//! from live product prices at read time - checkout is what freezes them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crystal_atelier_core::{ProductId, Tone, UserId};

use super::products::ProductRepository;
use super::RepositoryError;
use crate::models::{CartView, Product, ProductImage};

#[derive(sqlx::FromRow)]
struct CartLineRow {
    quantity: i32,
    product_id: i32,
    name: String,
    subtitle: String,
    price: Decimal,
    tone: String,
    tag: Option<String>,
    category: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartLineRow {
    fn into_line(self, images: Vec<ProductImage>) -> Result<(Product, i32), RepositoryError> {
        let tone = self.tone.parse::<Tone>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid tone in database: {e}"))
        })?;
        Ok((
            Product {
                id: ProductId::new(self.product_id),
                name: self.name,
                subtitle: self.subtitle,
                price: self.price,
                tone,
                tag: self.tag,
                category: self.category,
                images,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            self.quantity,
        ))
    }
}

/// Repository for cart operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's cart with live product data. A user without a cart
    /// row gets the empty view.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_view(&self, user_id: UserId) -> Result<CartView, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.quantity,
                   p.id AS product_id, p.name, p.subtitle, p.price, p.tone,
                   p.tag, p.category, p.created_at, p.updated_at
            FROM cart_items ci
            JOIN carts c ON c.id = ci.cart_id
            JOIN products p ON p.id = ci.product_id
            WHERE c.user_id = $1
            ORDER BY ci.id
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(CartView::empty());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.product_id).collect();
        let mut images = ProductRepository::new(self.pool).images_for(&ids).await?;

        let lines = rows
            .into_iter()
            .map(|r| {
                let imgs = images.remove(&r.product_id).unwrap_or_default();
                r.into_line(imgs)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CartView::from_lines(lines))
    }

    /// Add a product to the cart, creating the cart lazily. An existing
    /// line is incremented by `quantity`, never overwritten.
    ///
    /// The caller is responsible for checking that the product exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (cart_id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO carts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id
            ",
        )
        .bind(user_id.as_i32())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO cart_items (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id)
                DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            ",
        )
        .bind(cart_id)
        .bind(product_id.as_i32())
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no cart or the
    /// cart has no line for the product, `Database` otherwise.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE cart_items ci
            SET quantity = $3
            FROM carts c
            WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.product_id = $2
            ",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .bind(quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no matching line exists,
    /// `Database` otherwise.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_items ci
            USING carts c
            WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.product_id = $2
            ",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
