//! Order repository and the checkout transaction.
//!
//! Checkout converts a non-empty cart into an immutable order under one
//! database transaction: order + item rows are created with frozen prices,
//! the cart is cleared, and an applied discount's `used_count` is bumped by
//! a conditional update. Any failure rolls the whole thing back - there is
//! no partial order and no partially cleared cart.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crystal_atelier_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use super::discounts::DiscountRepository;
use super::products::ProductRepository;
use super::RepositoryError;
use crate::models::{Order, OrderItem, OrderView};
use crate::services::discount::{self, DiscountError};

/// Checkout failures, distinguished so handlers can map them precisely.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// The supplied discount code failed re-validation.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    total: Decimal,
    status: String,
    shipping_address: String,
    discount_code: Option<String>,
    discount_amount: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        let status = r.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;
        Ok(Self {
            id: OrderId::new(r.id),
            user_id: UserId::new(r.user_id),
            total: r.total,
            status,
            shipping_address: r.shipping_address,
            discount_code: r.discount_code,
            discount_amount: r.discount_amount,
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    price: Decimal,
    product_name: String,
}

#[derive(sqlx::FromRow)]
struct CartSnapshotRow {
    product_id: i32,
    quantity: i32,
    price: Decimal,
}

const ORDER_COLUMNS: &str =
    "id, user_id, total, status, shipping_address, discount_code, discount_amount, created_at";

/// Repository for orders and the checkout boundary.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Convert the user's cart into an order, atomically.
    ///
    /// Reads the cart lines with current product prices, re-validates the
    /// discount code against the computed subtotal, creates the order and
    /// its items with those prices frozen, clears the cart, and bumps the
    /// discount's `used_count` with an increment-if-below-limit update.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`] if the cart has no lines
    /// - [`CheckoutError::Discount`] if the code is unknown, inactive,
    ///   expired, or over its usage limit (including losing the race at
    ///   increment time)
    /// - [`CheckoutError::Repository`] for database failures
    pub async fn checkout(
        &self,
        user_id: UserId,
        shipping_address: &str,
        discount_code: Option<&str>,
    ) -> Result<OrderView, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, CartSnapshotRow>(
            r"
            SELECT ci.product_id, ci.quantity, p.price
            FROM cart_items ci
            JOIN carts c ON c.id = ci.cart_id
            JOIN products p ON p.id = ci.product_id
            WHERE c.user_id = $1
            ORDER BY ci.id
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let subtotal: Decimal = lines
            .iter()
            .map(|l| l.price * Decimal::from(l.quantity))
            .sum();

        let mut applied_code: Option<String> = None;
        let mut discount_amount: Option<Decimal> = None;

        if let Some(code) = discount_code {
            let found = DiscountRepository::new(self.pool)
                .get_by_code(code)
                .await?
                .ok_or(DiscountError::NotFound)?;
            let evaluation = discount::evaluate(&found, subtotal, Utc::now())?;

            consume_discount(&mut tx, found.id.as_i32()).await?;

            applied_code = Some(found.code);
            discount_amount = Some(evaluation.amount);
        }

        let total = (subtotal - discount_amount.unwrap_or(Decimal::ZERO)).max(Decimal::ZERO);

        let order_row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders (user_id, total, status, shipping_address, discount_code, discount_amount)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user_id.as_i32())
        .bind(total)
        .bind(OrderStatus::Pending.to_string())
        .bind(shipping_address)
        .bind(&applied_code)
        .bind(discount_amount)
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order_row.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.price)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r"
            DELETE FROM cart_items ci
            USING carts c
            WHERE ci.cart_id = c.id AND c.user_id = $1
            ",
        )
        .bind(user_id.as_i32())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let order_id = OrderId::new(order_row.id);
        tracing::info!(
            order_id = %order_id,
            user_id = %user_id,
            total = %total,
            discount = applied_code.as_deref().unwrap_or("-"),
            "order created"
        );

        let view = self
            .get_view(order_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(view)
    }

    /// Read one order with its items and product display data.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_view(&self, id: OrderId) -> Result<Option<OrderView>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let order = Order::try_from(row)?;
        let mut items = self.items_for(&[order.id.as_i32()]).await?;
        Ok(Some(OrderView {
            items: items.remove(&order.id.as_i32()).unwrap_or_default(),
            order,
        }))
    }

    /// List a user's orders, newest first, with the total row count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<OrderView>, i64), RepositoryError> {
        let offset = (page - 1).max(0) * limit;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC OFFSET $2 LIMIT $3"
        ))
        .bind(user_id.as_i32())
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id.as_i32())
            .fetch_one(self.pool)
            .await?;

        Ok((self.attach_items(rows).await?, total))
    }

    /// List all orders with the owning user's email, newest first. Admin use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<(OrderView, String)>, i64), RepositoryError> {
        let offset = (page - 1).max(0) * limit;

        #[derive(sqlx::FromRow)]
        struct AdminOrderRow {
            #[sqlx(flatten)]
            order: OrderRow,
            user_email: String,
        }

        let rows = sqlx::query_as::<_, AdminOrderRow>(&format!(
            "SELECT o.{}, u.email AS user_email FROM orders o \
             JOIN users u ON u.id = o.user_id \
             ORDER BY o.created_at DESC OFFSET $1 LIMIT $2",
            ORDER_COLUMNS.replace(", ", ", o."),
        ))
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?;

        let emails: Vec<String> = rows.iter().map(|r| r.user_email.clone()).collect();
        let views = self
            .attach_items(rows.into_iter().map(|r| r.order).collect())
            .await?;

        Ok((views.into_iter().zip(emails).collect(), total))
    }

    /// Set an order's status. Any of the five statuses may be set; leaving
    /// DELIVERED or CANCELLED is flagged in the logs as an anomaly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist,
    /// `Database` otherwise.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<OrderView, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<(String,)> =
            sqlx::query_as("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id.as_i32())
                .fetch_optional(&mut *tx)
                .await?;
        let (previous,) = previous.ok_or(RepositoryError::NotFound)?;

        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_i32())
            .bind(status.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if let Ok(prev) = previous.parse::<OrderStatus>()
            && prev.is_settled()
            && prev != status
        {
            tracing::warn!(order_id = %id, from = %prev, to = %status, "order left a settled status");
        }

        self.get_view(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Whether the user has a DELIVERED order containing the product.
    /// This is the purchase gate for reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_delivered_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            r"
            SELECT 1
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.user_id = $1 AND oi.product_id = $2 AND o.status = $3
            LIMIT 1
            ",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .bind(OrderStatus::Delivered.to_string())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<OrderView>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut items = self.items_for(&ids).await?;

        rows.into_iter()
            .map(|r| {
                let order = Order::try_from(r)?;
                Ok(OrderView {
                    items: items.remove(&order.id.as_i32()).unwrap_or_default(),
                    order,
                })
            })
            .collect()
    }

    /// Fetch items for a set of orders, keyed by order id, with product
    /// name and first gallery image attached for display.
    async fn items_for(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price,
                   p.name AS product_name
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.id
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let product_ids: Vec<i32> = rows.iter().map(|r| r.product_id).collect();
        let images = ProductRepository::new(self.pool)
            .images_for(&product_ids)
            .await?;

        let mut map: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for r in rows {
            let product_image = images
                .get(&r.product_id)
                .and_then(|imgs| imgs.first())
                .cloned();
            map.entry(r.order_id).or_default().push(OrderItem {
                id: OrderItemId::new(r.id),
                product_id: ProductId::new(r.product_id),
                quantity: r.quantity,
                price: r.price,
                product_name: r.product_name,
                product_image,
            });
        }
        Ok(map)
    }
}

/// Increment a discount's `used_count` if still below its limit. Zero rows
/// affected means the limit was hit between validation and now; the caller
/// aborts the surrounding transaction.
async fn consume_discount(
    tx: &mut Transaction<'_, Postgres>,
    discount_id: i32,
) -> Result<(), CheckoutError> {
    let result = sqlx::query(
        r"
        UPDATE discount_codes
        SET used_count = used_count + 1
        WHERE id = $1
          AND (usage_limit IS NULL OR used_count < usage_limit)
        ",
    )
    .bind(discount_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CheckoutError::Discount(DiscountError::LimitExceeded));
    }
    Ok(())
}
