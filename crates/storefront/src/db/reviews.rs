//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crystal_atelier_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::Review;

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    user_id: i32,
    product_id: i32,
    rating: i32,
    comment: Option<String>,
    reviewer_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(r: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(r.id),
            user_id: UserId::new(r.user_id),
            product_id: ProductId::new(r.product_id),
            rating: r.rating,
            comment: r.comment,
            reviewer_name: r.reviewer_name,
            created_at: r.created_at,
        }
    }
}

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List reviews for a product, newest first, with reviewer names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT r.id, r.user_id, r.product_id, r.rating, r.comment,
                   u.name AS reviewer_name, r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC
            ",
        )
        .bind(product_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Insert a review. The (user, product) unique constraint is the
    /// authority on duplicates - a pre-check alone would race.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed
    /// the product, `Database` otherwise.
    pub async fn create(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            WITH inserted AS (
                INSERT INTO reviews (user_id, product_id, rating, comment)
                VALUES ($1, $2, $3, $4)
                RETURNING id, user_id, product_id, rating, comment, created_at
            )
            SELECT i.id, i.user_id, i.product_id, i.rating, i.comment,
                   u.name AS reviewer_name, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.user_id
            ",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "product already reviewed"))?;

        Ok(Review::from(row))
    }
}
