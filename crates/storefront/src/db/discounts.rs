//! Discount code repository.
//!
//! Validation is side-effect free (see `services::discount`); the
//! `used_count` increment happens inside the checkout transaction as a
//! conditional update so two near-limit checkouts cannot both slip past.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};

use crystal_atelier_core::{DiscountCodeId, DiscountType};

use super::RepositoryError;
use crate::models::DiscountCode;

#[derive(sqlx::FromRow)]
struct DiscountRow {
    id: i32,
    code: String,
    discount_type: String,
    discount_value: Decimal,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    usage_limit: Option<i32>,
    used_count: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<DiscountRow> for DiscountCode {
    type Error = RepositoryError;

    fn try_from(r: DiscountRow) -> Result<Self, Self::Error> {
        let discount_type = r.discount_type.parse::<DiscountType>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid discount type in database: {e}"))
        })?;
        Ok(Self {
            id: DiscountCodeId::new(r.id),
            code: r.code,
            discount_type,
            discount_value: r.discount_value,
            is_active: r.is_active,
            expires_at: r.expires_at,
            usage_limit: r.usage_limit,
            used_count: r.used_count,
            created_at: r.created_at,
        })
    }
}

const DISCOUNT_COLUMNS: &str = "id, code, discount_type, discount_value, is_active, \
                                expires_at, usage_limit, used_count, created_at";

/// Fields for creating a discount code.
#[derive(Debug, Clone)]
pub struct NewDiscountCode {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
}

/// Partial update for a discount code.
#[derive(Debug, Clone, Default)]
pub struct DiscountPatch {
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
    pub is_active: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub usage_limit: Option<Option<i32>>,
}

/// Repository for discount code operations.
pub struct DiscountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DiscountRepository<'a> {
    /// Create a new discount repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up a code, case-insensitively (input is uppercased).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<DiscountCode>, RepositoryError> {
        let row = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discount_codes WHERE code = $1"
        ))
        .bind(code.trim().to_uppercase())
        .fetch_optional(self.pool)
        .await?;

        row.map(DiscountCode::try_from).transpose()
    }

    /// Look up a code by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: DiscountCodeId) -> Result<Option<DiscountCode>, RepositoryError> {
        let row = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discount_codes WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(DiscountCode::try_from).transpose()
    }

    /// List all codes, newest first. Admin use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<DiscountCode>, RepositoryError> {
        let rows = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discount_codes ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(DiscountCode::try_from).collect()
    }

    /// Create a code. The code string is stored uppercase.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists,
    /// `Database` otherwise.
    pub async fn create(&self, input: &NewDiscountCode) -> Result<DiscountCode, RepositoryError> {
        let row = sqlx::query_as::<_, DiscountRow>(&format!(
            r"
            INSERT INTO discount_codes
                (code, discount_type, discount_value, is_active, expires_at, usage_limit)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {DISCOUNT_COLUMNS}
            "
        ))
        .bind(input.code.trim().to_uppercase())
        .bind(input.discount_type.to_string())
        .bind(input.discount_value)
        .bind(input.is_active)
        .bind(input.expires_at)
        .bind(input.usage_limit)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "discount code already exists"))?;

        DiscountCode::try_from(row)
    }

    /// Apply a partial update to a code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the code doesn't exist,
    /// `Database` otherwise.
    pub async fn update(
        &self,
        id: DiscountCodeId,
        patch: &DiscountPatch,
    ) -> Result<DiscountCode, RepositoryError> {
        let mut qb = QueryBuilder::new("UPDATE discount_codes SET id = id");
        if let Some(discount_type) = patch.discount_type {
            qb.push(", discount_type = ").push_bind(discount_type.to_string());
        }
        if let Some(discount_value) = patch.discount_value {
            qb.push(", discount_value = ").push_bind(discount_value);
        }
        if let Some(is_active) = patch.is_active {
            qb.push(", is_active = ").push_bind(is_active);
        }
        if let Some(expires_at) = patch.expires_at {
            qb.push(", expires_at = ").push_bind(expires_at);
        }
        if let Some(usage_limit) = patch.usage_limit {
            qb.push(", usage_limit = ").push_bind(usage_limit);
        }
        qb.push(" WHERE id = ").push_bind(id.as_i32());
        qb.push(format!(" RETURNING {DISCOUNT_COLUMNS}"));

        let row: Option<DiscountRow> = qb.build_query_as().fetch_optional(self.pool).await?;
        row.map_or(Err(RepositoryError::NotFound), DiscountCode::try_from)
    }

    /// Delete a code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the code doesn't exist,
    /// `Database` otherwise.
    pub async fn delete(&self, id: DiscountCodeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM discount_codes WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
