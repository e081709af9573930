//! Product catalog repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, QueryBuilder};

use crystal_atelier_core::{ProductId, Tone};

use super::RepositoryError;
use crate::models::{Product, ProductImage};

/// Columns the catalog listing may sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    Price,
    Tone,
    Tag,
}

impl ProductSort {
    /// The whitelisted column name. Sorting is never interpolated from
    /// raw client input.
    const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Name => "name",
            Self::Price => "price",
            Self::Tone => "tone",
            Self::Tag => "tag",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Catalog listing filter.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring match on name and subtitle.
    pub q: Option<String>,
    pub tag: Option<String>,
    pub tone: Option<Tone>,
    pub sort_by: ProductSort,
    pub order: SortOrder,
    pub skip: i64,
    pub take: i64,
}

/// Fields for creating or replacing a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub subtitle: String,
    pub price: Decimal,
    pub tone: Tone,
    pub tag: Option<String>,
    pub category: Option<String>,
    pub images: Vec<ProductImage>,
}

/// Partial update for a product. `None` fields are left untouched;
/// `images: Some(..)` replaces the whole gallery.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub subtitle: Option<String>,
    pub price: Option<Decimal>,
    pub tone: Option<Tone>,
    pub tag: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub images: Option<Vec<ProductImage>>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    subtitle: String,
    price: Decimal,
    tone: String,
    tag: Option<String>,
    category: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, images: Vec<ProductImage>) -> Result<Product, RepositoryError> {
        let tone = self.tone.parse::<Tone>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid tone in database: {e}"))
        })?;
        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name,
            subtitle: self.subtitle,
            price: self.price,
            tone,
            tag: self.tag,
            category: self.category,
            images,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ImageRow {
    product_id: i32,
    src: String,
    alt: String,
}

/// Escape LIKE metacharacters so a search term matches literally.
/// `\` is Postgres's default ESCAPE character.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Repository for product catalog operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching a filter, images included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails, or
    /// `DataCorruption` if a stored tone is invalid.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut qb = QueryBuilder::new(
            "SELECT id, name, subtitle, price, tone, tag, category, created_at, updated_at \
             FROM products WHERE TRUE",
        );
        if let Some(q) = &filter.q {
            let pattern = format!("%{}%", escape_like(q));
            qb.push(" AND (name ILIKE ").push_bind(pattern.clone());
            qb.push(" OR subtitle ILIKE ").push_bind(pattern);
            qb.push(")");
        }
        if let Some(tag) = &filter.tag {
            qb.push(" AND tag = ").push_bind(tag.clone());
        }
        if let Some(tone) = filter.tone {
            qb.push(" AND tone = ").push_bind(tone.to_string());
        }
        qb.push(format!(
            " ORDER BY {} {}",
            filter.sort_by.column(),
            filter.order.keyword()
        ));
        qb.push(" OFFSET ").push_bind(filter.skip);
        qb.push(" LIMIT ").push_bind(filter.take);

        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(self.pool).await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut images = self.images_for(&ids).await?;

        rows.into_iter()
            .map(|r| {
                let imgs = images.remove(&r.id).unwrap_or_default();
                r.into_product(imgs)
            })
            .collect()
    }

    /// Get one product with its images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, subtitle, price, tone, tag, category, created_at, updated_at \
             FROM products WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let mut images = self.images_for(&[row.id]).await?;
        let imgs = images.remove(&row.id).unwrap_or_default();
        row.into_product(imgs).map(Some)
    }

    /// Create a product with its image gallery.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (name, subtitle, price, tone, tag, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, subtitle, price, tone, tag, category, created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(&input.subtitle)
        .bind(input.price)
        .bind(input.tone.to_string())
        .bind(&input.tag)
        .bind(&input.category)
        .fetch_one(&mut *tx)
        .await?;

        for (position, image) in input.images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_images (product_id, src, alt, position) VALUES ($1, $2, $3, $4)",
            )
            .bind(row.id)
            .bind(&image.src)
            .bind(&image.alt)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        row.into_product(input.images.clone())
    }

    /// Apply a partial update; `images` replaces the whole gallery.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist,
    /// or `Database` if a query fails.
    pub async fn update(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut qb = QueryBuilder::new("UPDATE products SET updated_at = now()");
        if let Some(name) = &patch.name {
            qb.push(", name = ").push_bind(name.clone());
        }
        if let Some(subtitle) = &patch.subtitle {
            qb.push(", subtitle = ").push_bind(subtitle.clone());
        }
        if let Some(price) = patch.price {
            qb.push(", price = ").push_bind(price);
        }
        if let Some(tone) = patch.tone {
            qb.push(", tone = ").push_bind(tone.to_string());
        }
        if let Some(tag) = &patch.tag {
            qb.push(", tag = ").push_bind(tag.clone());
        }
        if let Some(category) = &patch.category {
            qb.push(", category = ").push_bind(category.clone());
        }
        qb.push(" WHERE id = ").push_bind(id.as_i32());
        qb.push(" RETURNING id, name, subtitle, price, tone, tag, category, created_at, updated_at");

        let row: Option<ProductRow> = qb.build_query_as().fetch_optional(&mut *tx).await?;
        let row = row.ok_or(RepositoryError::NotFound)?;

        if let Some(images) = &patch.images {
            sqlx::query("DELETE FROM product_images WHERE product_id = $1")
                .bind(row.id)
                .execute(&mut *tx)
                .await?;
            for (position, image) in images.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO product_images (product_id, src, alt, position) VALUES ($1, $2, $3, $4)",
                )
                .bind(row.id)
                .bind(&image.src)
                .bind(&image.alt)
                .bind(i32::try_from(position).unwrap_or(i32::MAX))
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        let product_id = ProductId::new(row.id);
        match &patch.images {
            Some(images) => row.into_product(images.clone()),
            None => {
                let mut images = self.images_for(&[product_id.as_i32()]).await?;
                row.into_product(images.remove(&product_id.as_i32()).unwrap_or_default())
            }
        }
    }

    /// Delete a product and its images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist,
    /// `Conflict` if existing orders reference it, or `Database` otherwise.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "product is referenced by existing orders".to_owned(),
                    );
                }
                RepositoryError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Whether a product exists. Used by cart adds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM products WHERE id = $1")
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Fetch image galleries for a set of products, keyed by product id,
    /// preserving gallery order.
    pub(crate) async fn images_for(
        &self,
        ids: &[i32],
    ) -> Result<HashMap<i32, Vec<ProductImage>>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, ImageRow>(
            "SELECT product_id, src, alt FROM product_images \
             WHERE product_id = ANY($1) ORDER BY product_id, position",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut map: HashMap<i32, Vec<ProductImage>> = HashMap::new();
        for r in rows {
            map.entry(r.product_id).or_default().push(ProductImage {
                src: r.src,
                alt: r.alt,
            });
        }
        Ok(map)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_neutralizes_metacharacters() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("rose_quartz"), "rose\\_quartz");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain geode"), "plain geode");
    }
}
