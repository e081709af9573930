//! Catalog seeding command.
//!
//! Reads products and discount codes from a YAML file and inserts them.
//! Product names and discount codes are treated as natural keys: re-running
//! the seed skips rows that already exist unless `--clear` is given.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use crystal_atelier_core::{parse_amount, DiscountType, Tone};

#[derive(Debug, Deserialize)]
struct SeedImage {
    src: String,
    #[serde(default)]
    alt: String,
}

#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    #[serde(default)]
    subtitle: String,
    /// Decimal string, e.g. "500.00".
    price: String,
    tone: Tone,
    tag: Option<String>,
    category: Option<String>,
    #[serde(default)]
    images: Vec<SeedImage>,
}

#[derive(Debug, Deserialize)]
struct SeedDiscount {
    code: String,
    discount_type: DiscountType,
    /// Decimal string, e.g. "10" for 10% or "50.00" off.
    discount_value: String,
    #[serde(default = "default_active")]
    is_active: bool,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
    usage_limit: Option<i32>,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    products: Vec<SeedProduct>,
    #[serde(default)]
    discount_codes: Vec<SeedDiscount>,
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if environment variables are missing, the file cannot
/// be read or parsed, or a database operation fails.
pub async fn run(file_path: &str, clear: bool) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ATELIER_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| "ATELIER_DATABASE_URL not set")?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let mut prices: Vec<Decimal> = Vec::with_capacity(seed.products.len());
    for product in &seed.products {
        prices.push(
            parse_amount(&product.price)
                .map_err(|e| format!("product '{}': {e}", product.name))?,
        );
    }
    let mut values: Vec<Decimal> = Vec::with_capacity(seed.discount_codes.len());
    for code in &seed.discount_codes {
        values.push(
            code.discount_value
                .parse()
                .map_err(|e| format!("discount '{}': {e}", code.code))?,
        );
    }

    info!(
        products = seed.products.len(),
        discount_codes = seed.discount_codes.len(),
        "Parsed catalog"
    );

    let pool = PgPool::connect(&database_url).await?;
    info!("Connected to database");

    let mut tx = pool.begin().await?;

    if clear {
        sqlx::query("DELETE FROM product_images").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM cart_items").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM reviews").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM products WHERE id NOT IN (SELECT product_id FROM order_items)")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM discount_codes").execute(&mut *tx).await?;
        info!("Cleared existing catalog rows");
    }

    let mut inserted_products = 0_u32;
    for (product, price) in seed.products.iter().zip(prices) {
        let existing: Option<(i32,)> = sqlx::query_as("SELECT id FROM products WHERE name = $1")
            .bind(&product.name)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            continue;
        }

        let (product_id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO products (name, subtitle, price, tone, tag, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(&product.name)
        .bind(&product.subtitle)
        .bind(price)
        .bind(product.tone.to_string())
        .bind(&product.tag)
        .bind(&product.category)
        .fetch_one(&mut *tx)
        .await?;
        inserted_products += 1;

        for (position, image) in product.images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_images (product_id, src, alt, position) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(product_id)
            .bind(&image.src)
            .bind(&image.alt)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }
    }

    let mut inserted_codes = 0_u32;
    for (code, value) in seed.discount_codes.iter().zip(values) {
        let result = sqlx::query(
            r"
            INSERT INTO discount_codes
                (code, discount_type, discount_value, is_active, expires_at, usage_limit)
            VALUES (UPPER($1), $2, $3, $4, $5, $6)
            ON CONFLICT (code) DO NOTHING
            ",
        )
        .bind(&code.code)
        .bind(code.discount_type.to_string())
        .bind(value)
        .bind(code.is_active)
        .bind(code.expires_at)
        .bind(code.usage_limit)
        .execute(&mut *tx)
        .await?;
        inserted_codes += u32::try_from(result.rows_affected()).unwrap_or(0);
    }

    tx.commit().await?;

    info!(
        products = inserted_products,
        discount_codes = inserted_codes,
        "Seeding complete"
    );
    Ok(())
}
