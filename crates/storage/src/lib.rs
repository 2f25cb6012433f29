//! Session-scoped local persistence for the add-product screen.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::domain::{Category, CategoryId, Product, ProductId};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use tokio::sync::RwLock;
use tracing::debug;

/// Lightweight on-device data the screen reads at startup and writes after a
/// successful create.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn load_categories(&self) -> Result<Vec<Category>>;
    async fn save_categories(&self, categories: &[Category]) -> Result<()>;
    async fn save_product(&self, product: &Product) -> Result<()>;
    async fn last_saved_product(&self) -> Result<Option<Product>>;
}

#[derive(Default)]
struct MemoryState {
    categories: Vec<Category>,
    products: Vec<Product>,
}

/// Process-lifetime store. Clones share the same state.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<MemoryState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(categories: Vec<Category>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryState {
                categories,
                products: Vec::new(),
            })),
        }
    }

    pub async fn saved_products(&self) -> Vec<Product> {
        self.inner.read().await.products.clone()
    }
}

#[async_trait]
impl LocalStore for MemorySessionStore {
    async fn load_categories(&self) -> Result<Vec<Category>> {
        Ok(self.inner.read().await.categories.clone())
    }

    async fn save_categories(&self, categories: &[Category]) -> Result<()> {
        self.inner.write().await.categories = categories.to_vec();
        Ok(())
    }

    async fn save_product(&self, product: &Product) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.products.retain(|p| p.id != product.id);
        inner.products.push(product.clone());
        Ok(())
    }

    async fn last_saved_product(&self) -> Result<Option<Product>> {
        Ok(self.inner.read().await.products.last().cloned())
    }
}

#[derive(Debug, Clone)]
pub struct StoredProduct {
    pub product: Product,
    pub saved_at: DateTime<Utc>,
}

/// SQLite-backed store so categories and the last product survive restarts.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: Pool<Sqlite>,
}

impl SqliteSessionStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);
        // A single connection keeps `sqlite::memory:` pointing at one database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open session store '{database_url}'"))?;
        let store = Self { pool };
        store.ensure_schema().await?;
        debug!(database_url, "session store ready");
        Ok(store)
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS categories (
                id        TEXT PRIMARY KEY NOT NULL,
                name      TEXT NOT NULL,
                position  INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure categories table exists")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id          TEXT PRIMARY KEY NOT NULL,
                name        TEXT NOT NULL,
                image_logo  TEXT,
                category_id TEXT NOT NULL,
                brand       TEXT NOT NULL DEFAULT '',
                supplier    TEXT NOT NULL DEFAULT '',
                saved_at    TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure products table exists")?;

        Ok(())
    }

    pub async fn list_saved_products(&self) -> Result<Vec<StoredProduct>> {
        let rows = sqlx::query(
            "SELECT id, name, image_logo, category_id, brand, supplier, saved_at
             FROM products
             ORDER BY saved_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(stored_product_from_row).collect()
    }
}

fn stored_product_from_row(row: sqlx::sqlite::SqliteRow) -> Result<StoredProduct> {
    Ok(StoredProduct {
        product: Product {
            id: ProductId(row.try_get("id")?),
            name: row.try_get("name")?,
            image_logo: row.try_get("image_logo")?,
            category_id: CategoryId(row.try_get("category_id")?),
            brand: row.try_get("brand")?,
            supplier: row.try_get("supplier")?,
        },
        saved_at: row.try_get("saved_at")?,
    })
}

#[async_trait]
impl LocalStore for SqliteSessionStore {
    async fn load_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY position ASC")
            .fetch_all(&self.pool)
            .await
            .context("failed to load categories")?;
        Ok(rows
            .into_iter()
            .map(|r| Category {
                id: CategoryId(r.get::<String, _>(0)),
                name: r.get::<String, _>(1),
            })
            .collect())
    }

    async fn save_categories(&self, categories: &[Category]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM categories")
            .execute(&mut *tx)
            .await?;
        for (position, category) in categories.iter().enumerate() {
            sqlx::query("INSERT INTO categories (id, name, position) VALUES (?, ?, ?)")
                .bind(category.id.as_str())
                .bind(&category.name)
                .bind(position as i64)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to store category '{}'", category.id))?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn save_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (id, name, image_logo, category_id, brand, supplier, saved_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name=excluded.name,
                image_logo=excluded.image_logo,
                category_id=excluded.category_id,
                brand=excluded.brand,
                supplier=excluded.supplier,
                saved_at=excluded.saved_at",
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(product.image_logo.as_deref())
        .bind(product.category_id.as_str())
        .bind(&product.brand)
        .bind(&product.supplier)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to store product '{}'", product.id))?;
        Ok(())
    }

    async fn last_saved_product(&self) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, image_logo, category_id, brand, supplier, saved_at
             FROM products
             ORDER BY saved_at DESC, rowid DESC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(stored_product_from_row)
            .transpose()
            .map(|stored| stored.map(|s| s.product))
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
