use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use storefront_core::InventoryItem;

use crate::catalog::InventoryFilter;
use crate::traits::CatalogStore;

/// Read-only catalog queries over the `products` table.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn distinct_tags(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT lower(tag)
            FROM products p, unnest(p.tags) AS tag
            WHERE p.is_active AND p.stock > 0 AND btrim(tag) <> ''
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load product tags")
    }

    async fn distinct_categories(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT lower(category)
            FROM products
            WHERE is_active AND stock > 0
              AND category IS NOT NULL AND btrim(category) <> ''
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load product categories")
    }

    async fn find_inventory(
        &self,
        filter: &InventoryFilter,
        limit: usize,
    ) -> Result<Vec<InventoryItem>> {
        let mut qb = inventory_query(filter, limit);
        qb.build_query_as::<InventoryItem>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to query inventory")
    }
}

fn inventory_query(filter: &InventoryFilter, limit: usize) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT p.name, p.brand, p.category, p.price, p.stock, p.sku \
         FROM products p WHERE p.is_active AND p.stock > 0 ",
    );
    append_inventory_filters(&mut qb, filter);
    qb.push("ORDER BY p.price ASC, p.name ASC LIMIT ");
    qb.push_bind(limit as i64);
    qb
}

/// Append the term alternation (`~*`, case-insensitive) over name, brand,
/// category and tags, and the optional price ceiling. `p` must alias `products`.
pub fn append_inventory_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &InventoryFilter) {
    if let Some(pattern) = filter.pattern() {
        qb.push("AND (p.name ~* ");
        qb.push_bind(pattern.clone());
        qb.push(" OR p.brand ~* ");
        qb.push_bind(pattern.clone());
        qb.push(" OR p.category ~* ");
        qb.push_bind(pattern.clone());
        qb.push(" OR EXISTS (SELECT 1 FROM unnest(p.tags) AS tag WHERE tag ~* ");
        qb.push_bind(pattern);
        qb.push(")) ");
    }
    if let Some(max_price) = filter.max_price {
        qb.push("AND p.price <= ");
        qb.push_bind(max_price);
        qb.push(" ");
    }
}
