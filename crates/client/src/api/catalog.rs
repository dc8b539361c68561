//! Catalog endpoints: categories and products.
//!
//! Reads are cached for 5 minutes; the cache key space is shared with nothing
//! else, so a plain string key per query is enough.

use std::sync::Arc;

use tracing::{debug, instrument};

use greenbasket_core::{CategoryId, ProductId};

use super::{ApiClient, ApiError, paths};
use super::types::{Category, Product};

/// Cached catalog responses.
#[derive(Clone)]
pub(crate) enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Products(Arc<Vec<Product>>),
    Product(Arc<Product>),
}

impl ApiClient {
    /// List all product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        const CACHE_KEY: &str = "categories";

        if let Some(CacheValue::Categories(hit)) = self.inner.catalog_cache.get(CACHE_KEY).await {
            debug!("cache hit for categories");
            return Ok((*hit).clone());
        }

        let categories: Vec<Category> = self.get(paths::CATEGORIES).await?;
        self.inner
            .catalog_cache
            .insert(
                CACHE_KEY.to_string(),
                CacheValue::Categories(Arc::new(categories.clone())),
            )
            .await;

        Ok(categories)
    }

    /// List the products in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, category_id: CategoryId) -> Result<Vec<Product>, ApiError> {
        let cache_key = format!("products:{category_id}");

        if let Some(CacheValue::Products(hit)) = self.inner.catalog_cache.get(&cache_key).await {
            debug!("cache hit for product list");
            return Ok((*hit).clone());
        }

        let products: Vec<Product> = self
            .get(&format!("products/?category={category_id}"))
            .await?;
        self.inner
            .catalog_cache
            .insert(cache_key, CacheValue::Products(Arc::new(products.clone())))
            .await;

        Ok(products)
    }

    /// Get a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self))]
    pub async fn product(&self, product_id: ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{product_id}");

        if let Some(CacheValue::Product(hit)) = self.inner.catalog_cache.get(&cache_key).await {
            debug!("cache hit for product");
            return Ok((*hit).clone());
        }

        let product: Product = self.get(&format!("product/{product_id}/")).await?;
        self.inner
            .catalog_cache
            .insert(cache_key, CacheValue::Product(Arc::new(product.clone())))
            .await;

        Ok(product)
    }
}
