//! REST client for the storefront catalog API.
//!
//! Uses `reqwest` for HTTP. Product metadata is cached with `moka`
//! (TTL from configuration); stock records always hit the API.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use rocketshoes_core::{Product, ProductId, StockRecord};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{CatalogError, ProductCatalog, StockService};
use crate::config::CatalogApiConfig;

const PRODUCT_CACHE_CAPACITY: u64 = 1000;

/// Body of `GET /stock/{id}`. Only `amount` is required; the product is
/// identified by the request path.
#[derive(Debug, Deserialize)]
struct StockBody {
    amount: u32,
}

/// Client for the catalog and stock endpoints.
///
/// Cheaply cloneable; clones share the HTTP connection pool and the
/// product cache.
#[derive(Clone)]
pub struct HttpCatalog {
    inner: Arc<HttpCatalogInner>,
}

struct HttpCatalogInner {
    client: reqwest::Client,
    base_url: Url,
    products: Option<Cache<ProductId, Product>>,
}

impl HttpCatalog {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &CatalogApiConfig) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| CatalogError::Parse(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let products = config.product_cache_ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(PRODUCT_CACHE_CAPACITY)
                .time_to_live(ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(HttpCatalogInner {
                client,
                base_url: config.base_url.clone(),
                products,
            }),
        })
    }

    /// Drop all cached product metadata.
    pub fn invalidate_products(&self) {
        if let Some(cache) = &self.inner.products {
            cache.invalidate_all();
        }
    }

    fn endpoint(&self, resource: &str, id: ProductId) -> Result<Url, CatalogError> {
        self.inner
            .base_url
            .join(&format!("{resource}/{id}"))
            .map_err(|e| CatalogError::Parse(format!("Invalid endpoint for {resource}/{id}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let path = url.path().to_string();
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(path));
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| CatalogError::Parse(format!("{path}: {e}")))
    }
}

#[async_trait]
impl StockService for HttpCatalog {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn stock(&self, id: ProductId) -> Result<StockRecord, CatalogError> {
        let url = self.endpoint("stock", id)?;
        let StockBody { amount } = self.get_json(url).await?;
        debug!(available = amount, "Fetched stock");
        Ok(StockRecord { id, amount })
    }
}

#[async_trait]
impl ProductCatalog for HttpCatalog {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        if let Some(cache) = &self.inner.products
            && let Some(product) = cache.get(&id).await
        {
            debug!("Product cache hit");
            return Ok(product);
        }

        let url = self.endpoint("products", id)?;
        let product: Product = self.get_json(url).await?;

        if let Some(cache) = &self.inner.products {
            cache.insert(id, product.clone()).await;
        }
        Ok(product)
    }
}
