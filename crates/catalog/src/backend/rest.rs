//! Hosted backend client.
//!
//! Speaks the PostgREST dialect for table access (`/rest/v1/{table}`) and the
//! object storage API for uploads (`/storage/v1/object/{bucket}/{key}`). Every
//! request carries the project API key both as `apikey` and as a bearer token.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};
use url::Url;

use toppers_core::{CategoryId, Email, ProductId};

use super::{Bucket, RemoteError, RemoteStore};
use crate::config::BackendConfig;
use crate::models::{
    AdminCredential, Category, CategoryUpdate, NewCategory, NewProduct, Product, ProductUpdate,
};

/// Column list for product reads, with the category relation embedded.
const PRODUCT_SELECT: &str = "*,categories(name,icon)";

/// Characters of an error body kept for logs and errors.
const ERROR_BODY_LIMIT: usize = 500;

/// Client for the hosted table and storage API.
#[derive(Clone)]
pub struct RestStore {
    inner: Arc<RestStoreInner>,
}

struct RestStoreInner {
    client: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

impl RestStore {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        // Url::join drops the last path segment unless the base ends in '/'
        let mut base_url = config.api_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            inner: Arc::new(RestStoreInner {
                client: reqwest::Client::new(),
                base_url,
                api_key: config.api_key.clone(),
            }),
        }
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, RemoteError> {
        let mut url = self.inner.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn table(&self, table: &str, query: &[(&str, &str)]) -> Result<Url, RemoteError> {
        self.endpoint(&format!("rest/v1/{table}"), query)
    }

    fn public_object_url(&self, bucket: Bucket, key: &str) -> Result<Url, RemoteError> {
        self.endpoint(&format!("storage/v1/object/public/{bucket}/{key}"), &[])
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let key = self.inner.api_key.expose_secret();
        self.inner
            .client
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(key)
    }

    /// Send a request and return the body, failing on non-success statuses.
    async fn send(&self, request: RequestBuilder) -> Result<String, RemoteError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let body = truncate(&body);
            error!(
                status = %status,
                body = %body,
                "Backend returned non-success status"
            );
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, RemoteError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %truncate(&body),
                "Failed to parse backend response"
            );
            RemoteError::Parse(e)
        })
    }

    /// Send a mutation that returns the affected rows and keep the first.
    async fn send_single<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, RemoteError> {
        let rows: Vec<T> = self
            .send_json(request.header("Prefer", "return=representation"))
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::NotFound(what.to_owned()))
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    #[instrument(skip(self))]
    async fn select_products(&self) -> Result<Vec<Product>, RemoteError> {
        let url = self.table(
            "products",
            &[("select", PRODUCT_SELECT), ("order", "created_at.desc")],
        )?;
        let products: Vec<Product> = self.send_json(self.request(Method::GET, url)).await?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn select_categories(&self) -> Result<Vec<Category>, RemoteError> {
        let url = self.table("categories", &[("select", "*"), ("order", "name.asc")])?;
        let categories: Vec<Category> = self.send_json(self.request(Method::GET, url)).await?;
        debug!(count = categories.len(), "Fetched categories");
        Ok(categories)
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn insert_product(&self, product: &NewProduct) -> Result<Product, RemoteError> {
        let url = self.table("products", &[("select", "*")])?;
        self.send_single(self.request(Method::POST, url).json(product), "inserted product")
            .await
    }

    #[instrument(skip(self, update), fields(product_id = %id))]
    async fn update_product(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RemoteError> {
        let filter = format!("eq.{id}");
        let url = self.table("products", &[("id", filter.as_str()), ("select", "*")])?;
        self.send_single(
            self.request(Method::PATCH, url).json(update),
            &format!("product {id}"),
        )
        .await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: &ProductId) -> Result<(), RemoteError> {
        let filter = format!("eq.{id}");
        let url = self.table("products", &[("id", filter.as_str())])?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    #[instrument(skip(self, category), fields(name = %category.name))]
    async fn insert_category(&self, category: &NewCategory) -> Result<Category, RemoteError> {
        let url = self.table("categories", &[("select", "*")])?;
        self.send_single(
            self.request(Method::POST, url).json(category),
            "inserted category",
        )
        .await
    }

    #[instrument(skip(self, update), fields(category_id = %id))]
    async fn update_category(
        &self,
        id: &CategoryId,
        update: &CategoryUpdate,
    ) -> Result<Category, RemoteError> {
        let filter = format!("eq.{id}");
        let url = self.table("categories", &[("id", filter.as_str()), ("select", "*")])?;
        self.send_single(
            self.request(Method::PATCH, url).json(update),
            &format!("category {id}"),
        )
        .await
    }

    #[instrument(skip(self), fields(category_id = %id))]
    async fn delete_category(&self, id: &CategoryId) -> Result<(), RemoteError> {
        let filter = format!("eq.{id}");
        let url = self.table("categories", &[("id", filter.as_str())])?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn find_admin_user(&self, email: &Email) -> Result<Option<AdminCredential>, RemoteError> {
        // Stored addresses may carry any case; rows normalize on deserialize
        let filter = email_filter(email);
        let url = self.table("admin_users", &[("select", "*"), ("email", filter.as_str())])?;
        let rows: Vec<AdminCredential> = self.send_json(self.request(Method::GET, url)).await?;
        Ok(rows.into_iter().find(|row| &row.user.email == email))
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload_object(
        &self,
        bucket: Bucket,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, RemoteError> {
        let url = self.endpoint(&format!("storage/v1/object/{bucket}/{key}"), &[])?;
        self.send(
            self.request(Method::POST, url)
                .header("Content-Type", content_type)
                .header("x-upsert", "false")
                .body(bytes),
        )
        .await?;

        Ok(self.public_object_url(bucket, key)?.to_string())
    }
}

/// Case-insensitive exact match on an email column.
fn email_filter(email: &Email) -> String {
    let mut filter = String::from("ilike.");
    for c in email.as_str().chars() {
        if matches!(c, '%' | '_' | '\\') {
            filter.push('\\');
        }
        filter.push(c);
    }
    filter
}

fn truncate(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}
