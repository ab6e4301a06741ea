use reqwest::Method;
use std::sync::Arc;

use crate::error::Result;
use crate::http_client::StorefrontHttpClient;
use crate::models::{Category, Product, ProductPage, ProductQuery};

/// Categories and products
#[derive(Clone)]
pub struct CatalogApi {
    http: Arc<StorefrontHttpClient>,
}

impl CatalogApi {
    pub fn new(http: Arc<StorefrontHttpClient>) -> Self {
        Self { http }
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.http
            .send_json(self.http.request(Method::GET, "/category"))
            .await
    }

    pub async fn products(&self, query: &ProductQuery) -> Result<ProductPage> {
        self.http
            .send_json(self.http.request(Method::GET, "/product").query(query))
            .await
    }

    pub async fn product(&self, id: &str) -> Result<Product> {
        self.http
            .send_json(self.http.request(Method::GET, &format!("/product/{}", id)))
            .await
    }
}
