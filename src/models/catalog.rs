use serde::{Deserialize, Serialize};

use super::id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(deserialize_with = "id::id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "id::id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<f64>,
    #[serde(
        default,
        deserialize_with = "id::optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: u32,
}

impl Product {
    /// Price the customer actually pays
    pub fn effective_price(&self) -> f64 {
        match self.discount_price {
            Some(p) if p < self.price => p,
            _ => self.price,
        }
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Filters for `GET /product`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// One page of products
///
/// The listing endpoint answers either with a bare array or with a paged
/// envelope; both decode to this type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "ProductListing")]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub page: u32,
    pub total_pages: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProductListing {
    Plain(Vec<Product>),
    Paged(PagedEnvelope),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PagedEnvelope {
    #[serde(alias = "content", alias = "products")]
    items: Vec<Product>,
    #[serde(default)]
    page: u32,
    #[serde(default = "one")]
    total_pages: u32,
}

fn one() -> u32 {
    1
}

impl From<ProductListing> for ProductPage {
    fn from(listing: ProductListing) -> Self {
        match listing {
            ProductListing::Plain(items) => ProductPage {
                items,
                page: 0,
                total_pages: 1,
            },
            ProductListing::Paged(env) => ProductPage {
                items: env.items,
                page: env.page,
                total_pages: env.total_pages,
            },
        }
    }
}

impl ProductPage {
    pub fn has_more(&self) -> bool {
        self.page.saturating_add(1) < self.total_pages
    }
}
