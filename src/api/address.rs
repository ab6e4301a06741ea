use reqwest::Method;
use std::sync::Arc;

use crate::error::Result;
use crate::http_client::StorefrontHttpClient;
use crate::models::{Address, AddressRequest};

/// Saved shipping addresses
#[derive(Clone)]
pub struct AddressApi {
    http: Arc<StorefrontHttpClient>,
}

impl AddressApi {
    pub fn new(http: Arc<StorefrontHttpClient>) -> Self {
        Self { http }
    }

    pub async fn list(&self) -> Result<Vec<Address>> {
        self.http
            .send_json(self.http.request(Method::GET, "/address"))
            .await
    }

    pub async fn create(&self, request: &AddressRequest) -> Result<Address> {
        self.http
            .send_json(self.http.request(Method::POST, "/address").json(request))
            .await
    }

    pub async fn update(&self, id: &str, request: &AddressRequest) -> Result<Address> {
        self.http
            .send_json(
                self.http
                    .request(Method::PUT, &format!("/address/{}", id))
                    .json(request),
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.http
            .send_empty(self.http.request(Method::DELETE, &format!("/address/{}", id)))
            .await
    }

    pub async fn set_default(&self, id: &str) -> Result<Address> {
        self.http
            .send_json(
                self.http
                    .request(Method::PUT, &format!("/address/{}/default", id)),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialStore, MemoryCredentialStore, TokenPair};
    use crate::config::Config;
    use mockito::Matcher;
    use serde_json::json;

    const ADDRESS: &str = r#"{"id":"a1","line1":"1 Main St","city":"Springfield","postalCode":"12345","country":"US"}"#;

    fn address_api(server: &mockito::ServerGuard) -> AddressApi {
        let store = Arc::new(MemoryCredentialStore::new());
        store.save_tokens(&TokenPair::new("A1", "R1")).unwrap();
        let http = StorefrontHttpClient::new(&Config::for_base_url(&server.url()), store).unwrap();
        AddressApi::new(Arc::new(http))
    }

    fn request() -> AddressRequest {
        AddressRequest {
            line1: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: "US".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/address")
            .match_header("authorization", "Bearer A1")
            .match_body(Matcher::PartialJson(json!({"postalCode": "12345"})))
            .with_status(201)
            .with_body(ADDRESS)
            .create_async()
            .await;
        let list = server
            .mock("GET", "/address")
            .with_status(200)
            .with_body(format!("[{}]", ADDRESS))
            .create_async()
            .await;

        let api = address_api(&server);
        let created = api.create(&request()).await.unwrap();
        let all = api.list().await.unwrap();

        assert_eq!(all, vec![created]);
        create.assert_async().await;
        list.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_delete_and_default() {
        let mut server = mockito::Server::new_async().await;
        let update = server
            .mock("PUT", "/address/a1")
            .with_status(200)
            .with_body(ADDRESS)
            .create_async()
            .await;
        let default = server
            .mock("PUT", "/address/a1/default")
            .with_status(200)
            .with_body(r#"{"id":"a1","line1":"1 Main St","city":"Springfield","postalCode":"12345","country":"US","isDefault":true}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/address/a1")
            .with_status(204)
            .create_async()
            .await;

        let api = address_api(&server);
        api.update("a1", &request()).await.unwrap();
        assert!(api.set_default("a1").await.unwrap().is_default);
        api.delete("a1").await.unwrap();

        update.assert_async().await;
        default.assert_async().await;
        delete.assert_async().await;
    }
}
