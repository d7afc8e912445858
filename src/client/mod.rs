//! Typed client for the catalog/booking API.
//!
//! Requests are validated locally before anything goes over the wire, so a
//! form with bad fields never costs a round trip. Network failures are not
//! retried; they surface as [`ClientError::Network`].

pub mod filter;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::AppConfig;
use crate::models::{Booking, BookingRequest, Listing, ListingRequest};
use crate::services::catalog::CatalogQuery;
use crate::validation::FieldErrors;

pub use filter::FilterState;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("{0} not found")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("request failed, please try again")]
    Network(#[source] reqwest::Error),
}

pub struct MarketClient {
    base_url: String,
    http: reqwest::Client,
}

impl MarketClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.api_url.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_listings(&self, query: &CatalogQuery) -> Result<Vec<Listing>, ClientError> {
        let resp = self
            .http
            .get(self.url("/api/products"))
            .query(&query.to_params())
            .send()
            .await
            .map_err(ClientError::Network)?;
        decode(resp, "product").await
    }

    pub async fn get_listing(&self, id: &str) -> Result<Listing, ClientError> {
        let resp = self
            .http
            .get(self.url(&format!("/api/products/{id}")))
            .send()
            .await
            .map_err(ClientError::Network)?;
        decode(resp, "product").await
    }

    pub async fn create_listing(
        &self,
        admin_token: &str,
        request: &ListingRequest,
    ) -> Result<Listing, ClientError> {
        request
            .clone()
            .validate_into()
            .map_err(ClientError::Validation)?;

        let resp = self
            .http
            .post(self.url("/api/products"))
            .bearer_auth(admin_token)
            .json(request)
            .send()
            .await
            .map_err(ClientError::Network)?;
        decode(resp, "product").await
    }

    pub async fn submit_booking(&self, request: &BookingRequest) -> Result<Booking, ClientError> {
        request
            .clone()
            .validate_into()
            .map_err(ClientError::Validation)?;

        let resp = self
            .http
            .post(self.url("/api/bookings"))
            .json(request)
            .send()
            .await
            .map_err(ClientError::Network)?;
        decode(resp, "booking").await
    }

    pub async fn list_bookings(&self, admin_token: &str) -> Result<Vec<Booking>, ClientError> {
        let resp = self
            .http
            .get(self.url("/api/bookings"))
            .bearer_auth(admin_token)
            .send()
            .await
            .map_err(ClientError::Network)?;
        decode(resp, "booking").await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response, what: &str) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return resp.json().await.map_err(ClientError::Network);
    }

    let body: serde_json::Value = resp.json().await.unwrap_or_default();
    let message = body["error"]
        .as_str()
        .unwrap_or("unexpected response")
        .to_string();

    Err(match status {
        StatusCode::BAD_REQUEST => {
            let mut fields: FieldErrors =
                serde_json::from_value(body["fields"].clone()).unwrap_or_default();
            if fields.is_empty() {
                fields.add("body", message);
            }
            ClientError::Validation(fields)
        }
        StatusCode::NOT_FOUND => ClientError::NotFound(what.to_string()),
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        _ => ClientError::Server {
            status: status.as_u16(),
            message,
        },
    })
}
