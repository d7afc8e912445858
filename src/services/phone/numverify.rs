use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

use super::{PhoneVerdict, PhoneVerifier};

pub struct NumVerifyClient {
    endpoint: String,
    access_key: String,
    client: reqwest::Client,
}

impl NumVerifyClient {
    pub fn new(endpoint: String, access_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            endpoint,
            access_key,
            client,
        }
    }

    /// `Some(valid)` when the service gave an answer, `None` when it did not say.
    async fn lookup(&self, phone: &str) -> anyhow::Result<Option<bool>> {
        let number: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("access_key", self.access_key.as_str()),
                ("number", number.as_str()),
                ("country_code", ""),
                ("format", "1"),
            ])
            .send()
            .await
            .context("failed to call NumVerify API")?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse NumVerify response")?;

        if !status.is_success() {
            anyhow::bail!("NumVerify API error ({}): {}", status, data);
        }

        Ok(data["valid"].as_bool())
    }
}

#[async_trait]
impl PhoneVerifier for NumVerifyClient {
    async fn validate(&self, phone: &str) -> PhoneVerdict {
        match self.lookup(phone).await {
            Ok(Some(true)) => PhoneVerdict::Valid,
            Ok(Some(false)) => PhoneVerdict::Invalid,
            Ok(None) => {
                tracing::warn!("NumVerify returned no verdict, allowing phone");
                PhoneVerdict::Unknown
            }
            Err(e) => {
                tracing::warn!(error = %e, "NumVerify check failed, allowing phone");
                PhoneVerdict::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};

    use super::*;

    // Stub service: numbers ending in 0 are invalid, 1 has no verdict, 5 is a server error.
    async fn stub(Query(q): Query<HashMap<String, String>>) -> (StatusCode, Json<serde_json::Value>) {
        if q.get("access_key").map(String::as_str) != Some("test-key") {
            return (
                StatusCode::OK,
                Json(serde_json::json!({"success": false, "error": {"code": 101}})),
            );
        }
        let number = q.get("number").cloned().unwrap_or_default();
        match number.chars().last() {
            Some('0') => (StatusCode::OK, Json(serde_json::json!({"valid": false}))),
            Some('1') => (StatusCode::OK, Json(serde_json::json!({"success": true}))),
            Some('5') => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "boom"})),
            ),
            _ => (
                StatusCode::OK,
                Json(serde_json::json!({"valid": true, "number": number})),
            ),
        }
    }

    async fn spawn_stub() -> String {
        let app = Router::new().route("/validate", get(stub));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/validate")
    }

    #[tokio::test]
    async fn test_verdicts() {
        let url = spawn_stub().await;
        let client = NumVerifyClient::new(url, "test-key".to_string());

        assert_eq!(client.validate("+1 (555) 123-4567").await, PhoneVerdict::Valid);
        assert_eq!(client.validate("+1 (555) 123-4560").await, PhoneVerdict::Invalid);
        assert_eq!(client.validate("+1 (555) 123-4561").await, PhoneVerdict::Unknown);
        assert_eq!(client.validate("+1 (555) 123-4565").await, PhoneVerdict::Unknown);
    }

    #[tokio::test]
    async fn test_bad_key_is_unknown() {
        let url = spawn_stub().await;
        let client = NumVerifyClient::new(url, "wrong".to_string());
        assert_eq!(client.validate("5551234560").await, PhoneVerdict::Unknown);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unknown() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = NumVerifyClient::new(format!("http://{addr}/validate"), "test-key".to_string());
        assert_eq!(client.validate("5551234560").await, PhoneVerdict::Unknown);
    }

    #[tokio::test]
    async fn test_disabled_verifier() {
        assert_eq!(
            crate::services::phone::DisabledVerifier
                .validate("5551234560")
                .await,
            PhoneVerdict::Unknown
        );
    }
}
