pub mod numverify;

use async_trait::async_trait;

use crate::config::AppConfig;
use numverify::NumVerifyClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneVerdict {
    Valid,
    Invalid,
    /// The check could not be made. Callers treat this as "allow".
    Unknown,
}

#[async_trait]
pub trait PhoneVerifier: Send + Sync {
    async fn validate(&self, phone: &str) -> PhoneVerdict;
}

/// Used when no verification key is configured.
pub struct DisabledVerifier;

#[async_trait]
impl PhoneVerifier for DisabledVerifier {
    async fn validate(&self, _phone: &str) -> PhoneVerdict {
        PhoneVerdict::Unknown
    }
}

pub fn from_config(config: &AppConfig) -> Box<dyn PhoneVerifier> {
    match &config.numverify_key {
        Some(key) => {
            tracing::info!("phone verification enabled (url: {})", config.numverify_url);
            Box::new(NumVerifyClient::new(config.numverify_url.clone(), key.clone()))
        }
        None => {
            tracing::warn!("NumVerify API key missing, skipping external phone validation");
            Box::new(DisabledVerifier)
        }
    }
}
