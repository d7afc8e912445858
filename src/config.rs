use std::env;

pub const DEFAULT_ADMIN_TOKEN: &str = "changeme";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    /// Base origin used by `MarketClient`.
    pub api_url: String,
    /// NumVerify access key. `None` disables the external phone check.
    pub numverify_key: Option<String>,
    pub numverify_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "harvest.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN")
                .unwrap_or_else(|_| DEFAULT_ADMIN_TOKEN.to_string()),
            api_url: env::var("API_URL").unwrap_or_else(|_| "http://localhost:5000".to_string()),
            numverify_key: env::var("NUMVERIFY_KEY")
                .or_else(|_| env::var("NUMVERIFY_ACCESS_KEY"))
                .ok()
                .filter(|key| !key.trim().is_empty()),
            numverify_url: env::var("NUMVERIFY_URL")
                .unwrap_or_else(|_| "http://apilayer.net/api/validate".to_string()),
        }
    }
}
