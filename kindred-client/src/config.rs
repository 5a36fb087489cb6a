use kindred_core::config::{get_env, ConfigError, Environment};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Anonymous key attached to public endpoints (signup, health).
    pub anon_key: String,
    pub provider_url: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            provider_url: base_url.clone(),
            base_url,
            anon_key: anon_key.into(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let is_prod = Environment::from_env()? == Environment::Prod;

        Ok(Self {
            base_url: get_env("KINDRED_API_URL", Some("http://localhost:8080"), is_prod)?,
            anon_key: get_env("KINDRED_ANON_KEY", Some("dev-anon-key"), is_prod)?,
            provider_url: get_env(
                "IDENTITY_PROVIDER_URL",
                Some("http://localhost:9999"),
                is_prod,
            )?,
        })
    }
}
