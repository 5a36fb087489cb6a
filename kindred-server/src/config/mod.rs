use kindred_core::config::{get_env, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub port: u16,
    pub security: SecurityConfig,
    pub identity: IdentityConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

/// Connection settings for the external identity provider's REST API.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub url: String,
    pub service_key: String,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub redis_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = Environment::from_env()?;
        let is_prod = environment == Environment::Prod;

        let config = ServerConfig {
            environment,
            service_name: get_env("SERVICE_NAME", Some("kindred-server"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: get_env("PORT", Some("8080"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigError(e.to_string()))?,
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            identity: IdentityConfig {
                url: get_env("IDENTITY_PROVIDER_URL", Some("http://localhost:9999"), is_prod)?,
                service_key: get_env("IDENTITY_SERVICE_KEY", Some("dev-service-key"), is_prod)?,
            },
            store: StoreConfig {
                backend: get_env("STORE_BACKEND", Some("memory"), is_prod)?
                    .parse()
                    .map_err(ConfigError)?,
                redis_url: get_env("REDIS_URL", Some("redis://localhost:6379"), is_prod)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError("PORT must be greater than 0".to_string()));
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(ConfigError(
                    "Wildcard CORS origin not allowed in production".to_string(),
                ));
            }
            if self.store.backend == StoreBackend::Memory {
                return Err(ConfigError(
                    "Memory store backend not allowed in production".to_string(),
                ));
            }
        }

        Ok(())
    }
}
