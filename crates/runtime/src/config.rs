//! Process configuration, loaded from the environment.

/// Configuration handed to every module's service contribution.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,

    /// HMAC secret for issued and verified JWTs.
    pub jwt_secret: String,

    /// Module names to compose. Empty means "every registered module".
    pub enabled_modules: Vec<String>,
}

impl AppConfig {
    /// Load configuration from environment variables with dev-friendly
    /// defaults.
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("PACKHUB_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });

        let enabled_modules = std::env::var("PACKHUB_MODULES")
            .map(|csv| {
                csv.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            bind_addr,
            jwt_secret,
            enabled_modules,
        }
    }

    /// Fixed configuration for tests (no environment access).
    pub fn for_tests(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            jwt_secret: jwt_secret.into(),
            enabled_modules: Vec::new(),
        }
    }
}
