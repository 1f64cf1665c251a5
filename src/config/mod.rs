use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub realtime: RealtimeConfig,
    pub functions: FunctionsConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Postgres NOTIFY channel the row-change triggers publish on
    pub channel: String,
    /// Per-subscription event buffer
    pub buffer_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionsConfig {
    pub port: u16,
    /// Where clients reach the notification functions
    pub base_url: String,
    /// Public site URL embedded in signup and tracking links
    pub site_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    pub require_auth: bool,
    pub jwt_expiry_hours: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Realtime overrides
        if let Ok(v) = env::var("REALTIME_CHANNEL") {
            if !v.trim().is_empty() {
                self.realtime.channel = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("REALTIME_BUFFER_SIZE") {
            self.realtime.buffer_size = v.parse().unwrap_or(self.realtime.buffer_size);
        }

        // Functions overrides
        if let Ok(v) = env::var("FUNCTIONS_PORT").or_else(|_| env::var("PORT")) {
            self.functions.port = v.parse().unwrap_or(self.functions.port);
        }
        if let Ok(v) = env::var("FUNCTIONS_BASE_URL") {
            self.functions.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("SITE_URL") {
            self.functions.site_url = v.trim_end_matches('/').to_string();
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_REQUIRE_AUTH") {
            self.security.require_auth = v.parse().unwrap_or(self.security.require_auth);
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 5,
                connection_timeout: 30,
            },
            realtime: RealtimeConfig {
                channel: "realtime_changes".to_string(),
                buffer_size: 256,
            },
            functions: FunctionsConfig {
                port: 54321,
                base_url: "http://localhost:54321".to_string(),
                site_url: "http://localhost:5173".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: "dev-only-secret".to_string(),
                cors_origins: vec!["http://localhost:5173".to_string()],
                require_auth: false,
                jwt_expiry_hours: 24 * 7, // 1 week
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 10,
            },
            realtime: RealtimeConfig {
                channel: "realtime_changes".to_string(),
                buffer_size: 512,
            },
            functions: FunctionsConfig {
                port: 8080,
                base_url: "https://staging.example.com".to_string(),
                site_url: "https://staging.example.com".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                cors_origins: vec!["https://staging.example.com".to_string()],
                require_auth: true,
                jwt_expiry_hours: 24,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 5,
            },
            realtime: RealtimeConfig {
                channel: "realtime_changes".to_string(),
                buffer_size: 1024,
            },
            functions: FunctionsConfig {
                port: 8080,
                base_url: "https://app.example.com".to_string(),
                site_url: "https://app.example.com".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                cors_origins: vec!["https://app.example.com".to_string()],
                require_auth: true,
                jwt_expiry_hours: 4,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}
