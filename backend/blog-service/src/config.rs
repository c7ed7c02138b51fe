/// Configuration management for Blog Service
///
/// Everything is read from environment variables; `main` loads a `.env` file
/// first when one is present.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Which record store backs the service
    pub store: StoreKind,
    /// Database configuration (used by the postgres store)
    pub database: DatabaseConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!(
                "BLOG_STORE must be 'postgres' or 'memory', got '{}'",
                other
            )),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("BLOG_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("BLOG_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            store: match std::env::var("BLOG_STORE") {
                Ok(value) => value.parse()?,
                Err(_) => StoreKind::Postgres,
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/blog".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
                run_migrations: std::env::var("BLOG_RUN_MIGRATIONS")
                    .ok()
                    .and_then(|v| parse_bool(&v))
                    .unwrap_or(!production),
            },
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "APP_ENV",
        "BLOG_SERVICE_HOST",
        "BLOG_SERVICE_PORT",
        "CORS_ALLOWED_ORIGINS",
        "BLOG_STORE",
        "DATABASE_URL",
        "DATABASE_MAX_CONNECTIONS",
        "BLOG_RUN_MIGRATIONS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn defaults_for_development() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.port, 8080);
        assert_eq!(config.store, StoreKind::Postgres);
        assert_eq!(config.database.url, "postgresql://localhost/blog");
        assert_eq!(config.database.max_connections, 10);
        assert!(config.database.run_migrations);
        assert_eq!(config.cors.allowed_origins, "http://localhost:3000");
    }

    #[test]
    #[serial]
    fn production_requires_explicit_cors() {
        clear_env();
        std::env::set_var("APP_ENV", "production");
        assert!(Config::from_env().is_err());

        std::env::set_var("CORS_ALLOWED_ORIGINS", "*");
        assert!(Config::from_env().is_err());

        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://blog.example.com");
        let config = Config::from_env().unwrap();
        assert!(config.app.is_production());
        assert!(!config.database.run_migrations);
        clear_env();
    }

    #[test]
    #[serial]
    fn store_kind_is_validated() {
        clear_env();
        std::env::set_var("BLOG_STORE", "Memory");
        assert_eq!(Config::from_env().unwrap().store, StoreKind::Memory);

        std::env::set_var("BLOG_STORE", "sqlite");
        assert!(Config::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn unparsable_numbers_fall_back() {
        clear_env();
        std::env::set_var("BLOG_SERVICE_PORT", "http");
        std::env::set_var("BLOG_RUN_MIGRATIONS", "maybe");
        let config = Config::from_env().unwrap();
        assert_eq!(config.app.port, 8080);
        assert!(config.database.run_migrations);
        clear_env();
    }
}
