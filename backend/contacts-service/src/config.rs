use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_env")]
    pub env: String,

    #[serde(default = "default_app_host")]
    pub host: String,

    #[serde(default = "default_app_port")]
    pub port: u16,

    /// Public base URL used when building verification links.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,

    #[serde(default = "default_jwt_access_ttl")]
    pub access_token_ttl: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Empty host disables the SMTP transport entirely.
    #[serde(default)]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: String,

    #[serde(default)]
    pub smtp_password: String,

    pub smtp_from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root of the statically served directory. Avatars land under
    /// `<public_dir>/avatars`, staged uploads under `<public_dir>/tmp`.
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
}

// Default value functions
fn default_app_env() -> String {
    "development".to_string()
}

fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_app_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_db_max_connections() -> u32 {
    20
}

fn default_jwt_access_ttl() -> i64 {
    3600 // 1 hour
}

fn default_smtp_port() -> u16 {
    587
}

fn default_public_dir() -> String {
    "public".to_string()
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        let app = AppConfig {
            env: env::var("APP_ENV").unwrap_or_else(|_| default_app_env()),
            host: env::var("APP_HOST").unwrap_or_else(|_| default_app_host()),
            port: env::var("APP_PORT")
                .unwrap_or_else(|_| default_app_port().to_string())
                .parse()
                .unwrap_or(default_app_port()),
            base_url: env::var("APP_BASE_URL").unwrap_or_else(|_| default_base_url()),
        };

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| default_db_max_connections().to_string())
                .parse()
                .unwrap_or(default_db_max_connections()),
        };

        let jwt = JwtConfig {
            secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            access_token_ttl: env::var("JWT_ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| default_jwt_access_ttl().to_string())
                .parse()
                .unwrap_or(default_jwt_access_ttl()),
        };

        let email = EmailConfig {
            // Empty host leaves the SMTP transport disabled.
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| default_smtp_port().to_string())
                .parse()
                .unwrap_or(default_smtp_port()),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            smtp_from: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "noreply@contacts-api.dev".to_string()),
        };

        let storage = StorageConfig {
            public_dir: env::var("PUBLIC_DIR").unwrap_or_else(|_| default_public_dir()),
        };

        Ok(Config {
            app,
            database,
            jwt,
            email,
            storage,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }

    pub fn is_development(&self) -> bool {
        self.app.env == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_app_env(), "development");
        assert_eq!(default_app_host(), "0.0.0.0");
        assert_eq!(default_app_port(), 8080);
        assert_eq!(default_db_max_connections(), 20);
        assert_eq!(default_jwt_access_ttl(), 3600);
        assert_eq!(default_smtp_port(), 587);
        assert_eq!(default_public_dir(), "public");
    }
}
