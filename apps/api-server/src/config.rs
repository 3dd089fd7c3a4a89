//! Application configuration loaded from environment variables.

use std::env;

use actix_web::cookie::SameSite;

use fable_infra::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub cookie: CookieConfig,
    pub seed_admin: Option<SeedAdminConfig>,
}

/// Session cookie settings. The cookie is always HTTP-only and scoped to
/// path "/"; name and the SameSite/Secure flags come from the environment.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub same_site: SameSite,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "access_token".to_string(),
            secure: false,
            same_site: SameSite::Lax,
        }
    }
}

/// Startup seed for the admin account - the only path that elevates a
/// user's role.
#[derive(Debug, Clone)]
pub struct SeedAdminConfig {
    pub email: String,
    pub password: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        });

        let cookie = CookieConfig {
            name: env::var("AUTH_COOKIE_NAME").unwrap_or_else(|_| "access_token".to_string()),
            secure: env::var("COOKIE_SECURE").map(|v| v == "true").unwrap_or(false),
            same_site: match env::var("COOKIE_SAMESITE").as_deref() {
                Ok("strict") => SameSite::Strict,
                Ok("none") => SameSite::None,
                _ => SameSite::Lax,
            },
        };

        let seed_admin = match (env::var("SEED_ADMIN_EMAIL"), env::var("SEED_ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(SeedAdminConfig { email, password }),
            _ => None,
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database,
            cookie,
            seed_admin,
        }
    }
}
