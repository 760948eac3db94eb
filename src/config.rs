//! Application configuration loaded from environment variables.
//!
//! Every variable carries the `BISTRO_` prefix. Loading fails fast with a
//! message naming the variable.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::notify::RestaurantProfile;
use crate::repository::GallerySettings;

pub const ENV_PREFIX: &str = "BISTRO_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingVar(String),
    InvalidValue { var: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVar(var) => write!(f, "Missing required environment variable: {}", var),
            ConfigError::InvalidValue { var, message } => write!(f, "Invalid value for {}: {}", var, message),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub log_dir: PathBuf,
    pub gallery: GallerySettings,
    pub admin_token: String,
    pub staff_token: Option<String>,
    pub restaurant: RestaurantProfile,
    /// Spool mails here; without it mails are only logged
    pub mail_outbox_dir: Option<PathBuf>,
}

/// Reads `BISTRO_<name>`, treating blank values as unset
struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(&format!("{}{}", ENV_PREFIX, name))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, name: &str) -> Result<String, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::MissingVar(format!("{}{}", ENV_PREFIX, name)))
    }
}

fn invalid(name: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        var: format!("{}{}", ENV_PREFIX, name),
        message: message.into(),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup };

        let bind_addr: SocketAddr = vars
            .or("BIND_ADDR", "127.0.0.1:8080")
            .parse::<SocketAddr>()
            .map_err(|e| invalid("BIND_ADDR", e.to_string()))?;

        let admin_token = vars.required("ADMIN_TOKEN")?;
        let staff_token = vars.get("STAFF_TOKEN");
        if staff_token.as_deref() == Some(admin_token.as_str()) {
            return Err(invalid("STAFF_TOKEN", "must differ from the admin token"));
        }

        let mut url_prefix = vars.or("GALLERY_URL_PREFIX", "/images/gallery/");
        if !url_prefix.starts_with('/') {
            url_prefix.insert(0, '/');
        }
        if !url_prefix.ends_with('/') {
            url_prefix.push('/');
        }

        let email = vars.or("RESTAURANT_EMAIL", "reservations@localhost");
        if !email.contains('@') {
            return Err(invalid("RESTAURANT_EMAIL", "not an email address"));
        }

        let public_base_url = vars
            .or("PUBLIC_BASE_URL", &format!("http://{}", bind_addr))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            bind_addr,
            database_path: PathBuf::from(vars.or("DATABASE_PATH", "bistro.db")),
            log_dir: PathBuf::from(vars.or("LOG_DIR", "logs")),
            gallery: GallerySettings {
                dir: PathBuf::from(vars.or("GALLERY_DIR", "public/images/gallery")),
                url_prefix,
                file_prefix: vars.or("GALLERY_FILE_PREFIX", "bistro"),
            },
            admin_token,
            staff_token,
            restaurant: RestaurantProfile {
                name: vars.or("RESTAURANT_NAME", "Bistro"),
                address: vars.or("RESTAURANT_ADDRESS", ""),
                email,
                public_base_url,
            },
            mail_outbox_dir: vars.get("MAIL_OUTBOX_DIR").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (format!("BISTRO_{}", k), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("ADMIN_TOKEN", "secret")]).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_path, PathBuf::from("bistro.db"));
        assert_eq!(config.gallery.url_prefix, "/images/gallery/");
        assert_eq!(config.restaurant.public_base_url, "http://127.0.0.1:8080");
        assert!(config.staff_token.is_none());
        assert!(config.mail_outbox_dir.is_none());
    }

    #[test]
    fn test_admin_token_is_required() {
        assert_eq!(
            load(&[("ADMIN_TOKEN", "  ")]).unwrap_err(),
            ConfigError::MissingVar("BISTRO_ADMIN_TOKEN".to_string())
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("ADMIN_TOKEN", "a"), ("BIND_ADDR", "localhost")]).unwrap_err();
        assert!(err.to_string().starts_with("Invalid value for BISTRO_BIND_ADDR"));

        let err = load(&[("ADMIN_TOKEN", "a"), ("STAFF_TOKEN", "a")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_url_prefix_is_normalized() {
        let config = load(&[
            ("ADMIN_TOKEN", "a"),
            ("GALLERY_URL_PREFIX", "media"),
            ("PUBLIC_BASE_URL", "https://bistro.test/"),
        ])
        .unwrap();
        assert_eq!(config.gallery.url_prefix, "/media/");
        assert_eq!(config.restaurant.public_base_url, "https://bistro.test");
    }
}
