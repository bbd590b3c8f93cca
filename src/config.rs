//! Connection parameters for the Odoo backend
//!
//! Read once at startup, validated, then threaded through construction.
//! Immutable for the process lifetime; there is no rotation or refresh.

use crate::error::{OdooError, Result};

/// Connection parameters for the Odoo backend.
#[derive(Debug, Clone)]
pub struct OdooConfig {
    /// Base URL of the Odoo server, e.g. `https://odoo.example.com`
    pub url: String,
    /// Database name
    pub db: String,
    /// Login user
    pub username: String,
    /// Password or API key
    pub password: String,
    /// Verify the backend's TLS certificate. Off by default: the target
    /// deployments run self-signed certificates.
    pub verify_tls: bool,
}

impl OdooConfig {
    /// Check that the configuration is usable. An empty secret is a
    /// configuration error, not something to discover on the first call.
    pub fn validate(&self) -> Result<()> {
        if self.password.is_empty() {
            return Err(OdooError::Config("ODOO_PASSWORD is not set".to_string()));
        }
        if self.url.is_empty() || self.db.is_empty() || self.username.is_empty() {
            return Err(OdooError::Config(
                "ODOO_URL, ODOO_DB and ODOO_USER must all be set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OdooConfig {
        OdooConfig {
            url: "https://odoo.example.com".to_string(),
            db: "production".to_string(),
            username: "bot@example.com".to_string(),
            password: "secret".to_string(),
            verify_tls: false,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_empty_password_is_config_error() {
        let mut cfg = config();
        cfg.password = String::new();

        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, OdooError::Config(_)));
        assert!(err.to_string().contains("ODOO_PASSWORD"));
    }

    #[test]
    fn test_empty_url_is_config_error() {
        let mut cfg = config();
        cfg.url = String::new();
        assert!(cfg.validate().is_err());
    }
}
