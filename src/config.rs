//! Gateway connection settings, loaded from a TOML file.
//!
//! ```toml
//! [gateway]
//! merchant_id = "123456"
//! password = "secret"
//! host = "www.paymentsgateway.net"
//! port = 6050
//! connect_timeout_secs = 10
//! read_timeout_secs = 60
//! ```

use crate::domain::builders::MerchantCredentials;
use crate::domain::fields::DEFAULT_PORT;
use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub gateway: GatewayConfig,
}

/// Read-only once loaded; shared by every transaction of a tenant.
#[derive(Clone, Deserialize)]
pub struct GatewayConfig {
    pub merchant_id: String,
    pub password: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Plain TCP is only meant for local test gateways.
    #[serde(default = "default_tls")]
    pub tls: bool,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("merchant_id", &self.merchant_id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .finish_non_exhaustive()
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_tls() -> bool {
    true
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_read_timeout_secs() -> u64 {
    60
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PaymentError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(raw).map_err(|e| PaymentError::ConfigError(e.to_string()))?;
        settings.gateway.validate()?;
        Ok(settings)
    }
}

impl GatewayConfig {
    /// # Errors
    ///
    /// Fails when credentials or host are blank, or a timeout is outside 1-300 seconds.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("merchant_id", &self.merchant_id),
            ("password", &self.password),
            ("host", &self.host),
        ] {
            if value.trim().is_empty() {
                return Err(PaymentError::ConfigError(format!(
                    "gateway.{} must be specified",
                    name
                )));
            }
        }
        for (name, value) in [
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("read_timeout_secs", self.read_timeout_secs),
        ] {
            if value == 0 || value > 300 {
                return Err(PaymentError::ConfigError(format!(
                    "gateway.{} must be between 1 and 300",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn credentials(&self) -> MerchantCredentials {
        MerchantCredentials {
            merchant_id: self.merchant_id.clone(),
            password: self.password.clone(),
        }
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let settings = Settings::from_toml(
            r#"
            [gateway]
            merchant_id = "123456"
            password = "secret"
            host = "gateway.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(settings.gateway.port, 6050);
        assert!(settings.gateway.tls);
        assert_eq!(settings.gateway.connect_timeout(), Duration::from_secs(10));
        assert_eq!(settings.gateway.read_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_blank_password_rejected() {
        let result = Settings::from_toml(
            r#"
            [gateway]
            merchant_id = "123456"
            password = ""
            host = "gateway.example.com"
            "#,
        );
        assert!(matches!(result, Err(PaymentError::ConfigError(_))));
    }

    #[test]
    fn test_timeout_bounds() {
        let result = Settings::from_toml(
            r#"
            [gateway]
            merchant_id = "1"
            password = "p"
            host = "h"
            read_timeout_secs = 0
            "#,
        );
        assert!(matches!(result, Err(PaymentError::ConfigError(_))));
    }

    #[test]
    fn test_debug_hides_password() {
        let settings = Settings::from_toml(
            r#"
            [gateway]
            merchant_id = "1"
            password = "hunter2"
            host = "h"
            "#,
        )
        .unwrap();
        assert!(!format!("{:?}", settings).contains("hunter2"));
    }
}
