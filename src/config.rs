use std::env;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
    Stripe,
    Mock,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub auth_secret: String,
    pub app_url: String,
    pub payment_provider: PaymentProvider,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: String,
    pub stripe_api_base: String,
    pub checkout_currency: String,
    pub webhook_tolerance_secs: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Every missing required
    /// variable is reported in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let payment_provider = match get("PAYMENT_PROVIDER").as_deref() {
            None | Some("stripe") => PaymentProvider::Stripe,
            Some("mock") => PaymentProvider::Mock,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "PAYMENT_PROVIDER",
                    reason: format!("expected `stripe` or `mock`, got `{other}`"),
                });
            }
        };

        let mut missing = Vec::new();
        let mut require = |key: &'static str| {
            let value = get(key);
            if value.is_none() {
                missing.push(key);
            }
            value.unwrap_or_default()
        };

        let database_url = require("DATABASE_URL");
        let auth_secret = require("AUTH_SECRET");
        let stripe_webhook_secret = require("STRIPE_WEBHOOK_SECRET");
        let app_url = require("APP_URL");
        let stripe_secret_key = match payment_provider {
            PaymentProvider::Stripe => Some(require("STRIPE_SECRET_KEY")),
            PaymentProvider::Mock => get("STRIPE_SECRET_KEY"),
        };

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        if let Some(key) = stripe_secret_key.as_deref() {
            if !key.starts_with("sk_") {
                return Err(ConfigError::Invalid {
                    var: "STRIPE_SECRET_KEY",
                    reason: "must start with `sk_`".into(),
                });
            }
        }
        if !stripe_webhook_secret.starts_with("whsec_") {
            return Err(ConfigError::Invalid {
                var: "STRIPE_WEBHOOK_SECRET",
                reason: "must start with `whsec_`".into(),
            });
        }

        let port = parse_or("APP_PORT", get("APP_PORT"), 3000)?;
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 10)?;
        let webhook_tolerance_secs =
            parse_or("WEBHOOK_TOLERANCE_SECS", get("WEBHOOK_TOLERANCE_SECS"), 300)?;

        Ok(Self {
            database_url,
            host: get("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            db_max_connections,
            auth_secret,
            app_url: app_url.trim_end_matches('/').to_string(),
            payment_provider,
            stripe_secret_key,
            stripe_webhook_secret,
            stripe_api_base: get("STRIPE_API_BASE")
                .unwrap_or_else(|| "https://api.stripe.com".to_string()),
            checkout_currency: get("CHECKOUT_CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or_else(|| "usd".to_string()),
            webhook_tolerance_secs,
        })
    }
}

/// `DATABASE_URL` alone, for the operational binaries.
pub fn database_url_from_env() -> Result<String, ConfigError> {
    env::var("DATABASE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing(vec!["DATABASE_URL"]))
}

fn parse_or<T: std::str::FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            var,
            reason: format!("`{value}` is not a valid number"),
        }),
    }
}
