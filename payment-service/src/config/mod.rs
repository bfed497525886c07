use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{self as core_config, get_env, is_production};
use service_core::error::AppError;
use std::str::FromStr;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct GatewayConfig {
    pub provider: GatewayProvider,
    pub stripe: StripeConfig,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GatewayProvider {
    Stripe,
    Mock,
}

impl FromStr for GatewayProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stripe" => Ok(GatewayProvider::Stripe),
            "mock" => Ok(GatewayProvider::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "unknown payment gateway '{}', expected 'stripe' or 'mock'",
                other
            ))),
        }
    }
}

/// Stripe credentials and defaults, handed to the client at construction.
#[derive(Deserialize, Clone, Debug)]
pub struct StripeConfig {
    pub secret_key: Secret<String>,
    pub api_base_url: String,
    /// ISO currency code every intent is created in.
    pub currency: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = is_production();

        let db_url = get_env("PAYMENT_DATABASE_URL", None, is_prod)?;
        let db_name = get_env("PAYMENT_DATABASE_NAME", Some("payment_service"), is_prod)?;

        let provider = get_env("PAYMENT_GATEWAY", Some("stripe"), is_prod)?.parse()?;
        let secret_key = get_env("STRIPE_SECRET_KEY", Some(""), is_prod)?;
        let api_base_url = get_env(
            "STRIPE_API_BASE_URL",
            Some("https://api.stripe.com/v1"),
            false,
        )?;
        let currency = get_env("STRIPE_CURRENCY", Some("usd"), false)?.to_lowercase();
        let timeout_secs = get_env("STRIPE_TIMEOUT_SECS", Some("30"), false)?
            .parse()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("STRIPE_TIMEOUT_SECS is invalid: {}", e))
            })?;

        Ok(Self {
            common,
            database: DatabaseConfig {
                url: Secret::new(db_url),
                db_name,
            },
            gateway: GatewayConfig {
                provider,
                stripe: StripeConfig {
                    secret_key: Secret::new(secret_key),
                    api_base_url,
                    currency,
                    timeout_secs,
                },
            },
            service_name: "payment-service".to_string(),
        })
    }
}
