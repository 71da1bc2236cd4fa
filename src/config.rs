use std::env;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::contract::ContractVersion;

const DEFAULT_API_URL: &str = "https://api.zipnova.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 7;

/// Fixed shipping origin. Callers never supply it.
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub zip_code: String,
    pub city: String,
    pub province: String,
}

impl Default for Origin {
    fn default() -> Self {
        Self {
            name: "Cervecería Premium".to_string(),
            phone: "5491112345678".to_string(),
            address: "Calle 71 335".to_string(),
            zip_code: "1900".to_string(),
            city: "La Plata".to_string(),
            province: "Buenos Aires".to_string(),
        }
    }
}

/// Function configuration, resolved once per invocation at the runtime boundary.
#[derive(Debug, Clone)]
pub struct Config {
    pub origin: Origin,
    pub api_url: String,
    pub api_key: String,
    pub account_id: String,
    pub contract: ContractVersion,
    pub timeout: Duration,
    /// Number the order summary link points at. No link is built when unset.
    pub whatsapp_number: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: Origin::default(),
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            account_id: String::new(),
            contract: ContractVersion::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            whatsapp_number: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first when present.
    ///
    /// # Environment Variables
    /// - `ZIPNOVA_API_KEY`: bearer token for the carrier API
    /// - `ZIPNOVA_ACCOUNT_ID`: sent as `X-Account-Id`
    /// - `ZIPNOVA_API_URL`: base URL (default "https://api.zipnova.com/v1")
    /// - `ZIPNOVA_CONTRACT`: carrier contract version (default "v1")
    /// - `ZIPNOVA_TIMEOUT_SECS`: per-call timeout (default 7)
    /// - `BREWERY_NAME`, `BREWERY_PHONE`, `BREWERY_ADDRESS`, `BREWERY_ZIPCODE`,
    ///   `BREWERY_CITY`, `BREWERY_PROVINCE`: shipping origin
    /// - `WHATSAPP_NUMBER`: optional order notification number
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Config::default();
        let origin = defaults.origin;

        let contract = match read("ZIPNOVA_CONTRACT") {
            Some(raw) => raw
                .parse::<ContractVersion>()
                .context("ZIPNOVA_CONTRACT is not a known contract version")?,
            None => defaults.contract,
        };

        let timeout = match read("ZIPNOVA_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("ZIPNOVA_TIMEOUT_SECS is not a number: {raw}"))?;
                if secs == 0 {
                    bail!("ZIPNOVA_TIMEOUT_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => defaults.timeout,
        };

        Ok(Config {
            origin: Origin {
                name: read("BREWERY_NAME").unwrap_or(origin.name),
                phone: read("BREWERY_PHONE").unwrap_or(origin.phone),
                address: read("BREWERY_ADDRESS").unwrap_or(origin.address),
                zip_code: read("BREWERY_ZIPCODE").unwrap_or(origin.zip_code),
                city: read("BREWERY_CITY").unwrap_or(origin.city),
                province: read("BREWERY_PROVINCE").unwrap_or(origin.province),
            },
            api_url: read("ZIPNOVA_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            api_key: read("ZIPNOVA_API_KEY").unwrap_or_default(),
            account_id: read("ZIPNOVA_ACCOUNT_ID").unwrap_or_default(),
            contract,
            timeout,
            whatsapp_number: read("WHATSAPP_NUMBER"),
        })
    }
}
