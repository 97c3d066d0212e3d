use crate::name_parser::{CompanyNameGrammar, DEFAULT_DELIMITER};
use crate::validation::is_valid_email;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_QBO_BASE_URL: &str = "https://quickbooks.api.intuit.com";
const DEFAULT_QBO_MINOR_VERSION: u32 = 65;
const DEFAULT_CACHE_TTL_SECS: u64 = 43_200;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Shared secret expected in the `X-Admin-Token` header.
    pub admin_token: String,
    pub qbo_base_url: String,
    pub qbo_realm_id: String,
    pub qbo_access_token: String,
    pub qbo_minor_version: u32,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from_name: String,
    pub mail_from_address: String,
    /// Lifetime of the cached QBO customer list.
    pub customer_cache_ttl_secs: u64,
    /// Separator between program, team and student in QBO company names.
    pub company_name_delimiter: String,
}

fn required(name: &str) -> anyhow::Result<String> {
    let value = std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))?;
    if value.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    Ok(value)
}

fn http_url(name: &str, value: String) -> anyhow::Result<String> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(value)
}

/// `scheme://host[:port]/db` with user, password and query removed.
fn redact_database_url(url: &str) -> String {
    let (scheme, rest) = url.split_once("://").unwrap_or(("", url));
    let rest = rest.rsplit_once('@').map_or(rest, |(_, tail)| tail);
    let host_and_db = rest.split(['?', '#']).next().unwrap_or_default();
    let (host, db) = host_and_db.split_once('/').unwrap_or((host_and_db, ""));
    format!("{}://{}/{}", scheme, host, db)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            admin_token: required("ADMIN_TOKEN")?,
            qbo_base_url: std::env::var("QBO_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| http_url("QBO_BASE_URL", url))
                .transpose()?
                .unwrap_or_else(|| DEFAULT_QBO_BASE_URL.to_string()),
            qbo_realm_id: required("QBO_REALM_ID")?,
            qbo_access_token: required("QBO_ACCESS_TOKEN")?,
            qbo_minor_version: match std::env::var("QBO_MINOR_VERSION") {
                Ok(raw) => raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| anyhow::anyhow!("QBO_MINOR_VERSION must be a number"))?,
                Err(_) => DEFAULT_QBO_MINOR_VERSION,
            },
            mail_api_url: required("MAIL_API_URL")
                .and_then(|url| http_url("MAIL_API_URL", url))?,
            mail_api_key: required("MAIL_API_KEY")?,
            mail_from_name: std::env::var("MAIL_FROM_NAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "GEARS Dashboard".to_string()),
            mail_from_address: required("MAIL_FROM_ADDRESS").and_then(|address| {
                if !is_valid_email(&address) {
                    anyhow::bail!("MAIL_FROM_ADDRESS must be a valid email address");
                }
                Ok(address)
            })?,
            customer_cache_ttl_secs: match std::env::var("CUSTOMER_CACHE_TTL_SECS") {
                Ok(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| {
                        anyhow::anyhow!("CUSTOMER_CACHE_TTL_SECS must be a positive number")
                    })?,
                Err(_) => DEFAULT_CACHE_TTL_SECS,
            },
            company_name_delimiter: std::env::var("COMPANY_NAME_DELIMITER")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_DELIMITER.to_string()),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Database: {}", redact_database_url(&config.database_url));
        tracing::debug!("QBO Base URL: {} (realm {})", config.qbo_base_url, config.qbo_realm_id);
        tracing::debug!("Mail API URL: {}", config.mail_api_url);
        tracing::debug!("Customer cache TTL: {}s", config.customer_cache_ttl_secs);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    pub fn customer_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.customer_cache_ttl_secs)
    }

    pub fn company_name_grammar(&self) -> CompanyNameGrammar {
        CompanyNameGrammar::new(self.company_name_delimiter.clone())
    }
}
