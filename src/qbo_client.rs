use crate::config::Config;
use crate::directory::CustomerSource;
use crate::errors::AppError;
use crate::models::{Customer, Invoice};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Rows requested per QBO query page (the API maximum).
const PAGE_SIZE: usize = 1000;
/// Upper bound on pages fetched in one listing.
const MAX_PAGES: usize = 100;

/// Client for the QuickBooks Online accounting REST API.
#[derive(Clone)]
pub struct QboClient {
    client: reqwest::Client,
    base_url: String,
    realm_id: String,
    access_token: String,
    minor_version: u32,
}

impl QboClient {
    /// Creates a new `QboClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API host, e.g. `https://quickbooks.api.intuit.com`.
    /// * `realm_id` - QBO company id.
    /// * `access_token` - OAuth bearer token.
    /// * `minor_version` - API minor version sent with every request.
    pub fn new(
        base_url: String,
        realm_id: String,
        access_token: String,
        minor_version: u32,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create QBO client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            realm_id,
            access_token,
            minor_version,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.qbo_base_url.clone(),
            config.qbo_realm_id.clone(),
            config.qbo_access_token.clone(),
            config.qbo_minor_version,
        )
    }

    fn company_url(&self, path: &str) -> String {
        format!("{}/v3/company/{}/{}", self.base_url, self.realm_id, path)
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, AppError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("minorversion", self.minor_version.to_string())])
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("QBO request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "QBO returned {}: {}",
                status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse QBO response: {}", e))
        })
    }

    /// Runs one query statement and returns the rows for `entity`.
    async fn query_page<T: DeserializeOwned>(
        &self,
        entity: &str,
        statement: String,
    ) -> Result<Vec<T>, AppError> {
        let url = self.company_url("query");
        tracing::debug!("QBO query: {}", statement);

        let data = self.get_json(&url, &[("query", statement)]).await?;

        let rows = data
            .get("QueryResponse")
            .and_then(|r| r.get(entity))
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));

        serde_json::from_value(rows).map_err(|e| {
            AppError::ExternalApiError(format!("Unexpected QBO {} payload: {}", entity, e))
        })
    }

    /// Pages through `select * from {entity}` until a short page comes back.
    async fn query_all<T: DeserializeOwned>(
        &self,
        entity: &str,
        filter: Option<&str>,
    ) -> Result<Vec<T>, AppError> {
        let mut all = Vec::new();

        for page in 0..MAX_PAGES {
            let start = page * PAGE_SIZE + 1;
            let statement = match filter {
                Some(clause) => format!(
                    "select * from {} where {} STARTPOSITION {} MAXRESULTS {}",
                    entity, clause, start, PAGE_SIZE
                ),
                None => format!(
                    "select * from {} STARTPOSITION {} MAXRESULTS {}",
                    entity, start, PAGE_SIZE
                ),
            };

            let rows: Vec<T> = self.query_page(entity, statement).await?;
            let fetched = rows.len();
            all.extend(rows);

            if fetched < PAGE_SIZE {
                return Ok(all);
            }
        }

        tracing::warn!(
            "QBO {} listing stopped after {} pages ({} rows)",
            entity,
            MAX_PAGES,
            all.len()
        );
        Ok(all)
    }

    /// Fetches every customer, with `Name` filled in.
    pub async fn fetch_all_customers(&self) -> Result<Vec<Customer>, AppError> {
        tracing::info!("Fetching customer list from QBO (realm {})", self.realm_id);

        let customers: Vec<Customer> = self.query_all("Customer", None).await?;
        let customers: Vec<Customer> = customers
            .into_iter()
            .map(Customer::with_canonical_name)
            .collect();

        tracing::info!("✓ Fetched {} customers from QBO", customers.len());
        Ok(customers)
    }

    /// Fetches a single customer by id.
    pub async fn get_customer(&self, id: &str) -> Result<Customer, AppError> {
        let id = validate_entity_id(id)?;
        let url = self.company_url(&format!("customer/{}", id));
        tracing::info!("Fetching customer {} from QBO", id);

        let data = self.get_json(&url, &[]).await?;
        let customer = data
            .get("Customer")
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("QBO customer {} not found", id)))?;

        let customer: Customer = serde_json::from_value(customer).map_err(|e| {
            AppError::ExternalApiError(format!("Unexpected QBO customer payload: {}", e))
        })?;

        Ok(customer.with_canonical_name())
    }

    /// Fetches invoices, optionally only those billed to `customer_id`.
    pub async fn fetch_invoices(
        &self,
        customer_id: Option<&str>,
    ) -> Result<Vec<Invoice>, AppError> {
        let filter = match customer_id {
            Some(id) => Some(format!("CustomerRef = '{}'", validate_entity_id(id)?)),
            None => None,
        };

        let invoices: Vec<Invoice> = self.query_all("Invoice", filter.as_deref()).await?;
        tracing::info!("✓ Fetched {} invoices from QBO", invoices.len());
        Ok(invoices)
    }
}

#[async_trait]
impl CustomerSource for QboClient {
    async fn fetch_customers(&self) -> Result<Vec<Customer>, AppError> {
        self.fetch_all_customers().await
    }
}

/// QBO entity ids are numeric. Anything else is rejected before it reaches a
/// query string.
fn validate_entity_id(id: &str) -> Result<&str, AppError> {
    let id = id.trim();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest(format!("Invalid QBO id: {}", id)));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = QboClient::new(
            "https://example.com/".to_string(),
            "123".to_string(),
            "token".to_string(),
            65,
        )
        .unwrap();
        assert_eq!(
            client.company_url("query"),
            "https://example.com/v3/company/123/query"
        );
    }

    #[test]
    fn test_entity_id_validation() {
        assert_eq!(validate_entity_id(" 42 ").unwrap(), "42");
        assert!(validate_entity_id("").is_err());
        assert!(validate_entity_id("1' or '1'='1").is_err());
    }
}
