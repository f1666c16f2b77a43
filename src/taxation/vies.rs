//! Blocking client for the EU VIES REST API.
//!
//! VIES is a free public registry with no authentication. The call is
//! network I/O on the caller's thread, bounded by a timeout; an
//! unreachable registry surfaces as [`RegistryError::Unavailable`] and the
//! policy's configured fallback decides what that means for the invoice.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::eu::is_in_eu;
use super::{RegistryError, VatRegistry};

const VIES_URL: &str = "https://ec.europa.eu/taxation_customs/vies/rest-api/check-vat-number";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a VIES VAT number check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViesResult {
    /// Whether the VAT number is currently valid.
    pub valid: bool,
    /// Date of the request (YYYY-MM-DD).
    pub request_date: Option<String>,
    /// Registered company name (if available).
    pub name: Option<String>,
    /// Registered address (if available).
    pub address: Option<String>,
}

/// VIES API response structure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViesApiResponse {
    valid: Option<bool>,
    request_date: Option<String>,
    name: Option<String>,
    address: Option<String>,
    // Error fields
    error_wrappers: Option<Vec<ViesErrorWrapper>>,
}

#[derive(Debug, Deserialize)]
struct ViesErrorWrapper {
    error: Option<String>,
    message: Option<String>,
}

/// VIES API request body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViesRequest {
    country_code: String,
    vat_number: String,
}

/// Timeout-bounded VIES client implementing [`VatRegistry`].
#[derive(Debug, Clone)]
pub struct ViesClient {
    endpoint: String,
    timeout: Duration,
}

impl Default for ViesClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ViesClient {
    pub fn new() -> Self {
        Self {
            endpoint: VIES_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Point the client at a different endpoint (tests, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Check a VAT number against VIES.
    ///
    /// `country_code` is the 2-letter ISO code, `vat_number` the number
    /// part without the country prefix.
    pub fn check(&self, country_code: &str, vat_number: &str) -> Result<ViesResult, RegistryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;

        let request = ViesRequest {
            country_code: country_code.to_uppercase(),
            vat_number: vat_number.to_string(),
        };

        let response = client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;

        if !status.is_success() {
            return Err(RegistryError::Unavailable(format!("HTTP {status}: {body}")));
        }

        let api_response: ViesApiResponse = serde_json::from_str(&body)
            .map_err(|e: serde_json::Error| RegistryError::Protocol(e.to_string()))?;

        // API-level errors (e.g. member state unavailable)
        if let Some(errors) = &api_response.error_wrappers {
            if let Some(err) = errors.first() {
                let message = err
                    .message
                    .clone()
                    .or_else(|| err.error.clone())
                    .unwrap_or_else(|| "unknown error".into());
                return Err(RegistryError::Unavailable(message));
            }
        }

        Ok(ViesResult {
            valid: api_response.valid.unwrap_or(false),
            request_date: api_response.request_date,
            name: api_response.name.filter(|n| n != "---" && !n.is_empty()),
            address: api_response
                .address
                .filter(|a| a != "---" && !a.is_empty()),
        })
    }
}

impl VatRegistry for ViesClient {
    fn is_registered(&self, vat_id: &str) -> Result<bool, RegistryError> {
        let vat_id = vat_id.trim();
        let country: String = vat_id.chars().take(2).collect();
        let number: String = vat_id.chars().skip(2).collect();

        if country.len() < 2 || number.is_empty() {
            return Err(RegistryError::Protocol(format!(
                "VAT id '{vat_id}' is too short to carry a country prefix"
            )));
        }
        if !is_in_eu(&country) {
            return Err(RegistryError::UnsupportedCountry(country));
        }

        Ok(self.check(&country, &number)?.valid)
    }
}
