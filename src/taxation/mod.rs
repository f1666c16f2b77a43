//! Tax-rate resolution policies.
//!
//! A [`TaxationPolicy`] decides which VAT rate an invoice line carries by
//! default: `Some(rate)` to levy tax (including `Some(0)` for zero-rated
//! supplies), or `None` when no tax applies — reverse charge or exemption.
//!
//! External VAT-registry validation (VIES) goes through the [`VatRegistry`]
//! trait so it can be stubbed in tests; a blocking HTTP client lives behind
//! the `vies` feature.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use fakturacia::taxation::*;
//! use rust_decimal_macros::dec;
//!
//! let policy = EuTaxationPolicy::new(TaxConfig {
//!     use_vies: false,
//!     ..TaxConfig::default()
//! });
//!
//! let parties = TaxParties {
//!     supplier_vat_id: Some("SK2020000001"),
//!     supplier_country: Some("SK"),
//!     customer_vat_id: None,
//!     customer_country: Some("SK"),
//!     delivery_country: None,
//!     tax_point_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
//! };
//! assert_eq!(policy.tax_rate(&parties).unwrap(), Some(dec!(20)));
//! ```

mod eu;
#[cfg(feature = "vies")]
mod vies;

pub use eu::{
    CountryVat, EuTaxationPolicy, RatePeriod, TaxConfig, ViesFallback, country_vat, is_in_eu,
    standard_rate,
};
#[cfg(feature = "vies")]
pub use vies::{ViesClient, ViesResult};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::core::InvoicingError;

/// Party data a taxation policy resolves a rate from.
///
/// Country codes are ISO 3166-1 alpha-2; VAT ids include the country
/// prefix. `delivery_country` overrides the customer country as the place
/// of supply when goods ship elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct TaxParties<'a> {
    pub supplier_vat_id: Option<&'a str>,
    pub supplier_country: Option<&'a str>,
    pub customer_vat_id: Option<&'a str>,
    pub customer_country: Option<&'a str>,
    pub delivery_country: Option<&'a str>,
    /// Time of supply; selects the applicable-as-of-date rate.
    pub tax_point_date: NaiveDate,
}

/// Contract every jurisdiction-specific rate resolver implements.
pub trait TaxationPolicy {
    /// Resolve the default tax rate for an invoice line.
    ///
    /// Returns `Some(percent)` (possibly zero) to apply, or `None` when
    /// tax is not applicable / reverse charged. Configuration problems
    /// (e.g. a supplier country the policy cannot handle) are errors.
    fn tax_rate(&self, parties: &TaxParties<'_>) -> Result<Option<Decimal>, InvoicingError>;

    /// The jurisdiction's standard rate for a country as of a date.
    fn default_rate(
        &self,
        country_code: Option<&str>,
        tax_point_date: NaiveDate,
    ) -> Result<Option<Decimal>, InvoicingError>;
}

/// Error from an external VAT registry lookup.
///
/// `Unavailable` (network, timeout, member state down) is kept separate
/// from a definite "not registered" answer; the policy configuration
/// decides how to resolve it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// The registry could not be reached or did not answer in time.
    #[error("VAT registry unavailable: {0}")]
    Unavailable(String),

    /// The registry answered with something unparseable.
    #[error("VAT registry protocol error: {0}")]
    Protocol(String),

    /// The VAT id's country prefix is outside the registry's coverage.
    #[error("country '{0}' is not covered by the VAT registry")]
    UnsupportedCountry(String),
}

/// External VAT-number validation capability (VIES or a stand-in).
pub trait VatRegistry {
    /// Whether the VAT id is registered for intra-EU trade.
    fn is_registered(&self, vat_id: &str) -> Result<bool, RegistryError>;
}

/// Trivial policy applying one configured flat rate to everything;
/// the "single tax rate, no jurisdiction logic" deployment.
#[derive(Debug, Clone)]
pub struct FlatRatePolicy {
    rate: Decimal,
}

impl FlatRatePolicy {
    pub fn new(rate: Decimal) -> Self {
        Self { rate }
    }
}

impl TaxationPolicy for FlatRatePolicy {
    fn tax_rate(&self, _parties: &TaxParties<'_>) -> Result<Option<Decimal>, InvoicingError> {
        Ok(Some(self.rate))
    }

    fn default_rate(
        &self,
        _country_code: Option<&str>,
        _tax_point_date: NaiveDate,
    ) -> Result<Option<Decimal>, InvoicingError> {
        Ok(Some(self.rate))
    }
}

/// Treat empty and whitespace-only values as absent.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
