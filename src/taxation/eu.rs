//! EU VAT rate table and taxation policy.
//!
//! Rules, in order:
//! * a supplier without a VAT id charges no VAT (`None`),
//! * a supplier country outside the EU is a configuration error,
//! * cross-border supplies between two VAT-registered parties reverse
//!   charge when the customer's VAT id checks out against the registry,
//! * everything else gets the supplier country's standard rate as of the
//!   invoice's tax point date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::core::InvoicingError;

use super::{RegistryError, TaxParties, TaxationPolicy, VatRegistry, present};

/// A date-bounded standard rate; open bounds are unbounded ends.
/// Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatePeriod {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub rate: Decimal,
}

/// A country's standard-rate entry: flat, or a list of date-bounded
/// periods where a rate change is modeled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountryVat {
    Flat(Decimal),
    Periods(Vec<RatePeriod>),
}

/// Standard VAT rate entry per EU member state.
pub fn country_vat(country_code: &str) -> Option<CountryVat> {
    let flat = |rate: Decimal| Some(CountryVat::Flat(rate));
    match country_code.to_ascii_uppercase().as_str() {
        "AT" => flat(dec!(20)), // Austria
        "BE" => flat(dec!(21)), // Belgium
        "BG" => flat(dec!(20)), // Bulgaria
        "CY" => flat(dec!(19)), // Cyprus
        "CZ" => flat(dec!(21)), // Czech Republic
        "DE" => flat(dec!(19)), // Germany
        "DK" => flat(dec!(25)), // Denmark
        "EE" => flat(dec!(22)), // Estonia
        "ES" => flat(dec!(21)), // Spain
        "FI" => flat(dec!(24)), // Finland
        "FR" => flat(dec!(20)), // France
        "GR" => flat(dec!(24)), // Greece
        "HR" => flat(dec!(25)), // Croatia
        "HU" => flat(dec!(27)), // Hungary
        "IE" => flat(dec!(23)), // Ireland
        "IT" => flat(dec!(22)), // Italy
        "LT" => flat(dec!(21)), // Lithuania
        "LU" => flat(dec!(17)), // Luxembourg
        "LV" => flat(dec!(21)), // Latvia
        "MT" => flat(dec!(18)), // Malta
        "NL" => flat(dec!(21)), // Netherlands
        "PL" => flat(dec!(23)), // Poland
        "PT" => flat(dec!(23)), // Portugal
        "RO" => flat(dec!(19)), // Romania
        "SE" => flat(dec!(25)), // Sweden
        "SI" => flat(dec!(22)), // Slovenia
        // Slovakia: 20% through 2024, 23% from 2025
        "SK" => Some(CountryVat::Periods(vec![
            RatePeriod {
                from: None,
                to: NaiveDate::from_ymd_opt(2024, 12, 31),
                rate: dec!(20),
            },
            RatePeriod {
                from: NaiveDate::from_ymd_opt(2025, 1, 1),
                to: None,
                rate: dec!(23),
            },
        ])),
        // GB left the EU on 2020-02-01
        _ => None,
    }
}

/// Membership test against the rate table; no partial matches.
pub fn is_in_eu(country_code: &str) -> bool {
    country_vat(country_code).is_some()
}

/// The standard rate for a country as of a date.
///
/// A country missing from the table, or a covered country with no period
/// matching the date, is an error: correctly configured tables are
/// exhaustive.
pub fn standard_rate(country_code: &str, tax_point_date: NaiveDate) -> Result<Decimal, InvoicingError> {
    match country_vat(country_code) {
        Some(CountryVat::Flat(rate)) => Ok(rate),
        Some(CountryVat::Periods(periods)) => {
            for period in &periods {
                let from_ok = period.from.is_none_or(|from| from <= tax_point_date);
                let to_ok = period.to.is_none_or(|to| tax_point_date <= to);
                if from_ok && to_ok {
                    return Ok(period.rate);
                }
            }
            Err(InvoicingError::Taxation(format!(
                "no VAT rate for country '{country_code}' on {tax_point_date}"
            )))
        }
        None => Err(InvoicingError::Taxation(format!(
            "no VAT rate table entry for country '{country_code}'"
        ))),
    }
}

/// How a registry failure (unreachable, timeout) resolves.
///
/// The safe business default is to fall back to the standard rate:
/// prefer over-charging VAT to silently invoicing without tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViesFallback {
    /// Treat the customer as not registered and apply the standard rate.
    #[default]
    StandardRate,
    /// Surface the failure as an error instead of deciding.
    Error,
}

/// Configuration for [`EuTaxationPolicy`], passed in explicitly.
#[derive(Debug, Clone)]
pub struct TaxConfig {
    /// Fallback when the invoice carries no supplier country.
    pub supplier_country: Option<String>,
    /// Flat rate override; when set it wins over the country table.
    pub default_rate: Option<Decimal>,
    /// Whether reverse charge requires a registry check of the customer
    /// VAT id. When disabled, the standard rate applies to cross-border
    /// supplies as well.
    pub use_vies: bool,
    /// What an unreachable registry resolves to.
    pub vies_fallback: ViesFallback,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            supplier_country: None,
            default_rate: None,
            use_vies: true,
            vies_fallback: ViesFallback::default(),
        }
    }
}

/// Tax-rate resolver for EU supplier jurisdictions.
pub struct EuTaxationPolicy {
    config: TaxConfig,
    registry: Option<Box<dyn VatRegistry>>,
}

impl EuTaxationPolicy {
    pub fn new(config: TaxConfig) -> Self {
        Self {
            config,
            registry: None,
        }
    }

    /// Attach the VAT registry used for reverse-charge validation.
    pub fn with_registry(mut self, registry: Box<dyn VatRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Reverse-charge eligibility: both parties VAT-registered and the
    /// place of supply (delivery country, else customer country) differs
    /// from the supplier country. Same-country transactions never
    /// reverse charge.
    pub fn is_reverse_charge(&self, parties: &TaxParties<'_>, supplier_country: &str) -> bool {
        if present(parties.supplier_vat_id).is_none() {
            return false;
        }
        if present(parties.customer_vat_id).is_none() {
            return false;
        }
        let Some(place_of_supply) =
            present(parties.delivery_country).or(present(parties.customer_country))
        else {
            return false;
        };
        !supplier_country.eq_ignore_ascii_case(place_of_supply)
    }
}

impl TaxationPolicy for EuTaxationPolicy {
    fn tax_rate(&self, parties: &TaxParties<'_>) -> Result<Option<Decimal>, InvoicingError> {
        // Supplier is not a VAT payer
        if present(parties.supplier_vat_id).is_none() {
            return Ok(None);
        }

        let supplier_country = present(parties.supplier_country)
            .or(self.config.supplier_country.as_deref())
            .ok_or_else(|| {
                InvoicingError::Config(
                    "supplier country is not set and no fallback is configured".into(),
                )
            })?;

        if !is_in_eu(supplier_country) {
            return Err(InvoicingError::Config(format!(
                "EU taxation policy requires an EU supplier country, got '{supplier_country}'"
            )));
        }

        if self.is_reverse_charge(parties, supplier_country) && self.config.use_vies {
            let registry = self.registry.as_deref().ok_or_else(|| {
                InvoicingError::Config(
                    "VIES validation is enabled but no VAT registry is configured".into(),
                )
            })?;
            // is_reverse_charge guarantees the customer VAT id is present
            let customer_vat_id = present(parties.customer_vat_id).unwrap_or_default();

            match registry.is_registered(customer_vat_id) {
                // Registered in VIES → charge back, no VAT levied here
                Ok(true) => return Ok(None),
                // Not registered → standard rate
                Ok(false) => {}
                Err(RegistryError::UnsupportedCountry(_)) => {}
                Err(err) => match self.config.vies_fallback {
                    ViesFallback::StandardRate => {}
                    ViesFallback::Error => {
                        return Err(InvoicingError::Taxation(format!(
                            "VIES check of '{customer_vat_id}' failed: {err}"
                        )));
                    }
                },
            }
        }

        self.default_rate(Some(supplier_country), parties.tax_point_date)
    }

    fn default_rate(
        &self,
        country_code: Option<&str>,
        tax_point_date: NaiveDate,
    ) -> Result<Option<Decimal>, InvoicingError> {
        if let Some(rate) = self.config.default_rate {
            return Ok(Some(rate));
        }
        match country_code {
            Some(code) => standard_rate(code, tax_point_date).map(Some),
            None => Ok(None),
        }
    }
}
