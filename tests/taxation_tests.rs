use chrono::NaiveDate;
use fakturacia::core::InvoicingError;
use fakturacia::taxation::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Registry stub with a canned answer.
struct StubRegistry(Result<bool, ()>);

impl VatRegistry for StubRegistry {
    fn is_registered(&self, _vat_id: &str) -> Result<bool, RegistryError> {
        self.0
            .map_err(|_| RegistryError::Unavailable("connection timed out".into()))
    }
}

fn parties<'a>(
    supplier_vat: Option<&'a str>,
    supplier_country: Option<&'a str>,
    customer_vat: Option<&'a str>,
    customer_country: Option<&'a str>,
    tax_point: NaiveDate,
) -> TaxParties<'a> {
    TaxParties {
        supplier_vat_id: supplier_vat,
        supplier_country,
        customer_vat_id: customer_vat,
        customer_country,
        delivery_country: None,
        tax_point_date: tax_point,
    }
}

fn policy_with(registry: StubRegistry) -> EuTaxationPolicy {
    EuTaxationPolicy::new(TaxConfig::default()).with_registry(Box::new(registry))
}

// --- Supplier prerequisites ---

#[test]
fn supplier_without_vat_id_charges_no_vat() {
    let policy = policy_with(StubRegistry(Ok(true)));
    let p = parties(None, Some("SK"), None, Some("SK"), date(2024, 6, 1));
    assert_eq!(policy.tax_rate(&p).unwrap(), None);

    let blank = parties(Some("  "), Some("SK"), None, Some("SK"), date(2024, 6, 1));
    assert_eq!(policy.tax_rate(&blank).unwrap(), None);
}

#[test]
fn non_eu_supplier_country_is_a_config_error() {
    let policy = policy_with(StubRegistry(Ok(true)));
    let p = parties(Some("GB123"), Some("GB"), None, Some("DE"), date(2024, 6, 1));
    assert!(matches!(policy.tax_rate(&p), Err(InvoicingError::Config(_))));
}

#[test]
fn missing_supplier_country_without_fallback_is_a_config_error() {
    let policy = policy_with(StubRegistry(Ok(true)));
    let p = parties(Some("SK2020000001"), None, None, Some("SK"), date(2024, 6, 1));
    assert!(matches!(policy.tax_rate(&p), Err(InvoicingError::Config(_))));
}

#[test]
fn configured_supplier_country_fallback_applies() {
    let policy = EuTaxationPolicy::new(TaxConfig {
        supplier_country: Some("SK".into()),
        use_vies: false,
        ..TaxConfig::default()
    });
    let p = parties(Some("SK2020000001"), None, None, Some("SK"), date(2024, 6, 1));
    assert_eq!(policy.tax_rate(&p).unwrap(), Some(dec!(20)));
}

// --- Same-country supplies ---

#[test]
fn same_country_never_reverse_charges() {
    // Both VAT-registered, same country, registry would even say "registered"
    let policy = policy_with(StubRegistry(Ok(true)));
    let p = parties(
        Some("SK2020000001"),
        Some("SK"),
        Some("SK7020000002"),
        Some("SK"),
        date(2024, 6, 1),
    );
    assert_eq!(policy.tax_rate(&p).unwrap(), Some(dec!(20)));
}

#[test]
fn same_country_standard_rate_tracks_tax_point_date() {
    let policy = policy_with(StubRegistry(Ok(true)));
    let pre = parties(
        Some("SK2020000001"),
        Some("SK"),
        None,
        Some("SK"),
        date(2024, 12, 31),
    );
    let post = parties(
        Some("SK2020000001"),
        Some("SK"),
        None,
        Some("SK"),
        date(2025, 1, 1),
    );
    assert_eq!(policy.tax_rate(&pre).unwrap(), Some(dec!(20)));
    assert_eq!(policy.tax_rate(&post).unwrap(), Some(dec!(23)));
}

// --- Cross-border supplies ---

#[test]
fn cross_border_registered_customer_reverse_charges() {
    let policy = policy_with(StubRegistry(Ok(true)));
    let p = parties(
        Some("SK2020000001"),
        Some("SK"),
        Some("CZ12345678"),
        Some("CZ"),
        date(2024, 6, 1),
    );
    assert_eq!(policy.tax_rate(&p).unwrap(), None);
}

#[test]
fn cross_border_unregistered_customer_gets_standard_rate() {
    let policy = policy_with(StubRegistry(Ok(false)));
    let p = parties(
        Some("SK2020000001"),
        Some("SK"),
        Some("CZ12345678"),
        Some("CZ"),
        date(2024, 6, 1),
    );
    assert_eq!(policy.tax_rate(&p).unwrap(), Some(dec!(20)));
}

#[test]
fn cross_border_private_customer_gets_standard_rate() {
    let policy = policy_with(StubRegistry(Ok(true)));
    let p = parties(
        Some("SK2020000001"),
        Some("SK"),
        None, // no customer VAT id = private person
        Some("CZ"),
        date(2024, 6, 1),
    );
    assert_eq!(policy.tax_rate(&p).unwrap(), Some(dec!(20)));
}

#[test]
fn delivery_country_overrides_customer_country() {
    let policy = policy_with(StubRegistry(Ok(true)));
    // Customer is foreign but goods are delivered domestically:
    // place of supply equals supplier country → no reverse charge
    let p = TaxParties {
        supplier_vat_id: Some("SK2020000001"),
        supplier_country: Some("SK"),
        customer_vat_id: Some("CZ12345678"),
        customer_country: Some("CZ"),
        delivery_country: Some("SK"),
        tax_point_date: date(2024, 6, 1),
    };
    assert_eq!(policy.tax_rate(&p).unwrap(), Some(dec!(20)));
}

#[test]
fn vies_disabled_falls_back_to_standard_rate() {
    let policy = EuTaxationPolicy::new(TaxConfig {
        use_vies: false,
        ..TaxConfig::default()
    });
    let p = parties(
        Some("SK2020000001"),
        Some("SK"),
        Some("CZ12345678"),
        Some("CZ"),
        date(2024, 6, 1),
    );
    // Reverse charge is not granted without validation
    assert_eq!(policy.tax_rate(&p).unwrap(), Some(dec!(20)));
}

#[test]
fn vies_enabled_without_registry_is_a_config_error() {
    let policy = EuTaxationPolicy::new(TaxConfig::default());
    let p = parties(
        Some("SK2020000001"),
        Some("SK"),
        Some("CZ12345678"),
        Some("CZ"),
        date(2024, 6, 1),
    );
    assert!(matches!(policy.tax_rate(&p), Err(InvoicingError::Config(_))));
}

// --- Registry failure policy ---

#[test]
fn unreachable_registry_defaults_to_standard_rate() {
    let policy = policy_with(StubRegistry(Err(())));
    let p = parties(
        Some("SK2020000001"),
        Some("SK"),
        Some("CZ12345678"),
        Some("CZ"),
        date(2024, 6, 1),
    );
    // Prefer over-charging VAT to invoicing without tax
    assert_eq!(policy.tax_rate(&p).unwrap(), Some(dec!(20)));
}

#[test]
fn unreachable_registry_can_be_configured_to_error() {
    let policy = EuTaxationPolicy::new(TaxConfig {
        vies_fallback: ViesFallback::Error,
        ..TaxConfig::default()
    })
    .with_registry(Box::new(StubRegistry(Err(()))));
    let p = parties(
        Some("SK2020000001"),
        Some("SK"),
        Some("CZ12345678"),
        Some("CZ"),
        date(2024, 6, 1),
    );
    assert!(matches!(
        policy.tax_rate(&p),
        Err(InvoicingError::Taxation(_))
    ));
}

// --- Default rate override ---

#[test]
fn configured_default_rate_wins_over_country_table() {
    let policy = EuTaxationPolicy::new(TaxConfig {
        default_rate: Some(dec!(15)),
        use_vies: false,
        ..TaxConfig::default()
    });
    let p = parties(
        Some("SK2020000001"),
        Some("SK"),
        None,
        Some("SK"),
        date(2024, 6, 1),
    );
    assert_eq!(policy.tax_rate(&p).unwrap(), Some(dec!(15)));
}

// --- Rate table ---

#[test]
fn all_eu_rates_are_positive_percentages() {
    for code in [
        "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "ES", "FI", "FR", "GR", "HR", "HU", "IE",
        "IT", "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK",
    ] {
        assert!(is_in_eu(code), "{code} missing from the rate table");
        let rate = standard_rate(code, date(2024, 6, 1)).unwrap();
        assert!(rate > Decimal::ZERO && rate < dec!(30), "{code}: {rate}");
    }
}

#[test]
fn brexit() {
    assert!(!is_in_eu("GB"));
}
