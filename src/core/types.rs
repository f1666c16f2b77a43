use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceType {
    /// Regular commercial invoice.
    Invoice,
    /// Advance invoice (issued before supply).
    Advance,
    /// Proforma invoice (not a tax document).
    Proforma,
    /// Credit note referencing an earlier invoice.
    CreditNote,
}

impl InvoiceType {
    /// Short code usable in formatted invoice numbers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invoice => "INV",
            Self::Advance => "ADV",
            Self::Proforma => "PRO",
            Self::CreditNote => "CRN",
        }
    }
}

/// Invoice lifecycle status.
///
/// Invoices are never physically deleted in normal operation; the soft
/// states `Canceled`/`Credited`/`Uncollectible` supersede deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    New,
    Sent,
    Returned,
    Canceled,
    Paid,
    Credited,
    Uncollectible,
}

impl InvoiceStatus {
    /// Statuses that exclude an invoice from payment tracking.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::Canceled | Self::Credited)
    }
}

/// Whether the invoice was issued by us or received from a supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceOrigin {
    Issued,
    Received,
}

/// Supplier or customer identification block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub street: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: Option<String>,
    /// Company registration number (IČO).
    pub registration_id: Option<String>,
    /// Tax identification number (DIČ).
    pub tax_id: Option<String>,
    /// VAT identifier including country prefix (e.g. "SK2020000001").
    pub vat_id: Option<String>,
}

/// Bank connection printed on the invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub name: Option<String>,
    pub iban: String,
    pub swift_bic: Option<String>,
}

/// One invoice line.
///
/// `tax_rate` is a three-state field: `None` means "tax not applicable,
/// reverse charged or exempt", `Some(0)` means zero-rated, `Some(r)` is a
/// percentage. Collapsing `None` into `0` loses the reverse-charge signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    /// Invoiced quantity, up to 3 decimal places.
    pub quantity: Decimal,
    /// Unit of measure (free text, e.g. "pcs.", "hours").
    pub unit: Option<String>,
    /// Net price per unit, 2 decimal places.
    pub unit_price: Decimal,
    /// Discount in percent applied to this line.
    pub discount: Decimal,
    /// VAT rate in percent; `None` = tax not applicable.
    pub tax_rate: Option<Decimal>,
    /// Free-form grouping tag.
    pub tag: Option<String>,
}

/// One row of the per-rate VAT summary.
///
/// `base` is the unrounded taxable base for the rate; `vat` is rounded
/// independently per group so rounding error does not compound across
/// heterogeneous rates on one invoice. The `None`-rate group carries
/// `vat: None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatGroup {
    pub rate: Option<Decimal>,
    pub base: Decimal,
    pub vat: Option<Decimal>,
}

/// Invoice header with its owned lines.
///
/// `total` and `vat` are caches kept consistent with the items by
/// [`Invoice::recalculate`], which runs on every item mutation. They are
/// not independently authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_type: InvoiceType,
    pub status: InvoiceStatus,
    pub origin: InvoiceOrigin,
    /// Counter value, unique within its counter-period scope.
    pub sequence: Option<u32>,
    /// Human-facing formatted number derived from `sequence`.
    pub number: Option<String>,
    pub subtitle: Option<String>,
    pub note: Option<String>,
    /// Weak links to related invoice numbers (credit note ↔ original).
    pub related_invoices: Vec<String>,

    pub date_issue: NaiveDate,
    /// Time of supply; selects the applicable-as-of-date tax rate.
    pub date_tax_point: NaiveDate,
    pub date_due: NaiveDate,
    /// Stamped when the status transitions to `Sent`.
    pub date_sent: Option<NaiveDate>,
    /// Stamped when the status transitions to `Paid`.
    pub date_paid: Option<NaiveDate>,

    /// ISO 4217 currency code.
    pub currency: String,
    /// Manual reduction of the total (loyalty/adjustment), not a line discount.
    pub credit: Decimal,
    pub already_paid: Decimal,

    pub supplier: Party,
    pub customer: Party,
    /// Delivery country when it differs from the customer country;
    /// used as the place of supply for reverse-charge determination.
    pub shipping_country: Option<String>,
    pub bank: Option<BankAccount>,

    pub items: Vec<Item>,

    /// Cached grand total; see [`Invoice::calculate_total`].
    pub total: Decimal,
    /// Cached VAT sum; `None` when the whole invoice is reverse-charged.
    pub vat: Option<Decimal>,
}
