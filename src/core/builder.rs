use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::InvoicingError;
use super::types::*;

/// Builder for constructing invoices.
///
/// Dates default sensibly: the tax point and due date fall back to the
/// issue date. Totals are calculated on `build()`.
///
/// ```
/// use chrono::NaiveDate;
/// use fakturacia::core::*;
/// use rust_decimal_macros::dec;
///
/// let invoice = InvoiceBuilder::new(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
///     .supplier(PartyBuilder::new("ACME s.r.o.").country("SK").vat_id("SK2020000001").build())
///     .customer(PartyBuilder::new("Zákazník a.s.").country("CZ").build())
///     .add_item(ItemBuilder::new("Hosting", dec!(1), dec!(49.90)).tax_rate(dec!(20)).build())
///     .build()
///     .unwrap();
/// assert_eq!(invoice.total, dec!(59.88));
/// ```
pub struct InvoiceBuilder {
    invoice_type: InvoiceType,
    origin: InvoiceOrigin,
    sequence: Option<u32>,
    number: Option<String>,
    subtitle: Option<String>,
    note: Option<String>,
    related_invoices: Vec<String>,
    date_issue: NaiveDate,
    date_tax_point: Option<NaiveDate>,
    date_due: Option<NaiveDate>,
    currency: String,
    credit: Decimal,
    already_paid: Decimal,
    supplier: Party,
    customer: Party,
    shipping_country: Option<String>,
    bank: Option<BankAccount>,
    items: Vec<Item>,
}

impl InvoiceBuilder {
    pub fn new(date_issue: NaiveDate) -> Self {
        Self {
            invoice_type: InvoiceType::Invoice,
            origin: InvoiceOrigin::Issued,
            sequence: None,
            number: None,
            subtitle: None,
            note: None,
            related_invoices: Vec::new(),
            date_issue,
            date_tax_point: None,
            date_due: None,
            currency: "EUR".to_string(),
            credit: Decimal::ZERO,
            already_paid: Decimal::ZERO,
            supplier: Party::default(),
            customer: Party::default(),
            shipping_country: None,
            bank: None,
            items: Vec::new(),
        }
    }

    pub fn invoice_type(mut self, invoice_type: InvoiceType) -> Self {
        self.invoice_type = invoice_type;
        self
    }

    pub fn origin(mut self, origin: InvoiceOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Pre-set sequence; skips generation in [`Invoice::assign_number`].
    pub fn sequence(mut self, sequence: u32) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Pre-set number; skips formatting in [`Invoice::assign_number`].
    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Link a related invoice by number (e.g. credit note → original).
    pub fn related_invoice(mut self, number: impl Into<String>) -> Self {
        self.related_invoices.push(number.into());
        self
    }

    pub fn date_tax_point(mut self, date: NaiveDate) -> Self {
        self.date_tax_point = Some(date);
        self
    }

    pub fn date_due(mut self, date: NaiveDate) -> Self {
        self.date_due = Some(date);
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency = code.into();
        self
    }

    pub fn credit(mut self, credit: Decimal) -> Self {
        self.credit = credit;
        self
    }

    pub fn already_paid(mut self, amount: Decimal) -> Self {
        self.already_paid = amount;
        self
    }

    pub fn supplier(mut self, party: Party) -> Self {
        self.supplier = party;
        self
    }

    pub fn customer(mut self, party: Party) -> Self {
        self.customer = party;
        self
    }

    pub fn shipping_country(mut self, code: impl Into<String>) -> Self {
        self.shipping_country = Some(code.into());
        self
    }

    pub fn bank(mut self, bank: BankAccount) -> Self {
        self.bank = Some(bank);
        self
    }

    pub fn add_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Build the invoice and calculate its totals.
    pub fn build(self) -> Result<Invoice, InvoicingError> {
        // Input limits to prevent abuse
        if self.items.len() > 10_000 {
            return Err(InvoicingError::Builder(
                "invoice cannot have more than 10,000 line items".into(),
            ));
        }
        if let Some(number) = &self.number {
            if number.len() > 128 {
                return Err(InvoicingError::Builder(
                    "invoice number cannot exceed 128 characters".into(),
                ));
            }
        }

        let mut invoice = Invoice {
            invoice_type: self.invoice_type,
            status: InvoiceStatus::New,
            origin: self.origin,
            sequence: self.sequence,
            number: self.number,
            subtitle: self.subtitle,
            note: self.note,
            related_invoices: self.related_invoices,
            date_issue: self.date_issue,
            date_tax_point: self.date_tax_point.unwrap_or(self.date_issue),
            date_due: self.date_due.unwrap_or(self.date_issue),
            date_sent: None,
            date_paid: None,
            currency: self.currency,
            credit: self.credit,
            already_paid: self.already_paid,
            supplier: self.supplier,
            customer: self.customer,
            shipping_country: self.shipping_country,
            bank: self.bank,
            items: self.items,
            total: Decimal::ZERO,
            vat: Some(Decimal::ZERO),
        };

        invoice.recalculate();
        Ok(invoice)
    }
}

/// Builder for a supplier or customer block.
pub struct PartyBuilder {
    party: Party,
}

impl PartyBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            party: Party {
                name: name.into(),
                ..Party::default()
            },
        }
    }

    pub fn street(mut self, street: impl Into<String>) -> Self {
        self.party.street = Some(street.into());
        self
    }

    pub fn zip(mut self, zip: impl Into<String>) -> Self {
        self.party.zip = Some(zip.into());
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.party.city = Some(city.into());
        self
    }

    pub fn country(mut self, code: impl Into<String>) -> Self {
        self.party.country_code = Some(code.into());
        self
    }

    pub fn registration_id(mut self, id: impl Into<String>) -> Self {
        self.party.registration_id = Some(id.into());
        self
    }

    pub fn tax_id(mut self, id: impl Into<String>) -> Self {
        self.party.tax_id = Some(id.into());
        self
    }

    pub fn vat_id(mut self, id: impl Into<String>) -> Self {
        self.party.vat_id = Some(id.into());
        self
    }

    pub fn build(self) -> Party {
        self.party
    }
}

/// Builder for an invoice line.
///
/// The tax rate defaults to `None` ("not applicable"). Use
/// [`ItemBuilder::tax_rate`] for a known rate, [`ItemBuilder::reverse_charge`]
/// to state the `None` explicitly, or leave it unset and add the line via
/// [`Invoice::add_item_taxed`] to resolve it from a taxation policy.
pub struct ItemBuilder {
    item: Item,
}

impl ItemBuilder {
    pub fn new(title: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            item: Item {
                title: title.into(),
                quantity,
                unit: None,
                unit_price,
                discount: Decimal::ZERO,
                tax_rate: None,
                tag: None,
            },
        }
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.item.unit = Some(unit.into());
        self
    }

    /// Discount in percent.
    pub fn discount(mut self, percent: Decimal) -> Self {
        self.item.discount = percent;
        self
    }

    /// VAT rate in percent; `Some(0)` is a zero-rated line.
    pub fn tax_rate(mut self, percent: Decimal) -> Self {
        self.item.tax_rate = Some(percent);
        self
    }

    /// Mark the line as reverse-charged / tax not applicable.
    pub fn reverse_charge(mut self) -> Self {
        self.item.tax_rate = None;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.item.tag = Some(tag.into());
        self
    }

    pub fn build(self) -> Item {
        self.item
    }
}
