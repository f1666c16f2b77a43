//! Monetary engine: item arithmetic, per-rate VAT summary, cached totals.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::taxation::{TaxParties, TaxationPolicy};

use super::error::InvoicingError;
use super::types::*;

/// Round to 2 decimal places using half-up (commercial rounding).
pub(crate) fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

const HUNDRED: Decimal = dec!(100);

impl Item {
    /// Line net amount after discount.
    ///
    /// Two sequential roundings, intentionally: the gross line amount is
    /// rounded before the discount is applied, so the discounted total
    /// matches a manually computed invoice to the cent.
    pub fn subtotal(&self) -> Decimal {
        let subtotal = round2(self.unit_price * self.quantity);
        round2(subtotal * (HUNDRED - self.discount) / HUNDRED)
    }

    /// Amount deducted from the line by the discount.
    pub fn discount_amount(&self) -> Decimal {
        let subtotal = round2(self.unit_price * self.quantity);
        round2(subtotal * self.discount / HUNDRED)
    }

    /// VAT levied on the line; zero when the rate is not applicable.
    pub fn vat_amount(&self) -> Decimal {
        match self.tax_rate {
            Some(rate) => round2(self.subtotal() * rate / HUNDRED),
            None => Decimal::ZERO,
        }
    }

    /// Unit price including VAT.
    pub fn unit_price_with_vat(&self) -> Decimal {
        let rate = self.tax_rate.unwrap_or(Decimal::ZERO);
        round2(self.unit_price * (HUNDRED + rate) / HUNDRED)
    }

    /// Line total including VAT.
    pub fn total(&self) -> Decimal {
        round2(self.subtotal() + self.vat_amount())
    }
}

impl Invoice {
    /// Group items by tax rate into one summary row per distinct rate.
    ///
    /// Rows are ordered with the not-applicable (`None`) group first,
    /// then ascending by rate.
    pub fn vat_summary(&self) -> Vec<VatGroup> {
        let mut groups: BTreeMap<Option<Decimal>, (Decimal, Decimal)> = BTreeMap::new();

        for item in &self.items {
            let base = item.quantity * item.unit_price * (HUNDRED - item.discount) / HUNDRED;
            let entry = groups.entry(item.tax_rate).or_default();
            entry.0 += base;
            if let Some(rate) = item.tax_rate {
                entry.1 += base * rate / HUNDRED;
            }
        }

        groups
            .into_iter()
            .map(|(rate, (base, vat))| VatGroup {
                rate,
                base,
                vat: rate.map(|_| round2(vat)),
            })
            .collect()
    }

    /// Total VAT across all summary groups.
    ///
    /// Returns `None` only when the invoice has exactly one group and that
    /// group's VAT is `None` — the entire invoice is reverse-charged or
    /// exempt, which is distinct from "zero tax".
    pub fn calculate_vat(&self) -> Option<Decimal> {
        let summary = self.vat_summary();
        if summary.len() == 1 && summary[0].vat.is_none() {
            return None;
        }
        Some(
            summary
                .iter()
                .map(|group| group.vat.unwrap_or(Decimal::ZERO))
                .sum(),
        )
    }

    /// Grand total: Σ (base + VAT) over all groups, minus `credit`.
    pub fn calculate_total(&self) -> Decimal {
        let mut total = Decimal::ZERO;
        for group in self.vat_summary() {
            total += group.base + group.vat.unwrap_or(Decimal::ZERO);
        }
        round2(total - self.credit)
    }

    /// Refresh the cached `total` and `vat` fields.
    ///
    /// Called by every item mutator; call it manually after editing
    /// `items`, `credit` or item fields directly.
    pub fn recalculate(&mut self) {
        self.total = self.calculate_total();
        self.vat = self.calculate_vat();
    }

    /// Append a line whose tax rate (or explicit reverse-charge `None`)
    /// is already known, and refresh the cached totals.
    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
        self.recalculate();
    }

    /// Append a line, resolving its tax rate from the invoice's party
    /// data through the given taxation policy.
    ///
    /// The rate is populated once, here; it is not re-resolved on later
    /// recalculations.
    pub fn add_item_taxed(
        &mut self,
        mut item: Item,
        policy: &dyn TaxationPolicy,
    ) -> Result<(), InvoicingError> {
        item.tax_rate = policy.tax_rate(&self.tax_parties())?;
        self.items.push(item);
        self.recalculate();
        Ok(())
    }

    /// Remove a line by index and refresh the cached totals.
    pub fn remove_item(&mut self, index: usize) -> Option<Item> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.recalculate();
        Some(item)
    }

    /// Set the manual credit deduction and refresh the cached totals.
    pub fn set_credit(&mut self, credit: Decimal) {
        self.credit = credit;
        self.recalculate();
    }

    /// Transition the status, stamping the monitored dates.
    pub fn set_status(&mut self, status: InvoiceStatus, on: NaiveDate) {
        match status {
            InvoiceStatus::Sent => self.date_sent = Some(on),
            InvoiceStatus::Paid => self.date_paid = Some(on),
            _ => {}
        }
        self.status = status;
    }

    /// Sum of line net amounts after discounts.
    pub fn subtotal(&self) -> Decimal {
        round2(self.items.iter().map(Item::subtotal).sum())
    }

    /// Sum of line discount amounts.
    pub fn discount_total(&self) -> Decimal {
        round2(self.items.iter().map(Item::discount_amount).sum())
    }

    /// Grand total as if no line discounts were applied.
    pub fn total_without_discount(&self) -> Decimal {
        self.total + self.discount_total()
    }

    /// Overall discount in percent, `None` for an empty/zero invoice.
    pub fn discount_percentage(&self) -> Option<Decimal> {
        let full = self.total_without_discount();
        if full == Decimal::ZERO {
            return None;
        }
        Some(round2(HUNDRED * self.discount_total() / full))
    }

    /// Whether the invoice is past due as of `today`.
    ///
    /// Zero-total invoices, settled statuses and credit notes are never
    /// overdue.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        if self.total == Decimal::ZERO {
            return false;
        }
        if self.status.is_settled() {
            return false;
        }
        if self.invoice_type == InvoiceType::CreditNote {
            return false;
        }
        self.date_due < today
    }

    /// Days past the due date (negative when not yet due).
    pub fn overdue_days(&self, today: NaiveDate) -> i64 {
        (today - self.date_due).num_days()
    }

    /// Payment term in days, zero for a zero-total invoice.
    pub fn payment_term(&self) -> i64 {
        if self.total > Decimal::ZERO {
            (self.date_due - self.date_issue).num_days()
        } else {
            0
        }
    }

    /// Presentation rule: whether the supplier VAT id belongs on the
    /// printed invoice. A non-VAT-payer supplier invoicing domestically
    /// hides it; cross-border EU supplies keep it even at zero VAT.
    pub fn supplier_vat_id_visible(&self) -> bool {
        let same_country = self.supplier.country_code.is_some()
            && self.supplier.country_code == self.customer.country_code;

        if self.vat.is_none() && same_country {
            return false;
        }

        if self.vat != Some(Decimal::ZERO)
            || self
                .items
                .iter()
                .any(|item| item.tax_rate.is_some_and(|rate| rate > Decimal::ZERO))
        {
            return true;
        }

        let customer_in_eu = self
            .customer
            .country_code
            .as_deref()
            .is_some_and(crate::taxation::is_in_eu);

        customer_in_eu && !same_country
    }

    /// Project the invoice's party data into taxation policy input.
    pub fn tax_parties(&self) -> TaxParties<'_> {
        TaxParties {
            supplier_vat_id: self.supplier.vat_id.as_deref(),
            supplier_country: self.supplier.country_code.as_deref(),
            customer_vat_id: self.customer.vat_id.as_deref(),
            customer_country: self.customer.country_code.as_deref(),
            delivery_country: self.shipping_country.as_deref(),
            tax_point_date: self.date_tax_point,
        }
    }
}
