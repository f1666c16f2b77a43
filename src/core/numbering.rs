//! Invoice number formatting and numbering configuration.
//!
//! The human-facing number is rendered from a template over invoice
//! attributes, e.g. `"{year}/{sequence}"` or `"F{year}{month:02}-{sequence:04}"`.
//! Templates are parsed up front so a bad format fails at configuration
//! time, and [`NumberingConfig::self_check`] catches formats that would
//! collide across counter periods before any invoice is issued.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::builder::InvoiceBuilder;
use super::error::InvoicingError;
use super::sequence::{CounterPeriod, SequenceScope, SequenceStore};
use super::types::{Invoice, InvoiceType};

/// A parsed invoice number template.
///
/// Supported placeholders: `{year}`, `{month}`, `{day}` (from the issue
/// date, which also drives the counter bucket), `{sequence}`, `{type}`,
/// `{currency}`. A placeholder may carry a zero-padding width, e.g.
/// `{sequence:04}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    segments: Vec<Segment>,
    source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum Segment {
    Literal(String),
    Placeholder { field: Field, pad: Option<usize> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Field {
    Year,
    Month,
    Day,
    Sequence,
    Type,
    Currency,
}

impl Field {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "year" => Some(Self::Year),
            "month" => Some(Self::Month),
            "day" => Some(Self::Day),
            "sequence" => Some(Self::Sequence),
            "type" => Some(Self::Type),
            "currency" => Some(Self::Currency),
            _ => None,
        }
    }
}

impl NumberFormat {
    /// Parse a template. Unknown placeholders, bad padding and unbalanced
    /// braces are configuration errors.
    pub fn parse(template: &str) -> Result<Self, InvoicingError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '{' => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    let mut name = String::new();
                    let mut closed = false;
                    for ch in chars.by_ref() {
                        if ch == '}' {
                            closed = true;
                            break;
                        }
                        name.push(ch);
                    }
                    if !closed {
                        return Err(InvoicingError::Config(format!(
                            "unterminated placeholder in number format '{template}'"
                        )));
                    }
                    segments.push(parse_placeholder(&name, template)?);
                }
                '}' => {
                    return Err(InvoicingError::Config(format!(
                        "unbalanced '}}' in number format '{template}'"
                    )));
                }
                ch => literal.push(ch),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            segments,
            source: template.to_string(),
        })
    }

    /// The template this format was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the number for an invoice with the given sequence.
    /// Infallible: every placeholder was validated at parse time.
    pub fn render(&self, invoice: &Invoice, sequence: u32) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { field, pad } => {
                    let value = match field {
                        Field::Year => invoice.date_issue.year().to_string(),
                        Field::Month => invoice.date_issue.month().to_string(),
                        Field::Day => invoice.date_issue.day().to_string(),
                        Field::Sequence => sequence.to_string(),
                        Field::Type => invoice.invoice_type.code().to_string(),
                        Field::Currency => invoice.currency.clone(),
                    };
                    match pad {
                        Some(width) => out.push_str(&format!("{value:0>width$}")),
                        None => out.push_str(&value),
                    }
                }
            }
        }
        out
    }
}

fn parse_placeholder(body: &str, template: &str) -> Result<Segment, InvoicingError> {
    let (name, pad) = match body.split_once(':') {
        Some((name, pad_spec)) => {
            let width: usize = pad_spec.parse().map_err(|_| {
                InvoicingError::Config(format!(
                    "invalid padding '{pad_spec}' in number format '{template}'"
                ))
            })?;
            (name, Some(width))
        }
        None => (body, None),
    };

    let field = Field::parse(name).ok_or_else(|| {
        InvoicingError::Config(format!(
            "unknown placeholder '{{{body}}}' in number format '{template}'"
        ))
    })?;

    Ok(Segment::Placeholder { field, pad })
}

impl Default for NumberFormat {
    /// The `{year}/{sequence}` default.
    fn default() -> Self {
        Self {
            segments: vec![
                Segment::Placeholder {
                    field: Field::Year,
                    pad: None,
                },
                Segment::Literal("/".to_string()),
                Segment::Placeholder {
                    field: Field::Sequence,
                    pad: None,
                },
            ],
            source: "{year}/{sequence}".to_string(),
        }
    }
}

/// Numbering configuration, supplied explicitly instead of being read
/// from ambient global settings.
#[derive(Debug, Clone)]
pub struct NumberingConfig {
    pub counter_period: CounterPeriod,
    /// When enabled, each invoice type gets its own counter.
    pub per_type_counters: bool,
    /// First sequence issued for a fresh counter.
    pub start_from: u32,
    pub number_format: NumberFormat,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            counter_period: CounterPeriod::Yearly,
            per_type_counters: false,
            start_from: 1,
            number_format: NumberFormat::default(),
        }
    }
}

impl NumberingConfig {
    /// The counter scope for an invoice issued on `date_issue`.
    pub fn scope(
        &self,
        invoice_type: InvoiceType,
        date_issue: NaiveDate,
        number_prefix: Option<&str>,
    ) -> SequenceScope {
        SequenceScope {
            bucket: self.counter_period.bucket(date_issue),
            invoice_type: self.per_type_counters.then_some(invoice_type),
            number_prefix: number_prefix.map(str::to_owned),
        }
    }

    /// Fail-fast startup validation: render two synthetic invoices one
    /// counter period apart (one sequence apart for `Endless`) and reject
    /// the configuration if their numbers collide. A yearly counter with
    /// a format that ignores the year would silently reissue numbers.
    pub fn self_check(&self, today: NaiveDate) -> Result<(), InvoicingError> {
        let mut second_sequence = 1;
        let mut second_date = today;
        if self.counter_period == CounterPeriod::Endless {
            second_sequence += 1;
        } else {
            second_date = self.counter_period.advance(today);
        }

        let first = InvoiceBuilder::new(today).build()?;
        let second = InvoiceBuilder::new(second_date).build()?;

        if self.number_format.render(&first, 1) == self.number_format.render(&second, second_sequence)
        {
            return Err(InvoicingError::Config(format!(
                "number format '{}' does not vary across {:?} counter periods",
                self.number_format.source(),
                self.counter_period
            )));
        }
        Ok(())
    }
}

impl Invoice {
    /// Assign the sequence and formatted number on first save.
    ///
    /// Values already present are never overwritten, and the counter is
    /// only consumed when a sequence is actually needed. Sequence and
    /// number are assigned together so an invoice cannot end up
    /// half-numbered.
    pub fn assign_number(
        &mut self,
        config: &NumberingConfig,
        store: &dyn SequenceStore,
        number_prefix: Option<&str>,
    ) -> Result<(), InvoicingError> {
        if self.sequence.is_none() {
            let scope = config.scope(self.invoice_type, self.date_issue, number_prefix);
            self.sequence = Some(store.next_sequence(&scope, config.start_from)?);
        }
        if self.number.is_none() {
            if let Some(sequence) = self.sequence {
                self.number = Some(config.number_format.render(self, sequence));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemorySequenceStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice_on(issue: NaiveDate) -> Invoice {
        InvoiceBuilder::new(issue).build().unwrap()
    }

    #[test]
    fn default_format_renders_year_and_sequence() {
        let format = NumberFormat::default();
        let invoice = invoice_on(date(2024, 6, 15));
        assert_eq!(format.render(&invoice, 7), "2024/7");
    }

    #[test]
    fn padded_placeholders() {
        let format = NumberFormat::parse("F{year}{month:02}-{sequence:04}").unwrap();
        let invoice = invoice_on(date(2024, 3, 5));
        assert_eq!(format.render(&invoice, 42), "F202403-0042");
    }

    #[test]
    fn type_and_currency_placeholders() {
        let format = NumberFormat::parse("{type}-{currency}-{sequence}").unwrap();
        let mut invoice = invoice_on(date(2024, 1, 1));
        invoice.invoice_type = InvoiceType::CreditNote;
        assert_eq!(format.render(&invoice, 3), "CRN-EUR-3");
    }

    #[test]
    fn unknown_placeholder_is_config_error() {
        assert!(matches!(
            NumberFormat::parse("{garbage}/{sequence}"),
            Err(InvoicingError::Config(_))
        ));
    }

    #[test]
    fn unbalanced_braces_are_config_errors() {
        assert!(NumberFormat::parse("{year/{sequence}").is_err());
        assert!(NumberFormat::parse("year}/{sequence}").is_err());
        assert!(NumberFormat::parse("{year}/{sequence").is_err());
    }

    #[test]
    fn bad_padding_is_config_error() {
        assert!(NumberFormat::parse("{sequence:xx}").is_err());
    }

    #[test]
    fn self_check_accepts_default_yearly_config() {
        let config = NumberingConfig::default();
        assert!(config.self_check(date(2024, 6, 15)).is_ok());
    }

    #[test]
    fn self_check_rejects_sequence_only_yearly_format() {
        let config = NumberingConfig {
            number_format: NumberFormat::parse("{sequence}").unwrap(),
            ..NumberingConfig::default()
        };
        assert!(matches!(
            config.self_check(date(2024, 6, 15)),
            Err(InvoicingError::Config(_))
        ));
    }

    #[test]
    fn self_check_rejects_monthly_counter_with_yearly_format() {
        let config = NumberingConfig {
            counter_period: CounterPeriod::Monthly,
            number_format: NumberFormat::parse("{year}/{sequence}").unwrap(),
            ..NumberingConfig::default()
        };
        // Two invoices a month apart, both sequence 1, same year → collide
        assert!(config.self_check(date(2024, 6, 15)).is_err());
    }

    #[test]
    fn self_check_endless_with_sequence_format_passes() {
        let config = NumberingConfig {
            counter_period: CounterPeriod::Endless,
            number_format: NumberFormat::parse("{sequence}").unwrap(),
            ..NumberingConfig::default()
        };
        assert!(config.self_check(date(2024, 6, 15)).is_ok());
    }

    #[test]
    fn assign_number_sets_sequence_and_number_once() {
        let config = NumberingConfig::default();
        let store = MemorySequenceStore::new();
        let mut invoice = invoice_on(date(2024, 6, 15));

        invoice.assign_number(&config, &store, None).unwrap();
        assert_eq!(invoice.sequence, Some(1));
        assert_eq!(invoice.number.as_deref(), Some("2024/1"));

        // Idempotent: a second call must not consume the counter
        invoice.assign_number(&config, &store, None).unwrap();
        assert_eq!(invoice.sequence, Some(1));

        let mut next = invoice_on(date(2024, 7, 1));
        next.assign_number(&config, &store, None).unwrap();
        assert_eq!(next.sequence, Some(2));
        assert_eq!(next.number.as_deref(), Some("2024/2"));
    }

    #[test]
    fn preset_sequence_and_number_are_kept() {
        let config = NumberingConfig::default();
        let store = MemorySequenceStore::new();
        let mut invoice = InvoiceBuilder::new(date(2024, 6, 15))
            .sequence(999)
            .number("CUSTOM-001")
            .build()
            .unwrap();

        invoice.assign_number(&config, &store, None).unwrap();
        assert_eq!(invoice.sequence, Some(999));
        assert_eq!(invoice.number.as_deref(), Some("CUSTOM-001"));
    }
}
