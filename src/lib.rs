//! # fakturacia
//!
//! Core engine for commercial invoicing in the EU: tax-rate resolution
//! (including reverse charge and VIES registry checks), decimal-exact
//! invoice totals, and counter-period-scoped sequence numbering.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating point.
//! Persistence, rendering and export are deliberately out of scope; the
//! crate models the arithmetic and the numbering rules only.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use fakturacia::core::*;
//! use rust_decimal_macros::dec;
//!
//! let invoice = InvoiceBuilder::new(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
//!     .supplier(PartyBuilder::new("ACME s.r.o.").country("SK").vat_id("SK2020000001").build())
//!     .customer(PartyBuilder::new("Zákazník a.s.").country("SK").build())
//!     .add_item(
//!         ItemBuilder::new("Consulting", dec!(2), dec!(100.00))
//!             .discount(dec!(10))
//!             .tax_rate(dec!(20))
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(invoice.total, dec!(216.00));
//! assert_eq!(invoice.vat, Some(dec!(36.00)));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Invoice model, totals engine, taxation policies, numbering |
//! | `vies` | Blocking HTTP client for the EU VIES VAT registry |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod taxation;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
