//! Invoice model, monetary engine, and numbering.
//!
//! The invoice keeps cached `total`/`vat` fields that are refreshed on
//! every item mutation, so stored sums are always trustworthy without a
//! recompute step at read time.

mod builder;
mod error;
mod invoice;
mod numbering;
mod sequence;
mod types;

pub use builder::*;
pub use error::*;
pub use numbering::*;
pub use sequence::*;
pub use types::*;
