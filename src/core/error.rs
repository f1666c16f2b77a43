use thiserror::Error;

/// Errors that can occur while building, taxing, or numbering invoices.
///
/// `Config` marks deployment misconfiguration (invalid number format,
/// non-EU supplier country, missing registry) and is meant to surface
/// immediately rather than be swallowed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvoicingError {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Builder encountered invalid input.
    #[error("builder error: {0}")]
    Builder(String),

    /// Sequence or number generation error.
    #[error("numbering error: {0}")]
    Numbering(String),

    /// Tax rate resolution error.
    #[error("taxation error: {0}")]
    Taxation(String),
}
