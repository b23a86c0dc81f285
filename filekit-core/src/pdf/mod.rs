//! PDF page operations.
//!
//! All operations work on an in-memory [`PdfFile`] backed by the `lopdf`
//! object model. Pages are rebuilt into a flat page tree, so inheritable
//! attributes (resources, boxes, rotation) are copied onto each page first.

mod document;
#[cfg(test)]
mod fixtures;
mod merge;
mod ranges;
mod rotation;
mod watermark;

pub use document::{PageSpec, PdfFile};
pub(crate) use document::save;
pub use merge::merge;
pub use ranges::parse_page_ranges;
pub use rotation::{apply_rotation, normalize_rotation, validate_quarter_turn};
pub use watermark::{placement, WatermarkOptions, WatermarkPosition};

use std::fmt::Display;
use thiserror::Error;

/// Failure categories of the PDF layer.
///
/// Library errors are classified here once, at the load/save boundary.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("This PDF is password-protected. Remove the password and try again.")]
    Encrypted,

    #[error("Malformed PDF: {0}")]
    Malformed(String),

    #[error("PDF has no pages")]
    NoPages,

    #[error("Page index {index} out of bounds (document has {total} pages)")]
    PageOutOfBounds { index: usize, total: usize },

    #[error("Invalid rotation {0} (must be a multiple of 90)")]
    InvalidRotation(i64),
}

impl PdfError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PdfError::Malformed(_))
    }
}

pub(crate) fn malformed(err: impl Display) -> PdfError {
    PdfError::Malformed(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PdfError::PageOutOfBounds { index: 12, total: 10 }.to_string(),
            "Page index 12 out of bounds (document has 10 pages)"
        );
        assert!(PdfError::Encrypted.to_string().contains("password-protected"));
        assert!(!PdfError::Malformed("bad xref".into()).is_client_error());
        assert!(PdfError::InvalidRotation(45).is_client_error());
    }
}
