pub mod pdf;
#[cfg(test)]
pub(crate) mod test_fixtures;
pub mod types;

pub use pdf::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF has no extractable text layer")]
    NoTextLayer,
}
