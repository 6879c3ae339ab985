pub mod classify;
pub mod fields;
pub mod processor;
pub mod risk;

pub use classify::*;
pub use fields::*;
pub use processor::*;
pub use risk::*;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::pipeline::extraction::ExtractionError;

#[derive(Error, Debug)]
pub enum MiningError {
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}
