pub mod extraction;
pub mod mining;
