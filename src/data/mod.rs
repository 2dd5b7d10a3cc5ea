//! Data module - CSV loading, schema and cleaning

mod cleaner;
mod loader;
pub mod schema;

#[cfg(test)]
pub mod fixtures;

pub use cleaner::{CleanerError, CleaningSummary, DataCleaner};
pub use loader::{DataLoader, LoaderError};
