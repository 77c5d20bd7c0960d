//! Data-source implementations.

pub mod directory;

pub use directory::{records_from_body, DirectoryClient, DirectorySource};
