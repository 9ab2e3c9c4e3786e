//! Error types for rkbvh

use thiserror::Error;

/// Main error type for the crate
///
/// Builds and queries are total over well-formed inputs; the fallible
/// surface is limited to configuration parsing.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),
}
