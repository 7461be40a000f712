//! Error types for texbridge operations.
//!
//! Conversions themselves never fail: malformed markup degrades to literal
//! text. These errors only cover the I/O surfaces around the converter.

use thiserror::Error;

/// Errors that can occur while reading or writing documents.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
