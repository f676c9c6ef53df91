//! Shared building blocks for the SeaTable client crates.
//!
//! Holds the connection configuration, the error taxonomy every operation
//! returns, and the dynamic [`Row`] type used for row payloads.

pub mod config;
pub mod error;
pub mod value;

pub use config::{BaseConfig, TokenKind};
pub use error::{parse_error_message, ApiErrorResponse, ErrorKind, SeaTableError, SeaTableResult};
pub use value::Row;
