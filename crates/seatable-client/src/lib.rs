//! Async client for the SeaTable REST API.
//!
//! A [`Base`] talks to one SeaTable base. It exchanges the base's API token
//! for an access token, then reads metadata, manages rows and tables, runs
//! SQL and uploads assets.
//!
//! # Usage
//!
//! ```ignore
//! use seatable_client::prelude::*;
//!
//! let mut base = Base::new("your-api-token", "https://cloud.seatable.io")?;
//! base.auth(false).await?;
//!
//! let metadata = base.get_metadata().await?;
//! let row = base.append_row("Table3", row![("Name", "name1"), ("age", 20)]).await?;
//! let id = row.id().unwrap_or_default();
//! base.update_row("Table3", id, row![("age", 10)]).await?;
//! base.delete_row("Table3", id).await?;
//!
//! let hello = std::io::Cursor::new(b"hello world".to_vec());
//! let file = base.upload_bytes_file("hello.md", hello, "", FileType::File, false).await?;
//! ```

pub mod base;
#[cfg(feature = "files")]
pub mod files;
pub mod rows;
pub mod tables;
pub mod types;

pub use base::{Base, ACCESS_TOKEN_LIFETIME};
#[cfg(feature = "files")]
pub use files::{FileType, UploadLink, UploadResult};
pub use types::*;

pub use seatable_client_core::{
    row, BaseConfig, ErrorKind, Row, SeaTableError, SeaTableResult, TokenKind,
};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use seatable_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::base::Base;
    #[cfg(feature = "files")]
    pub use crate::files::{FileType, UploadResult};
    pub use crate::types::{Metadata, RowInsertPosition, RowUpdate};
    pub use seatable_client_core::{
        row, BaseConfig, ErrorKind, Row, SeaTableError, SeaTableResult, TokenKind,
    };
}
