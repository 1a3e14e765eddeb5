//! Record identifiers and sharded-path utilities.
//!
//! QuackHub identifies every stored record (query rows in the primary store, documents in the
//! response archive) with a random v4 UUID kept in a *canonical* form: **32 lowercase hexadecimal
//! characters**, no hyphens. The same form is used in URLs, in SQL rows and in archive paths, so
//! it must never be re-derived differently in different places.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Externally supplied identifiers (path segments, CLI arguments) go through [`RecordId::parse`],
//! which rejects hyphenated, uppercase or truncated values rather than normalising them.
//!
//! ## Sharded directory layout
//! For a canonical id `u`, archive documents live under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`

mod service;

pub use service::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Input was not a canonical identifier
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
