//! Input and catalog errors that callers may want to tell apart.
//!
//! Everything else is carried as `anyhow::Error` with context.

use thiserror::Error;

use crate::pull::MAX_WORKERS;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Thread count must be between 1 and {MAX_WORKERS}, got {0}")]
    InvalidThreads(usize),

    #[error("Number of versions (--last) must be a positive integer")]
    InvalidLast,

    #[error("No aliases given. Pass one or more aliases, or use --all")]
    NoAliases,

    #[error("No search terms given")]
    NoSearchTerms,

    #[error("Alias '{alias}' is already used by {url}")]
    AliasTaken { alias: String, url: String },

    #[error("Alias '{0}' is not tracked")]
    UnknownAlias(String),

    #[error("Invalid alias '{0}': aliases must be non-empty and contain no whitespace or commas")]
    InvalidAlias(String),

    #[error("Invalid package URL '{0}'")]
    InvalidUrl(String),

    #[error("Invalid version tag '{0}'")]
    InvalidTag(String),
}
