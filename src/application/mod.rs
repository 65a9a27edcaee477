//! Application layer - use cases that coordinate the catalog, the remote
//! source and the pull core.
//!
//! Use cases return plain data; printing is left to `commands`.

mod clean;
mod info;
mod inventory;
mod pull;
mod search;
mod track;

pub use clean::CleanAction;
pub use info::{InfoAction, InfoReport, PackageInfo};
pub use inventory::{InventoryAction, LocalPackage};
pub use pull::{PullAction, PullReport};
pub use search::{SearchAction, SearchHit};
pub use track::TrackAction;

use anyhow::Result;

use crate::catalog::{AliasMatch, Catalog};
use crate::error::Error;
use crate::runtime::Runtime;

/// Resolve command-line aliases, rejecting an empty selection up front.
pub(crate) fn resolve_aliases<R: Runtime>(
    catalog: &Catalog<'_, R>,
    aliases: &[String],
) -> Result<AliasMatch> {
    if aliases.is_empty() {
        return Err(Error::NoAliases.into());
    }
    catalog.find_by_alias(aliases)
}
