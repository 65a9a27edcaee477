//! CLI-facing command handlers: resolve configuration, run a use case and
//! print its result.

pub mod config;
pub mod services;

mod clean;
mod info;
mod pull;
mod search;
mod track;

pub use clean::clean;
pub use info::info;
pub use pull::pull;
pub use search::search;
pub use track::{list, rename, track, untrack};

use crate::catalog::ALL_ALIASES;

/// Flatten alias arguments: values may be comma separated, blanks are dropped
/// and `--all` adds the wildcard.
pub fn parse_aliases(values: &[String], all: bool) -> Vec<String> {
    let mut aliases: Vec<String> = values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|alias| !alias.is_empty())
        .map(String::from)
        .collect();
    if all {
        aliases.push(ALL_ALIASES.to_string());
    }
    aliases.dedup();
    aliases
}

pub(crate) fn print_unmatched(unmatched: &[String]) {
    for alias in unmatched {
        println!(
            "No tracked package matches '{}'. Try: apkpull search {}",
            alias, alias
        );
    }
}
