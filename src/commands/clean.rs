use anyhow::Result;

use crate::application::CleanAction;
use crate::runtime::Runtime;

use super::config::Config;

/// Remove output directories that belong to no tracked package.
#[tracing::instrument(skip(runtime, config))]
pub fn clean<R: Runtime>(runtime: &R, config: &Config, yes: bool) -> Result<()> {
    let action = CleanAction::new(runtime, &config.catalog_path, &config.output_dir);
    let orphans = action.orphans()?;

    if orphans.is_empty() {
        println!("Nothing to clean.");
        return Ok(());
    }

    println!("Directories of untracked packages:");
    for dir in &orphans {
        println!("  {}", dir.display());
    }

    if !yes && !runtime.confirm(&format!("Remove {} directories?", orphans.len()))? {
        println!("Aborted.");
        return Ok(());
    }

    action.remove(&orphans)?;
    println!("Removed {} directories.", orphans.len());
    Ok(())
}
