use anyhow::Result;

use crate::application::SearchAction;
use crate::runtime::Runtime;
use crate::source::Source;

use super::config::Config;

/// Search the remote source and optionally track every new result.
#[tracing::instrument(skip(runtime, config, source))]
pub async fn search<R: Runtime, S: Source + ?Sized>(
    runtime: &R,
    config: &Config,
    source: &S,
    terms: &[String],
    track: bool,
) -> Result<()> {
    let action = SearchAction::new(runtime, source, &config.catalog_path);
    let hits = action.search(terms).await?;

    if hits.is_empty() {
        println!("No packages found.");
        return Ok(());
    }

    println!("Found {} package(s):", hits.len());
    for hit in &hits {
        let marker = if hit.tracked { "[tracked]" } else { "         " };
        println!("  {} {}", marker, hit.package);
        println!("            {}", hit.package.url());
    }

    if track {
        let added = action.track_all(&hits)?;
        println!("Tracked {} new package(s).", added);
    }
    Ok(())
}
