use anyhow::Result;

use crate::application::InfoAction;
use crate::runtime::Runtime;
use crate::source::Source;

use super::config::Config;
use super::print_unmatched;

/// Show the newest remote versions of the selected packages.
#[tracing::instrument(skip(runtime, config, source))]
pub async fn info<R: Runtime, S: Source + ?Sized>(
    runtime: &R,
    config: &Config,
    source: &S,
    aliases: &[String],
    last: usize,
) -> Result<()> {
    let report = InfoAction::new(runtime, source, &config.catalog_path, &config.output_dir)
        .info(aliases, last)
        .await?;

    for info in &report.packages {
        println!("{}", info.package);
        println!("  URL: {}", info.package.url());
        match &info.versions {
            Ok(versions) if versions.is_empty() => println!("  (no versions found)"),
            Ok(versions) => {
                for version in versions {
                    let local = if info.is_local(version) { "  [local]" } else { "" };
                    println!("  {}  {}{}", version.tag(), version.published_at(), local);
                    println!("    {}", version.url());
                }
            }
            Err(reason) => println!("  error: {}", reason),
        }
    }
    print_unmatched(&report.unmatched);
    Ok(())
}
