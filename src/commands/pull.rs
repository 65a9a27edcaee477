use anyhow::Result;
use std::io::IsTerminal;

use crate::application::PullAction;
use crate::domain::model::{Outcome, PackageOutcome};
use crate::pull::PullOptions;
use crate::runtime::Runtime;
use crate::source::Source;

use super::config::Config;
use super::print_unmatched;

/// Pull the newest `last` versions of the selected packages.
///
/// Per-item failures are printed and do not fail the command.
#[tracing::instrument(skip(runtime, config, source))]
pub async fn pull<R: Runtime, S: Source + ?Sized>(
    runtime: &R,
    config: &Config,
    source: &S,
    aliases: &[String],
    last: usize,
    threads: usize,
) -> Result<()> {
    let options = PullOptions {
        last,
        max_workers: threads,
        // Concurrent progress lines would overwrite each other.
        show_progress: threads == 1 && std::io::stdout().is_terminal(),
    };

    let report = PullAction::new(runtime, source, &config.catalog_path, &config.output_dir)
        .pull(aliases, &options)
        .await?;

    for outcome in &report.outcomes {
        print_package(outcome);
    }
    print_unmatched(&report.unmatched);

    if !report.outcomes.is_empty() {
        let count = |pred: fn(&Outcome) -> bool| -> usize {
            report.outcomes.iter().map(|o| o.count(pred)).sum()
        };
        println!(
            "Done: {} saved, {} already present, {} failed",
            count(|o| matches!(o, Outcome::Completed { .. })),
            count(|o| matches!(o, Outcome::Skipped { .. })),
            count(Outcome::is_failed),
        );
    }
    Ok(())
}

fn print_package(outcome: &PackageOutcome) {
    println!("{}", outcome.package);
    if let Some(error) = &outcome.error {
        println!("  error: {}", error);
        return;
    }
    if outcome.items.is_empty() {
        println!("  (no versions found)");
    }
    for item in &outcome.items {
        println!("  {}: {}", item.version.tag(), item.outcome);
    }
}
