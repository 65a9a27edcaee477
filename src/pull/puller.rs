use anyhow::{Context, Result};
use futures_util::future::join_all;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::model::{
    ItemOutcome, Outcome, PackageOutcome, RemoteVersion, TrackedPackage, WorkItem,
};
use crate::error::Error;
use crate::runtime::Runtime;
use crate::source::Source;

use super::{Finalizer, MAX_WORKERS, ProgressReporter};

#[derive(Debug, Clone)]
pub struct PullOptions {
    /// Number of newest versions to pull per package.
    pub last: usize,
    /// Items downloaded in parallel within one chunk.
    pub max_workers: usize,
    /// Render a progress line on stdout for each download.
    pub show_progress: bool,
}

impl Default for PullOptions {
    fn default() -> Self {
        Self {
            last: 1,
            max_workers: 1,
            show_progress: false,
        }
    }
}

impl PullOptions {
    pub fn validate(&self) -> Result<(), Error> {
        if self.last == 0 {
            return Err(Error::InvalidLast);
        }
        if !(1..=MAX_WORKERS).contains(&self.max_workers) {
            return Err(Error::InvalidThreads(self.max_workers));
        }
        Ok(())
    }
}

/// A work item together with its owning package and the lock of its directory.
struct Scheduled {
    owner: usize,
    item: WorkItem,
    lock: Arc<Mutex<()>>,
}

/// Pulls the newest versions of a set of packages.
///
/// Work items run in chunks of `max_workers`: every item of a chunk runs
/// concurrently, and the next chunk starts once all of them are done.
/// Items sharing a package directory never overlap.
pub struct Puller<'a, R: Runtime, S: Source + ?Sized> {
    runtime: &'a R,
    source: &'a S,
    output_dir: PathBuf,
}

impl<'a, R: Runtime, S: Source + ?Sized> Puller<'a, R, S> {
    pub fn new(runtime: &'a R, source: &'a S, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            source,
            output_dir: output_dir.into(),
        }
    }

    /// Directory artifacts of `package` are finalized into.
    pub fn package_dir(&self, package: &TrackedPackage) -> PathBuf {
        self.output_dir.join(package.name())
    }

    /// The first `last` listed versions of `package`, in source order.
    ///
    /// Listings whose tag is unusable are dropped after truncation, so they
    /// still count toward `last`.
    #[tracing::instrument(skip(self, package), fields(package = %package.name()))]
    pub async fn list_versions(
        &self,
        package: &TrackedPackage,
        last: usize,
    ) -> Result<Vec<RemoteVersion>> {
        let summaries = self
            .source
            .list_versions(package.url())
            .await
            .with_context(|| format!("Failed to list versions of {}", package.alias()))?;

        let mut versions = Vec::with_capacity(last.min(summaries.len()));
        for summary in summaries.into_iter().take(last) {
            match RemoteVersion::new(package, &summary.url, &summary.tag, &summary.published_at) {
                Ok(version) => versions.push(version),
                Err(e) => warn!("Ignoring version of {}: {}", package.name(), e),
            }
        }
        Ok(versions)
    }

    /// Pull `targets` and report one outcome per package, in target order.
    ///
    /// Fails only when `options` are invalid, before the source is contacted.
    /// Listing failures are recorded on the affected package; download and
    /// finalize failures on the affected item.
    #[tracing::instrument(skip(self, targets))]
    pub async fn pull(
        &self,
        targets: &[TrackedPackage],
        options: &PullOptions,
    ) -> Result<Vec<PackageOutcome>> {
        options.validate()?;

        let mut outcomes = Vec::with_capacity(targets.len());
        let mut scheduled = Vec::new();
        let mut locks: HashMap<PathBuf, Arc<Mutex<()>>> = HashMap::new();

        for (owner, package) in targets.iter().enumerate() {
            let destination = self.package_dir(package);
            let error = match self.list_versions(package, options.last).await {
                Ok(versions) => {
                    debug!("{} version(s) to pull for {}", versions.len(), package.name());
                    let lock = locks.entry(destination.clone()).or_default().clone();
                    for version in versions {
                        scheduled.push(Scheduled {
                            owner,
                            item: WorkItem {
                                package: package.clone(),
                                version,
                                destination: destination.clone(),
                            },
                            lock: lock.clone(),
                        });
                    }
                    None
                }
                Err(e) => {
                    warn!("{:#}", e);
                    Some(format!("{:#}", e))
                }
            };
            outcomes.push(PackageOutcome {
                package: package.clone(),
                error,
                items: Vec::new(),
            });
        }

        for (index, chunk) in scheduled.chunks(options.max_workers).enumerate() {
            debug!("Starting chunk {} with {} item(s)", index + 1, chunk.len());
            let results = join_all(chunk.iter().map(|s| self.process(s, options))).await;

            for (s, outcome) in chunk.iter().zip(results) {
                info!("{}: {}", s.item.version, outcome);
                outcomes[s.owner].items.push(ItemOutcome {
                    version: s.item.version.clone(),
                    destination: s.item.destination.clone(),
                    outcome,
                });
            }
        }

        Ok(outcomes)
    }

    async fn process(&self, scheduled: &Scheduled, options: &PullOptions) -> Outcome {
        let _guard = scheduled.lock.lock().await;
        match self.fetch(&scheduled.item, options).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Failed {
                reason: format!("{:#}", e),
            },
        }
    }

    async fn fetch(&self, item: &WorkItem, options: &PullOptions) -> Result<Outcome> {
        let finalizer = Finalizer::new(self.runtime);
        let dir = item.destination.as_path();
        let tag = item.version.tag();

        if let Some(file) = finalizer.existing(dir, tag)? {
            debug!("{} already present as {}", item.version, file);
            return Ok(Outcome::Skipped { file });
        }

        self.runtime
            .create_dir_all(dir)
            .with_context(|| format!("Failed to create {:?}", dir))?;
        finalizer.purge_stale(dir)?;

        let events = self.source.download(item.version.url(), dir).await?;
        let path = ProgressReporter::new(item.version.to_string(), options.show_progress)
            .consume(events)
            .await?;

        let file = match path {
            Some(path) => finalizer.finalize_file(dir, tag, &path)?,
            None => finalizer.finalize(dir, tag)?,
        };
        Ok(Outcome::Completed { file })
    }
}
