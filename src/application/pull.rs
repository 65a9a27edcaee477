//! Pull action - resolves aliases and runs the pull core over them.

use std::path::PathBuf;

use anyhow::Result;
use log::debug;

use crate::catalog::Catalog;
use crate::domain::model::PackageOutcome;
use crate::pull::{PullOptions, Puller};
use crate::runtime::Runtime;
use crate::source::Source;

use super::resolve_aliases;

#[derive(Debug)]
pub struct PullReport {
    pub outcomes: Vec<PackageOutcome>,
    /// Aliases that matched no tracked package.
    pub unmatched: Vec<String>,
}

pub struct PullAction<'a, R: Runtime, S: Source + ?Sized> {
    catalog: Catalog<'a, R>,
    puller: Puller<'a, R, S>,
}

impl<'a, R: Runtime, S: Source + ?Sized> PullAction<'a, R, S> {
    pub fn new(
        runtime: &'a R,
        source: &'a S,
        catalog_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog: Catalog::new(runtime, catalog_path.into()),
            puller: Puller::new(runtime, source, output_dir),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn pull(&self, aliases: &[String], options: &PullOptions) -> Result<PullReport> {
        options.validate()?;
        let selection = resolve_aliases(&self.catalog, aliases)?;
        debug!(
            "Pulling {} package(s), {} unmatched alias(es)",
            selection.matched.len(),
            selection.unmatched.len()
        );

        let outcomes = self.puller.pull(&selection.matched, options).await?;
        Ok(PullReport {
            outcomes,
            unmatched: selection.unmatched,
        })
    }
}
