//! Clean action - finds and removes output directories of untracked packages.

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::catalog::Catalog;
use crate::runtime::Runtime;

pub struct CleanAction<'a, R: Runtime> {
    runtime: &'a R,
    catalog: Catalog<'a, R>,
    output_dir: PathBuf,
}

impl<'a, R: Runtime> CleanAction<'a, R> {
    pub fn new(
        runtime: &'a R,
        catalog_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runtime,
            catalog: Catalog::new(runtime, catalog_path.into()),
            output_dir: output_dir.into(),
        }
    }

    /// Directories under the output root whose name is no tracked package's
    /// canonical name, sorted.
    pub fn orphans(&self) -> Result<Vec<PathBuf>> {
        if !self.runtime.is_dir(&self.output_dir) {
            debug!("Output directory {:?} does not exist", self.output_dir);
            return Ok(Vec::new());
        }

        let tracked = self.catalog.list()?;
        let mut orphans: Vec<PathBuf> = self
            .runtime
            .read_dir(&self.output_dir)
            .with_context(|| format!("Failed to read {:?}", self.output_dir))?
            .into_iter()
            .filter(|path| self.runtime.is_dir(path))
            .filter(|path| {
                path.file_name()
                    .is_none_or(|name| !tracked.iter().any(|p| name == p.name()))
            })
            .collect();
        orphans.sort();
        Ok(orphans)
    }

    pub fn remove(&self, orphans: &[PathBuf]) -> Result<()> {
        for dir in orphans {
            info!("Removing {:?}", dir);
            self.runtime
                .remove_dir_all(dir)
                .with_context(|| format!("Failed to remove {:?}", dir))?;
        }
        Ok(())
    }
}
