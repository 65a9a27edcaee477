use std::path::PathBuf;

use anyhow::Result;

use crate::catalog::Catalog;
use crate::domain::model::TrackedPackage;
use crate::pull::Finalizer;
use crate::runtime::Runtime;

/// A tracked package with the versions already pulled.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPackage {
    pub package: TrackedPackage,
    pub versions: Vec<String>,
}

/// Lists the catalog together with each package's local artifacts.
pub struct InventoryAction<'a, R: Runtime> {
    runtime: &'a R,
    catalog: Catalog<'a, R>,
    output_dir: PathBuf,
}

impl<'a, R: Runtime> InventoryAction<'a, R> {
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

    pub fn list(&self) -> Result<Vec<LocalPackage>> {
        let finalizer = Finalizer::new(self.runtime);
        self.catalog
            .list()?
            .into_iter()
            .map(|package| {
                let versions = finalizer.local_tags(&self.output_dir.join(package.name()))?;
                Ok(LocalPackage { package, versions })
            })
            .collect()
    }
}
