//! Info action - newest remote versions of tracked packages and which of
//! them are already on disk.

use std::path::PathBuf;

use anyhow::Result;

use crate::catalog::Catalog;
use crate::domain::model::{RemoteVersion, TrackedPackage};
use crate::error::Error;
use crate::pull::{Finalizer, Puller};
use crate::runtime::Runtime;
use crate::source::Source;

use super::resolve_aliases;

#[derive(Debug)]
pub struct PackageInfo {
    pub package: TrackedPackage,
    /// Newest versions, or the listing failure.
    pub versions: Result<Vec<RemoteVersion>, String>,
    /// Tags already finalized locally.
    pub local: Vec<String>,
}

impl PackageInfo {
    pub fn is_local(&self, version: &RemoteVersion) -> bool {
        self.local.iter().any(|tag| tag == version.tag())
    }
}

#[derive(Debug)]
pub struct InfoReport {
    pub packages: Vec<PackageInfo>,
    pub unmatched: Vec<String>,
}

pub struct InfoAction<'a, R: Runtime, S: Source + ?Sized> {
    runtime: &'a R,
    catalog: Catalog<'a, R>,
    puller: Puller<'a, R, S>,
}

impl<'a, R: Runtime, S: Source + ?Sized> InfoAction<'a, R, S> {
    pub fn new(
        runtime: &'a R,
        source: &'a S,
        catalog_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runtime,
            catalog: Catalog::new(runtime, catalog_path.into()),
            puller: Puller::new(runtime, source, output_dir),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn info(&self, aliases: &[String], last: usize) -> Result<InfoReport> {
        if last == 0 {
            return Err(Error::InvalidLast.into());
        }
        let selection = resolve_aliases(&self.catalog, aliases)?;
        let finalizer = Finalizer::new(self.runtime);

        let mut packages = Vec::with_capacity(selection.matched.len());
        for package in selection.matched {
            let versions = self
                .puller
                .list_versions(&package, last)
                .await
                .map_err(|e| format!("{:#}", e));
            let local = finalizer.local_tags(&self.puller.package_dir(&package))?;
            packages.push(PackageInfo {
                package,
                versions,
                local,
            });
        }

        Ok(InfoReport {
            packages,
            unmatched: selection.unmatched,
        })
    }
}
