//! Remote source abstraction.
//!
//! The pull core only talks to a [`Source`]: it lists versions and starts
//! downloads through it, and never parses pages or speaks HTTP itself.

mod web;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::path::Path;

use crate::domain::model::ProgressEvent;

pub use web::WebSource;

/// A package as found by a remote search.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageSummary {
    pub url: String,
    pub rating: Option<f64>,
}

/// One entry of a package's remote version list.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionSummary {
    pub url: String,
    pub tag: String,
    pub published_at: String,
}

/// Events for one download, ending with `Completed` or `Canceled`.
pub type DownloadStream = BoxStream<'static, ProgressEvent>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Source: Send + Sync {
    /// Search every term and return packages deduplicated by URL.
    async fn search(&self, terms: &[String]) -> Result<Vec<PackageSummary>>;

    /// List a package's versions, newest first.
    async fn list_versions(&self, package_url: &str) -> Result<Vec<VersionSummary>>;

    /// Start downloading a version into `destination`.
    ///
    /// The file is written under a name of the source's choosing; the caller
    /// finalizes it once the stream reports `Completed`.
    async fn download(&self, version_url: &str, destination: &Path) -> Result<DownloadStream>;
}
