//! Remote search, optionally tracking every result.

use std::path::PathBuf;

use anyhow::Result;
use log::{debug, warn};

use crate::catalog::Catalog;
use crate::domain::model::TrackedPackage;
use crate::error::Error;
use crate::runtime::Runtime;
use crate::source::Source;

/// A search result, with whether its URL is already in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub package: TrackedPackage,
    pub tracked: bool,
}

pub struct SearchAction<'a, R: Runtime, S: Source + ?Sized> {
    catalog: Catalog<'a, R>,
    source: &'a S,
}

impl<'a, R: Runtime, S: Source + ?Sized> SearchAction<'a, R, S> {
    pub fn new(runtime: &'a R, source: &'a S, catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog: Catalog::new(runtime, catalog_path.into()),
            source,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn search(&self, terms: &[String]) -> Result<Vec<SearchHit>> {
        let terms: Vec<String> = terms
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Err(Error::NoSearchTerms.into());
        }

        let tracked = self.catalog.list()?;
        let summaries = self.source.search(&terms).await?;
        debug!("Search returned {} result(s)", summaries.len());

        Ok(summaries
            .into_iter()
            .filter_map(|summary| {
                match TrackedPackage::new(&summary.url, None, summary.rating) {
                    Ok(package) => Some(package),
                    Err(e) => {
                        warn!("Ignoring search result: {}", e);
                        None
                    }
                }
            })
            .map(|package| SearchHit {
                tracked: tracked.iter().any(|t| t.url() == package.url()),
                package,
            })
            .collect())
    }

    /// Track every hit under its default alias. Returns how many were added.
    pub fn track_all(&self, hits: &[SearchHit]) -> Result<usize> {
        let candidates: Vec<TrackedPackage> = hits
            .iter()
            .filter(|hit| !hit.tracked)
            .map(|hit| hit.package.clone())
            .collect();
        self.catalog.add(&candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use crate::source::{MockSource, PackageSummary};
    use tempfile::tempdir;

    fn summary(url: &str, rating: Option<f64>) -> PackageSummary {
        PackageSummary {
            url: url.to_string(),
            rating,
        }
    }

    #[tokio::test]
    async fn test_empty_terms_rejected_before_search() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let source = MockSource::new();
        let action = SearchAction::new(&runtime, &source, dir.path().join("catalog.json"));

        let err = action.search(&[" ".to_string()]).await.unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::NoSearchTerms));
    }

    #[tokio::test]
    async fn test_search_marks_tracked_and_tracks_rest() {
        let dir = tempdir().unwrap();
        let catalog_path = dir.path().join("catalog.json");
        let runtime = RealRuntime;
        Catalog::new(&runtime, catalog_path.clone())
            .add(&[TrackedPackage::new("https://x/github/com.github.android", Some("github"), None)
                .unwrap()])
            .unwrap();

        let mut source = MockSource::new();
        source
            .expect_search()
            .withf(|terms| terms == ["git".to_string()])
            .times(1)
            .returning(|_| {
                Ok(vec![
                    summary("https://x/github/com.github.android", Some(4.5)),
                    summary("https://x/git-client/org.example.git", None),
                    summary("https://", None),
                ])
            });

        let action = SearchAction::new(&runtime, &source, catalog_path.clone());
        let hits = action.search(&["git".to_string()]).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert!(hits[0].tracked);
        assert_eq!(hits[0].package.rating(), Some(4.5));
        assert!(!hits[1].tracked);

        assert_eq!(action.track_all(&hits).unwrap(), 1);
        let aliases: Vec<String> = Catalog::new(&runtime, catalog_path)
            .list()
            .unwrap()
            .iter()
            .map(|p| p.alias().to_string())
            .collect();
        assert_eq!(aliases, vec!["github", "org.example.git"]);
    }
}
