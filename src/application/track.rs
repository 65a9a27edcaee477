//! Track, untrack and rename - the catalog mutations.

use std::path::PathBuf;

use anyhow::Result;
use log::info;

use crate::catalog::{AliasMatch, Catalog};
use crate::domain::model::TrackedPackage;
use crate::runtime::Runtime;

use super::resolve_aliases;

pub struct TrackAction<'a, R: Runtime> {
    catalog: Catalog<'a, R>,
}

impl<'a, R: Runtime> TrackAction<'a, R> {
    pub fn new(runtime: &'a R, catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog: Catalog::new(runtime, catalog_path.into()),
        }
    }

    /// Track the package at `url`.
    ///
    /// Returns `None` when the URL is already tracked; the existing entry,
    /// alias included, is left untouched.
    pub fn track(&self, url: &str, alias: Option<&str>) -> Result<Option<TrackedPackage>> {
        let package = TrackedPackage::new(url, alias, None)?;
        if self.catalog.add(std::slice::from_ref(&package))? == 0 {
            return Ok(None);
        }
        info!("Tracking {}", package);
        Ok(Some(package))
    }

    /// Stop tracking the packages selected by `aliases`.
    ///
    /// Unknown aliases are reported back, not treated as errors. The catalog
    /// is only rewritten when something matched.
    pub fn untrack(&self, aliases: &[String]) -> Result<AliasMatch> {
        let selection = resolve_aliases(&self.catalog, aliases)?;
        if !selection.matched.is_empty() {
            self.catalog.remove(&selection.matched)?;
        }
        Ok(selection)
    }

    pub fn rename(&self, alias: &str, new_alias: &str) -> Result<TrackedPackage> {
        self.catalog.rename(alias, new_alias)
    }

    pub fn list(&self) -> Result<Vec<TrackedPackage>> {
        self.catalog.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::runtime::RealRuntime;
    use tempfile::tempdir;

    const GITHUB_URL: &str = "https://x/app/com.github.android";

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_track_then_untrack() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let action = TrackAction::new(&runtime, dir.path().join("catalog.json"));

        let tracked = action.track(GITHUB_URL, Some("github")).unwrap().unwrap();
        assert_eq!(tracked.alias(), "github");
        assert_eq!(tracked.name(), "com.github.android");

        let removed = action.untrack(&strings(&["github", "nope"])).unwrap();
        assert_eq!(removed.matched, vec![tracked]);
        assert_eq!(removed.unmatched, strings(&["nope"]));
        assert!(action.list().unwrap().is_empty());
    }

    #[test]
    fn test_track_twice_keeps_first_alias() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let action = TrackAction::new(&runtime, dir.path().join("catalog.json"));

        action.track(GITHUB_URL, Some("github")).unwrap();
        assert_eq!(action.track(GITHUB_URL, Some("gh")).unwrap(), None);

        let packages = action.list().unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].alias(), "github");
    }

    #[test]
    fn test_track_invalid_url() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let action = TrackAction::new(&runtime, dir.path().join("catalog.json"));

        let err = action.track("https://", None).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidUrl(_))));
        assert!(!dir.path().join("catalog.json").exists());
    }

    #[test]
    fn test_untrack_requires_aliases() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let action = TrackAction::new(&runtime, dir.path().join("catalog.json"));

        let err = action.untrack(&[]).unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::NoAliases));
    }

    #[test]
    fn test_untrack_unknown_alias_writes_nothing() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let action = TrackAction::new(&runtime, dir.path().join("catalog.json"));

        let result = action.untrack(&strings(&["ghost"])).unwrap();
        assert!(result.matched.is_empty());
        assert!(!dir.path().join("catalog.json").exists());
    }

    #[test]
    fn test_rename() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let action = TrackAction::new(&runtime, dir.path().join("catalog.json"));
        action.track(GITHUB_URL, Some("github")).unwrap();

        let renamed = action.rename("github", "gh").unwrap();
        assert_eq!(renamed.alias(), "gh");
        assert_eq!(action.list().unwrap()[0].alias(), "gh");
    }
}
