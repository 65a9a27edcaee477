//! On-disk JSON format of the catalog.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::domain::model::TrackedPackage;
use crate::error::Error;

/// The whole catalog file: an ordered list of tracked entries.
///
/// Entries are kept as read, so rewriting the document leaves entries that
/// no longer parse as packages untouched.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct CatalogDocument {
    #[serde(default)]
    pub packages: Vec<CatalogEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub url: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl From<&TrackedPackage> for CatalogEntry {
    fn from(pkg: &TrackedPackage) -> Self {
        Self {
            url: pkg.url().to_string(),
            alias: Some(pkg.alias().to_string()),
            rating: pkg.rating(),
        }
    }
}

impl CatalogEntry {
    pub fn to_package(&self) -> Result<TrackedPackage, Error> {
        TrackedPackage::restore(&self.url, self.alias.as_deref(), self.rating)
    }
}

impl CatalogDocument {
    /// Entries that parse as packages, in file order. Others are logged.
    pub fn packages(&self) -> Vec<TrackedPackage> {
        self.indexed_packages()
            .into_iter()
            .map(|(_, pkg)| pkg)
            .collect()
    }

    /// Like [`packages`](Self::packages), paired with each entry's position.
    pub fn indexed_packages(&self) -> Vec<(usize, TrackedPackage)> {
        self.packages
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| match entry.to_package() {
                Ok(pkg) => Some((i, pkg)),
                Err(e) => {
                    warn!("Ignoring catalog entry {:?}: {}", entry.url, e);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_entries() {
        let doc: CatalogDocument = serde_json::from_str(
            r#"{"packages": [
                {"url": "https://x/app/com.github.android", "alias": "github", "rating": 4.5},
                {"url": "https://x/other/org.example", "alias": null}
            ]}"#,
        )
        .unwrap();

        let packages = doc.packages();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].alias(), "github");
        assert_eq!(packages[0].rating(), Some(4.5));
        assert_eq!(packages[1].alias(), "org.example");
        assert_eq!(packages[1].rating(), None);
    }

    #[test]
    fn test_empty_document() {
        let doc: CatalogDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.packages().is_empty());
    }

    #[test]
    fn test_invalid_entries_are_skipped_but_kept() {
        let doc: CatalogDocument = serde_json::from_str(
            r#"{"packages": [{"url": ""}, {"url": "https://x/app/ok"}]}"#,
        )
        .unwrap();
        let indexed = doc.indexed_packages();
        assert_eq!(indexed.len(), 1);
        assert_eq!(indexed[0].0, 1);
        assert_eq!(indexed[0].1.name(), "ok");
        assert_eq!(doc.packages.len(), 2);
    }

    #[test]
    fn test_stored_aliases_are_not_revalidated() {
        let doc: CatalogDocument = serde_json::from_str(
            r#"{"packages": [
                {"url": "https://x/app/org.telegram", "alias": "my telegram"},
                {"url": "https://x/app/org.everything", "alias": "all"}
            ]}"#,
        )
        .unwrap();
        let aliases: Vec<String> = doc
            .packages()
            .iter()
            .map(|p| p.alias().to_string())
            .collect();
        assert_eq!(aliases, vec!["my telegram", "all"]);
    }

    #[test]
    fn test_serialized_shape() {
        let pkg = TrackedPackage::new("https://x/app/com.github.android", Some("github"), None)
            .unwrap();
        let doc = CatalogDocument {
            packages: vec![CatalogEntry::from(&pkg)],
        };
        assert_eq!(
            serde_json::to_value(doc).unwrap(),
            serde_json::json!({
                "packages": [
                    {"url": "https://x/app/com.github.android", "alias": "github", "rating": null}
                ]
            })
        );
    }
}
