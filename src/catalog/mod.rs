//! Local catalog of tracked packages.
//!
//! The catalog file is the only authority: every read reloads it and every
//! mutation rewrites the whole document before returning. Concurrent writers
//! against the same file may lose updates.

mod document;

use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

use crate::domain::model::{TrackedPackage, validate_alias};
use crate::error::Error;
use crate::runtime::Runtime;

pub use document::{CatalogDocument, CatalogEntry};

/// Alias that selects every tracked package.
pub const ALL_ALIASES: &str = "all";

/// Result of resolving user-supplied aliases against the catalog.
#[derive(Debug, Default, PartialEq)]
pub struct AliasMatch {
    /// Matched packages, in catalog order.
    pub matched: Vec<TrackedPackage>,
    /// Input aliases with no matching entry, in input order.
    pub unmatched: Vec<String>,
}

pub struct Catalog<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
}

impl<'a, R: Runtime> Catalog<'a, R> {
    pub fn new(runtime: &'a R, path: PathBuf) -> Self {
        Self { runtime, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All tracked packages in insertion order.
    #[tracing::instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<TrackedPackage>> {
        Ok(self.load()?.packages())
    }

    /// Partition `aliases` into tracked packages and unknown aliases.
    ///
    /// An alias matches an entry's alias first, then its canonical name.
    /// The `all` wildcard selects every entry.
    #[tracing::instrument(skip(self))]
    pub fn find_by_alias(&self, aliases: &[String]) -> Result<AliasMatch> {
        let packages = self.list()?;

        if aliases.iter().any(|a| a == ALL_ALIASES) {
            return Ok(AliasMatch {
                matched: packages,
                unmatched: vec![],
            });
        }

        let mut selected = vec![false; packages.len()];
        let mut unmatched: Vec<String> = Vec::new();

        for alias in aliases {
            let by_alias: Vec<usize> = positions(&packages, |p| p.alias() == alias);
            let hits = if by_alias.is_empty() {
                positions(&packages, |p| p.name() == alias)
            } else {
                by_alias
            };

            if hits.is_empty() {
                if !unmatched.contains(alias) {
                    unmatched.push(alias.clone());
                }
                continue;
            }
            for i in hits {
                selected[i] = true;
            }
        }

        let matched = packages
            .into_iter()
            .zip(selected)
            .filter_map(|(pkg, keep)| keep.then_some(pkg))
            .collect();

        Ok(AliasMatch { matched, unmatched })
    }

    /// Track new packages and return how many were added.
    ///
    /// Candidates whose URL is already tracked are dropped silently. A new
    /// candidate whose alias is already in use fails the whole call without
    /// writing anything.
    #[tracing::instrument(skip(self, candidates))]
    pub fn add(&self, candidates: &[TrackedPackage]) -> Result<usize> {
        let mut document = self.load()?;
        let existing = document.packages.len();

        for candidate in candidates {
            if document
                .packages
                .iter()
                .any(|e| e.url.trim() == candidate.url())
            {
                debug!("{} is already tracked, skipping", candidate.url());
                continue;
            }
            if let Some(owner) = document
                .packages
                .iter()
                .find(|e| entry_alias(e).as_deref() == Some(candidate.alias()))
            {
                return Err(Error::AliasTaken {
                    alias: candidate.alias().to_string(),
                    url: owner.url.trim().to_string(),
                }
                .into());
            }
            document.packages.push(CatalogEntry::from(candidate));
        }

        let added = document.packages.len() - existing;
        if added > 0 {
            self.save(&document)?;
        }
        Ok(added)
    }

    /// Stop tracking the given packages (matched by URL).
    ///
    /// Every other entry is written back as it was read.
    #[tracing::instrument(skip(self, targets))]
    pub fn remove(&self, targets: &[TrackedPackage]) -> Result<()> {
        let mut document = self.load()?;
        document
            .packages
            .retain(|e| !targets.iter().any(|t| t.url() == e.url.trim()));
        self.save(&document)
    }

    /// Change the alias of a tracked package.
    #[tracing::instrument(skip(self))]
    pub fn rename(&self, alias: &str, new_alias: &str) -> Result<TrackedPackage> {
        validate_alias(new_alias)?;
        let mut document = self.load()?;

        let (index, package) = document
            .indexed_packages()
            .into_iter()
            .find(|(_, p)| p.alias() == alias)
            .ok_or_else(|| Error::UnknownAlias(alias.to_string()))?;

        if let Some(owner) = document
            .packages
            .iter()
            .enumerate()
            .find(|(i, e)| *i != index && entry_alias(e).as_deref() == Some(new_alias))
            .map(|(_, e)| e)
        {
            return Err(Error::AliasTaken {
                alias: new_alias.to_string(),
                url: owner.url.trim().to_string(),
            }
            .into());
        }

        let renamed = package.with_alias(new_alias)?;
        document.packages[index] = CatalogEntry::from(&renamed);
        self.save(&document)?;
        Ok(renamed)
    }

    fn load(&self) -> Result<CatalogDocument> {
        if !self.runtime.exists(&self.path) {
            debug!("No catalog at {:?}, starting empty", self.path);
            return Ok(CatalogDocument::default());
        }

        let content = self
            .runtime
            .read_to_string(&self.path)
            .with_context(|| format!("Failed to read catalog {:?}", self.path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog {:?}", self.path))
    }

    /// Write to a sibling temp file, then rename over the catalog.
    fn save(&self, document: &CatalogDocument) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !self.runtime.exists(parent)
        {
            self.runtime.create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(document)?;
        let temp_path = self.path.with_extension("json.tmp");
        self.runtime
            .write(&temp_path, content.as_bytes())
            .with_context(|| format!("Failed to write catalog to {:?}", temp_path))?;
        self.runtime
            .rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to save catalog to {:?}", self.path))?;

        debug!("Saved {} entries to {:?}", document.packages.len(), self.path);
        Ok(())
    }
}

/// Alias an entry answers to, falling back to the raw stored alias when the
/// entry does not parse.
fn entry_alias(entry: &CatalogEntry) -> Option<String> {
    match entry.to_package() {
        Ok(pkg) => Some(pkg.alias().to_string()),
        Err(_) => entry
            .alias
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(String::from),
    }
}

fn positions(packages: &[TrackedPackage], pred: impl Fn(&TrackedPackage) -> bool) -> Vec<usize> {
    packages
        .iter()
        .enumerate()
        .filter(|(_, p)| pred(p))
        .map(|(i, _)| i)
        .collect()
}
