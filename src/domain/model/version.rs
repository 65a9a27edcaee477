use std::fmt;

use crate::error::Error;

use super::TrackedPackage;

/// A version listed by the remote source for one package.
///
/// Versions are never persisted; they live for a single `info` or `pull` run.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteVersion {
    /// Canonical name of the owning package.
    package: String,
    url: String,
    tag: String,
    published_at: String,
}

impl RemoteVersion {
    /// Build a version of `package`, normalizing `tag` into a file stem.
    pub fn new(
        package: &TrackedPackage,
        url: &str,
        tag: &str,
        published_at: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            package: package.name().to_string(),
            url: url.to_string(),
            tag: normalize_tag(tag)?,
            published_at: published_at.to_string(),
        })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whitespace-free tag, used as the on-disk file stem.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn published_at(&self) -> &str {
        &self.published_at
    }
}

impl fmt::Display for RemoteVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.package, self.tag)
    }
}

/// Strip whitespace and path separators so the tag is usable as a file stem.
pub fn normalize_tag(raw: &str) -> Result<String, Error> {
    let tag: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();

    if tag.is_empty() || tag.chars().all(|c| c == '.') {
        return Err(Error::InvalidTag(raw.to_string()));
    }
    Ok(tag)
}
