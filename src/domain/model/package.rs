use std::fmt;

use percent_encoding::percent_decode_str;

use crate::catalog::ALL_ALIASES;
use crate::error::Error;

/// A remote package the user tracks locally.
///
/// Identified by its source URL; the alias is the user-facing key used on the
/// command line and is unique within a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedPackage {
    url: String,
    name: String,
    alias: String,
    rating: Option<f64>,
}

impl TrackedPackage {
    /// Create a package from its source URL.
    ///
    /// The canonical name is the URL's last path segment. When `alias` is
    /// `None` it defaults to the canonical name.
    pub fn new(url: &str, alias: Option<&str>, rating: Option<f64>) -> Result<Self, Error> {
        let url = url.trim();
        let name = last_segment(url, 0)
            .filter(|name| is_safe_dir_name(name))
            .ok_or_else(|| Error::InvalidUrl(url.to_string()))?;

        let alias = match alias {
            Some(alias) => {
                let alias = alias.trim();
                validate_alias(alias)?;
                alias.to_string()
            }
            None => name.clone(),
        };

        Ok(Self {
            url: url.to_string(),
            name,
            alias,
            rating,
        })
    }

    /// Rebuild a package read back from the catalog.
    ///
    /// The stored alias is kept as is; only aliases entered by the user go
    /// through [`validate_alias`].
    pub fn restore(url: &str, alias: Option<&str>, rating: Option<f64>) -> Result<Self, Error> {
        let mut pkg = Self::new(url, None, rating)?;
        if let Some(alias) = alias.map(str::trim).filter(|a| !a.is_empty()) {
            pkg.alias = alias.to_string();
        }
        Ok(pkg)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Canonical package name, also the name of the package's output directory.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn rating(&self) -> Option<f64> {
        self.rating
    }

    /// The URL segment before the canonical name (e.g. `github` in
    /// `https://host/github/com.github.android`).
    pub fn slug(&self) -> String {
        last_segment(&self.url, 1).unwrap_or_default()
    }

    /// Human readable name derived from the slug: `my-cool-app` -> `My Cool App`.
    pub fn display_name(&self) -> String {
        unslugify(&self.slug())
    }

    /// Same package with a different alias.
    pub fn with_alias(&self, alias: &str) -> Result<Self, Error> {
        Self::new(&self.url, Some(alias), self.rating)
    }
}

impl fmt::Display for TrackedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.alias)?;
        if self.alias != self.name {
            write!(f, "({})", self.name)?;
        }
        let display_name = self.display_name();
        if !display_name.is_empty() {
            write!(f, ": {}", display_name)?;
        }
        if let Some(rating) = self.rating {
            write!(f, " ({}★)", rating)?;
        }
        Ok(())
    }
}

/// Aliases end up as CLI arguments, possibly comma separated, and `all` is
/// reserved as the select-everything wildcard.
pub fn validate_alias(alias: &str) -> Result<(), Error> {
    if alias.is_empty()
        || alias == ALL_ALIASES
        || alias.contains(',')
        || alias.chars().any(char::is_whitespace)
    {
        return Err(Error::InvalidAlias(alias.to_string()));
    }
    Ok(())
}

/// Percent-decoded path segment, counted from the end (`0` = last).
fn last_segment(url: &str, from_end: usize) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let segment = path
        .trim_end_matches('/')
        .rsplit('/')
        .nth(from_end)
        .filter(|s| !s.is_empty() && !s.ends_with(':'))?;
    Some(percent_decode_str(segment).decode_utf8_lossy().into_owned())
}

fn is_safe_dir_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn unslugify(slug: &str) -> String {
    slug.split(['-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
