use anyhow::{Result, bail};
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Default remote source.
pub const DEFAULT_SOURCE_URL: &str = "https://apkpure.com";

const HOME_DIR_NAME: &str = ".apkpull";
const CATALOG_FILE: &str = "catalog.json";
const OUTPUT_DIR: &str = "output";

/// Raw configuration values from flags or environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub home: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub source_url: Option<String>,
}

/// Resolved configuration, built once per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the catalog.
    pub home: PathBuf,
    pub catalog_path: PathBuf,
    /// Root of the per-package artifact directories.
    pub output_dir: PathBuf,
    pub source_url: String,
}

impl Config {
    pub fn new<R: Runtime>(runtime: &R, overrides: ConfigOverrides) -> Result<Self> {
        let home = match overrides.home {
            Some(home) => home,
            None => match runtime.home_dir() {
                Some(dir) => dir.join(HOME_DIR_NAME),
                None => bail!("Could not determine home directory; use --home or APKPULL_HOME"),
            },
        };
        check_dir(runtime, &home, "Home directory")?;

        let output_dir = overrides.output.unwrap_or_else(|| home.join(OUTPUT_DIR));
        check_dir(runtime, &output_dir, "Output directory")?;

        let source_url = overrides
            .source_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
        if !(source_url.starts_with("https://") || source_url.starts_with("http://")) {
            bail!("Source URL must start with http:// or https://, got '{}'", source_url);
        }

        let config = Self {
            catalog_path: home.join(CATALOG_FILE),
            home,
            output_dir,
            source_url,
        };
        debug!("Using configuration {:?}", config);
        Ok(config)
    }
}

fn check_dir<R: Runtime>(runtime: &R, path: &Path, what: &str) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("{} must not be empty", what);
    }
    if runtime.exists(path) && !runtime.is_dir(path) {
        bail!("{} {:?} exists but is not a directory", what, path);
    }
    Ok(())
}
