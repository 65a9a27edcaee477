use anyhow::Result;
use log::debug;

use crate::application::{InventoryAction, TrackAction};
use crate::runtime::Runtime;

use super::config::Config;
use super::print_unmatched;

/// List tracked packages with their local versions.
#[tracing::instrument(skip(runtime, config))]
pub fn list<R: Runtime>(runtime: &R, config: &Config) -> Result<()> {
    let packages = InventoryAction::new(runtime, &config.catalog_path, &config.output_dir).list()?;
    if packages.is_empty() {
        println!("No packages tracked.");
        return Ok(());
    }

    debug!("Found {} tracked package(s)", packages.len());
    for local in packages {
        println!("{}", local.package);
        if local.versions.is_empty() {
            println!("  (no local versions)");
        }
        for version in &local.versions {
            println!("  {}", version);
        }
    }
    Ok(())
}

#[tracing::instrument(skip(runtime, config))]
pub fn track<R: Runtime>(
    runtime: &R,
    config: &Config,
    url: &str,
    alias: Option<&str>,
) -> Result<()> {
    match TrackAction::new(runtime, &config.catalog_path).track(url, alias)? {
        Some(package) => println!("Tracking {}", package),
        None => println!("{} is already tracked.", url.trim()),
    }
    Ok(())
}

#[tracing::instrument(skip(runtime, config))]
pub fn untrack<R: Runtime>(runtime: &R, config: &Config, aliases: &[String]) -> Result<()> {
    let result = TrackAction::new(runtime, &config.catalog_path).untrack(aliases)?;
    for package in &result.matched {
        println!("Untracked {}", package);
    }
    print_unmatched(&result.unmatched);
    Ok(())
}

#[tracing::instrument(skip(runtime, config))]
pub fn rename<R: Runtime>(runtime: &R, config: &Config, alias: &str, new_alias: &str) -> Result<()> {
    let package = TrackAction::new(runtime, &config.catalog_path).rename(alias, new_alias)?;
    println!("Renamed {} to {}", alias, package);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::error::Error;
    use crate::runtime::RealRuntime;
    use tempfile::{TempDir, tempdir};

    fn config(dir: &TempDir) -> Config {
        Config {
            home: dir.path().to_path_buf(),
            catalog_path: dir.path().join("catalog.json"),
            output_dir: dir.path().join("output"),
            source_url: "http://localhost".into(),
        }
    }

    #[test]
    fn test_track_list_untrack() {
        let dir = tempdir().unwrap();
        let config = config(&dir);
        let runtime = RealRuntime;

        track(&runtime, &config, "https://x/app/com.github.android", Some("github")).unwrap();
        track(&runtime, &config, "https://x/app/com.github.android", None).unwrap();
        list(&runtime, &config).unwrap();

        let catalog = Catalog::new(&runtime, config.catalog_path.clone());
        assert_eq!(catalog.list().unwrap().len(), 1);

        untrack(&runtime, &config, &["github".to_string(), "ghost".to_string()]).unwrap();
        assert!(catalog.list().unwrap().is_empty());
    }

    #[test]
    fn test_rename_unknown_alias() {
        let dir = tempdir().unwrap();
        let config = config(&dir);
        let runtime = RealRuntime;

        let err = rename(&runtime, &config, "ghost", "new").unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::UnknownAlias("ghost".into()))
        );
    }

    #[test]
    fn test_untrack_without_aliases() {
        let dir = tempdir().unwrap();
        let config = config(&dir);
        let runtime = RealRuntime;

        let err = untrack(&runtime, &config, &[]).unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::NoAliases));
    }
}
