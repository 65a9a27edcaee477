use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::runtime::Runtime;

use super::ARTIFACT_EXTENSIONS;

/// Decides whether a version is already on disk and turns completed
/// downloads into `{tag}.{ext}` artifacts.
pub struct Finalizer<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> Finalizer<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// True if `dir` holds a finalized artifact for `tag`.
    pub fn is_satisfied(&self, dir: &Path, tag: &str) -> Result<bool> {
        Ok(self.existing(dir, tag)?.is_some())
    }

    /// File name of the finalized artifact for `tag`, if any.
    #[tracing::instrument(skip(self))]
    pub fn existing(&self, dir: &Path, tag: &str) -> Result<Option<String>> {
        Ok(self
            .files(dir)?
            .into_iter()
            .find(|path| {
                is_artifact(path) && path.file_stem().is_some_and(|stem| stem == tag)
            })
            .and_then(|path| file_name(&path)))
    }

    /// Remove every file in `dir` without a recognized artifact extension.
    /// Returns the removed paths.
    #[tracing::instrument(skip(self))]
    pub fn purge_stale(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for path in self.files(dir)? {
            if is_artifact(&path) {
                continue;
            }
            info!("Removing stale file {:?}", path);
            self.runtime
                .remove_file(&path)
                .with_context(|| format!("Failed to remove stale file {:?}", path))?;
            removed.push(path);
        }
        Ok(removed)
    }

    /// Rename the most recently modified file in `dir` to `{tag}.{ext}`.
    ///
    /// Files with equal modification times are ordered by name, the greatest
    /// name winning, so the choice never depends on directory listing order.
    #[tracing::instrument(skip(self))]
    pub fn finalize(&self, dir: &Path, tag: &str) -> Result<String> {
        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for path in self.files(dir)? {
            let modified = self
                .runtime
                .modified(&path)
                .with_context(|| format!("Failed to read modification time of {:?}", path))?;
            let candidate = (modified, path);
            if newest.as_ref().is_none_or(|current| candidate > *current) {
                newest = Some(candidate);
            }
        }

        let Some((_, file)) = newest else {
            bail!("No downloaded file found in {:?}", dir);
        };
        self.finalize_file(dir, tag, &file)
    }

    /// Rename `file` to `{dir}/{tag}.{ext}`, replacing any previous artifact
    /// of that name.
    #[tracing::instrument(skip(self))]
    pub fn finalize_file(&self, dir: &Path, tag: &str, file: &Path) -> Result<String> {
        let Some(ext) = file.extension().and_then(|e| e.to_str()) else {
            bail!("Downloaded file {:?} has no extension", file);
        };
        if !ARTIFACT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
            bail!("Downloaded file {:?} is not a recognized artifact", file);
        }

        let name = format!("{}.{}", tag, ext);
        let target = dir.join(&name);
        if target == file {
            return Ok(name);
        }

        if self.runtime.exists(&target) {
            debug!("Replacing existing artifact {:?}", target);
            self.runtime.remove_file(&target)?;
        }
        self.runtime
            .rename(file, &target)
            .with_context(|| format!("Failed to rename {:?} to {:?}", file, target))?;
        Ok(name)
    }

    /// Tags of the artifacts finalized in `dir`, sorted.
    pub fn local_tags(&self, dir: &Path) -> Result<Vec<String>> {
        let mut tags: Vec<String> = self
            .files(dir)?
            .into_iter()
            .filter(|path| is_artifact(path))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        tags.sort();
        Ok(tags)
    }

    /// Regular files directly inside `dir`; empty when `dir` does not exist.
    fn files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !self.runtime.exists(dir) {
            return Ok(Vec::new());
        }
        let entries = self
            .runtime
            .read_dir(dir)
            .with_context(|| format!("Failed to read directory {:?}", dir))?;
        Ok(entries
            .into_iter()
            .filter(|path| !self.runtime.is_dir(path))
            .collect())
    }
}

fn is_artifact(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ARTIFACT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use std::fs::{self, File};
    use std::time::Duration;
    use tempfile::tempdir;

    fn touch(path: &Path, age_secs: u64) {
        fs::write(path, path.to_string_lossy().as_bytes()).unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn test_is_satisfied_by_stem() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("v2.apk"), 0);
        touch(&dir.path().join("v3.apk.part"), 0);
        let runtime = RealRuntime;
        let finalizer = Finalizer::new(&runtime);

        assert!(finalizer.is_satisfied(dir.path(), "v2").unwrap());
        assert!(!finalizer.is_satisfied(dir.path(), "v1").unwrap());
        assert!(!finalizer.is_satisfied(dir.path(), "v3").unwrap());
        assert!(!finalizer.is_satisfied(dir.path(), "v3.apk").unwrap());
        assert_eq!(
            finalizer.existing(dir.path(), "v2").unwrap(),
            Some("v2.apk".to_string())
        );
    }

    #[test]
    fn test_is_satisfied_missing_dir() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let finalizer = Finalizer::new(&runtime);
        assert!(!finalizer.is_satisfied(&dir.path().join("nope"), "v1").unwrap());
    }

    #[test]
    fn test_local_tags() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("v2.apk"), 0);
        touch(&dir.path().join("v1.xapk"), 0);
        touch(&dir.path().join("x.apk.part"), 0);
        let runtime = RealRuntime;
        let finalizer = Finalizer::new(&runtime);

        assert_eq!(finalizer.local_tags(dir.path()).unwrap(), vec!["v1", "v2"]);
        assert!(finalizer
            .local_tags(&dir.path().join("missing"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_purge_stale() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("v1.apk"), 0);
        touch(&dir.path().join("v2.XAPK"), 0);
        touch(&dir.path().join("GitHub.apk.part"), 0);
        touch(&dir.path().join("notes"), 0);
        fs::create_dir(dir.path().join("sub")).unwrap();
        let runtime = RealRuntime;

        let mut removed = Finalizer::new(&runtime).purge_stale(dir.path()).unwrap();
        removed.sort();

        assert_eq!(
            removed,
            vec![
                dir.path().join("GitHub.apk.part"),
                dir.path().join("notes")
            ]
        );
        assert!(dir.path().join("v1.apk").exists());
        assert!(dir.path().join("v2.XAPK").exists());
        assert!(dir.path().join("sub").is_dir());
    }

    #[test]
    fn test_finalize_picks_newest() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("v1.apk"), 100);
        touch(&dir.path().join("GitHub_1.2.3.xapk"), 1);
        let runtime = RealRuntime;

        let name = Finalizer::new(&runtime)
            .finalize(dir.path(), "v1.2.3")
            .unwrap();

        assert_eq!(name, "v1.2.3.xapk");
        assert!(dir.path().join("v1.2.3.xapk").exists());
        assert!(!dir.path().join("GitHub_1.2.3.xapk").exists());
        assert!(dir.path().join("v1.apk").exists());
    }

    #[test]
    fn test_finalize_tie_breaks_by_name() {
        let dir = tempdir().unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(10);
        for name in ["b.apk", "a.apk"] {
            let path = dir.path().join(name);
            fs::write(&path, name).unwrap();
            File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(mtime)
                .unwrap();
        }
        let runtime = RealRuntime;

        Finalizer::new(&runtime).finalize(dir.path(), "v9").unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("v9.apk")).unwrap(), "b.apk");
        assert!(dir.path().join("a.apk").exists());
    }

    #[test]
    fn test_finalize_overwrites_existing_target() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("v1.apk"), 100);
        let fresh = dir.path().join("fresh.apk");
        fs::write(&fresh, "fresh").unwrap();
        let runtime = RealRuntime;

        let name = Finalizer::new(&runtime)
            .finalize_file(dir.path(), "v1", &fresh)
            .unwrap();

        assert_eq!(name, "v1.apk");
        assert_eq!(fs::read_to_string(dir.path().join("v1.apk")).unwrap(), "fresh");
        assert!(!fresh.exists());
    }

    #[test]
    fn test_finalize_file_already_in_place() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("v1.apk");
        fs::write(&file, "x").unwrap();
        let runtime = RealRuntime;

        let name = Finalizer::new(&runtime)
            .finalize_file(dir.path(), "v1", &file)
            .unwrap();
        assert_eq!(name, "v1.apk");
        assert!(file.exists());
    }

    #[test]
    fn test_finalize_rejects_unknown_extension() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let finalizer = Finalizer::new(&runtime);

        let no_ext = dir.path().join("download");
        fs::write(&no_ext, "x").unwrap();
        assert!(finalizer.finalize_file(dir.path(), "v1", &no_ext).is_err());

        let html = dir.path().join("error.html");
        fs::write(&html, "x").unwrap();
        assert!(finalizer.finalize_file(dir.path(), "v1", &html).is_err());
    }

    #[test]
    fn test_finalize_empty_dir() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        assert!(Finalizer::new(&runtime).finalize(dir.path(), "v1").is_err());
    }

    #[test]
    fn test_finalize_rename_failure() {
        let mut runtime = MockRuntime::new();
        let dir = PathBuf::from("/out/pkg");
        let file = PathBuf::from("/out/pkg/tmp.apk");

        runtime
            .expect_exists()
            .withf(|p| p == Path::new("/out/pkg/v1.apk"))
            .returning(|_| false);
        runtime
            .expect_rename()
            .returning(|_, _| anyhow::bail!("permission denied"));

        let err = Finalizer::new(&runtime)
            .finalize_file(&dir, "v1", &file)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("permission denied"));
    }
}
