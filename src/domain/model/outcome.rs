use std::fmt;
use std::path::PathBuf;

use super::{RemoteVersion, TrackedPackage};

/// One (package, version) download task within a pull run.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub package: TrackedPackage,
    pub version: RemoteVersion,
    /// Package output directory the artifact is finalized into.
    pub destination: PathBuf,
}

/// Terminal state of a work item.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Downloaded and finalized under the given file name.
    Completed { file: String },
    /// A finalized artifact for the tag was already present.
    Skipped { file: String },
    Failed { reason: String },
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Completed { file } => write!(f, "saved {}", file),
            Outcome::Skipped { file } => write!(f, "already present as {}", file),
            Outcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub version: RemoteVersion,
    pub destination: PathBuf,
    pub outcome: Outcome,
}

/// Result of pulling one package.
///
/// `error` is set when the version listing itself failed, in which case
/// `items` is empty.
#[derive(Debug, Clone)]
pub struct PackageOutcome {
    pub package: TrackedPackage,
    pub error: Option<String>,
    pub items: Vec<ItemOutcome>,
}

impl PackageOutcome {
    pub fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.items.iter().filter(|item| pred(&item.outcome)).count()
    }
}

/// Byte-level event emitted by the remote source while downloading one version.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    InProgress {
        received_bytes: u64,
        total_bytes: Option<u64>,
    },
    /// The transfer finished. `path` is the written file when the source knows it.
    Completed { path: Option<PathBuf> },
    Canceled { reason: String },
}
