//! Pull orchestration: bounded-concurrency download of tracked packages'
//! newest versions into `{output}/{name}/{tag}.{ext}`.

mod finalizer;
mod progress;
mod puller;

pub use finalizer::Finalizer;
pub use progress::ProgressReporter;
pub use puller::{PullOptions, Puller};

/// Upper bound for `--threads`.
pub const MAX_WORKERS: usize = 10;

/// Extensions of finalized artifacts. Anything else in a package directory is stale.
pub const ARTIFACT_EXTENSIONS: &[&str] = &["apk", "xapk", "apks"];
