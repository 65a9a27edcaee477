pub mod outcome;
pub mod package;
pub mod version;

pub use outcome::*;
pub use package::*;
pub use version::*;
