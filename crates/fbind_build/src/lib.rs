//! Rebuilds Fortran shared libraries whose sources changed.
//!
//! For every library in a [`ModuleMap`](fbind_config::ModuleMap) the artifact's
//! modification time is compared with its sources; stale artifacts are rebuilt
//! with a single compiler invocation, fresh ones are left alone.

#![warn(missing_docs)]

pub mod compiler;
pub mod error;
pub mod orchestrator;
pub mod staleness;

pub use compiler::{CompileCommand, CompileOutput, SHARED_LIBRARY_FLAGS};
pub use error::BuildError;
pub use orchestrator::{
    build, build_with, local_dir, plan, BuildReport, LibraryOutcome, LibraryStatus,
};
pub use staleness::{check_staleness, is_stale, Staleness};
