//! Build orchestration over a whole module map.
//!
//! Libraries are visited in key order. Each one is either reported up to date
//! or compiled with one compiler run; the first failing compile stops the
//! build.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fbind_config::{ModuleMap, Toolchain};

use crate::compiler::CompileCommand;
use crate::error::BuildError;
use crate::staleness::{check_staleness, Staleness};

/// What happened to one library during a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryStatus {
    /// The artifact was fresh; no process was spawned.
    UpToDate,
    /// The compiler ran successfully.
    Compiled {
        /// Wall-clock compile time.
        elapsed: Duration,
        /// The command line that was run.
        command: String,
    },
}

/// Per-library result of a build.
#[derive(Debug, Clone)]
pub struct LibraryOutcome {
    /// Library name, identical to the artifact's file name.
    pub library: String,
    /// Path of the artifact.
    pub artifact: PathBuf,
    /// Why the library was (or was not) rebuilt.
    pub staleness: Staleness,
    /// What the orchestrator did.
    pub status: LibraryStatus,
}

/// Outcomes of a completed build, in the order libraries were visited.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// One entry per library.
    pub outcomes: Vec<LibraryOutcome>,
}

impl BuildReport {
    /// Number of libraries that were compiled.
    pub fn compiled_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, LibraryStatus::Compiled { .. }))
            .count()
    }

    /// Number of libraries that were already up to date.
    pub fn up_to_date_count(&self) -> usize {
        self.outcomes.len() - self.compiled_count()
    }

    /// Total time spent in the compiler.
    pub fn compile_time(&self) -> Duration {
        self.outcomes
            .iter()
            .filter_map(|o| match o.status {
                LibraryStatus::Compiled { elapsed, .. } => Some(elapsed),
                LibraryStatus::UpToDate => None,
            })
            .sum()
    }
}

/// Builds every stale library of `modules` inside `dir` with `toolchain`.
pub fn build(
    modules: &ModuleMap,
    dir: &Path,
    toolchain: &Toolchain,
) -> Result<BuildReport, BuildError> {
    build_with(modules, dir, toolchain, |_| {})
}

/// Like [`build`], calling `observer` as soon as each library's outcome is known.
pub fn build_with<F>(
    modules: &ModuleMap,
    dir: &Path,
    toolchain: &Toolchain,
    mut observer: F,
) -> Result<BuildReport, BuildError>
where
    F: FnMut(&LibraryOutcome),
{
    let mut outcomes = Vec::with_capacity(modules.len());

    for (library, sources) in modules {
        let staleness = check_staleness(dir, library, sources.files());
        let artifact = dir.join(library);

        let status = if staleness.is_stale() {
            tracing::info!(library = %library, reason = %staleness, "rebuilding");
            let command = CompileCommand::new(toolchain, sources.files(), library, dir);
            let output = command.run()?;

            // Exit status 0 without an artifact still means the build failed.
            if !artifact.is_file() {
                return Err(BuildError::BuildFailed {
                    library: library.clone(),
                    exit_code: Some(0),
                    stderr: format!(
                        "{}compiler exited successfully but {} was not produced",
                        output.stderr,
                        artifact.display()
                    ),
                    command: command.command_line(),
                });
            }

            LibraryStatus::Compiled {
                elapsed: output.elapsed,
                command: command.command_line(),
            }
        } else {
            tracing::debug!(library = %library, "up to date");
            LibraryStatus::UpToDate
        };

        let outcome = LibraryOutcome {
            library: library.clone(),
            artifact,
            staleness,
            status,
        };
        observer(&outcome);
        outcomes.push(outcome);
    }

    Ok(BuildReport { outcomes })
}

/// Reports the staleness of every library without building anything.
pub fn plan(modules: &ModuleMap, dir: &Path) -> Vec<(String, Staleness)> {
    modules
        .iter()
        .map(|(library, sources)| {
            (
                library.clone(),
                check_staleness(dir, library, sources.files()),
            )
        })
        .collect()
}

/// Absolute directory containing `file`.
///
/// Relative paths are resolved against the current directory; symlinks are
/// not followed, and `file` does not need to exist.
pub fn local_dir(file: &Path) -> std::io::Result<PathBuf> {
    let absolute = if file.is_absolute() {
        file.to_path_buf()
    } else {
        std::env::current_dir()?.join(file)
    };
    Ok(absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(absolute))
}
