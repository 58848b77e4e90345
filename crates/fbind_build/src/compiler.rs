//! Compiler invocation for one shared library.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use fbind_config::Toolchain;

use crate::error::BuildError;

/// Flags inserted after the toolchain flags to produce a shared library.
pub const SHARED_LIBRARY_FLAGS: [&str; 2] = ["-fPIC", "-shared"];

/// A fully assembled compiler command:
/// `<compiler> <flags...> -fPIC -shared <sources...> -o <library>`, run in `cwd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    library: String,
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
}

/// What a successful compiler run produced.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Wall-clock time spent in the compiler.
    pub elapsed: Duration,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error (warnings on success).
    pub stderr: String,
}

impl CompileCommand {
    /// Assembles the command that builds `library` from `sources` inside `dir`.
    pub fn new<S: AsRef<str>>(
        toolchain: &Toolchain,
        sources: &[S],
        library: &str,
        dir: &Path,
    ) -> Self {
        let mut args = toolchain.flags.clone();
        args.extend(SHARED_LIBRARY_FLAGS.iter().map(|s| s.to_string()));
        args.extend(sources.iter().map(|s| s.as_ref().to_string()));
        args.push("-o".to_string());
        args.push(library.to_string());

        Self {
            library: library.to_string(),
            program: toolchain.compiler.clone(),
            args,
            cwd: dir.to_path_buf(),
        }
    }

    /// The compiler program.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The working directory the compiler runs in.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The command as a single shell-like line, without the working directory.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs the compiler and waits for it.
    ///
    /// A non-zero exit status is an error carrying the captured stderr.
    pub fn run(&self) -> Result<CompileOutput, BuildError> {
        if !self.cwd.is_dir() {
            return Err(BuildError::Io {
                path: self.cwd.clone(),
                source: std::io::Error::new(ErrorKind::NotFound, "not a directory"),
            });
        }

        tracing::debug!(
            library = %self.library,
            cwd = %self.cwd.display(),
            command = %self.command_line(),
            "spawning compiler"
        );

        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.cwd)
            .output()
            .map_err(|source| {
                if source.kind() == ErrorKind::NotFound {
                    BuildError::CompilerNotFound {
                        compiler: self.program.clone(),
                        source,
                    }
                } else {
                    BuildError::Io {
                        path: self.cwd.clone(),
                        source,
                    }
                }
            })?;
        let elapsed = start.elapsed();

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            tracing::warn!(
                library = %self.library,
                exit_code = ?output.status.code(),
                "compiler failed"
            );
            return Err(BuildError::BuildFailed {
                library: self.library.clone(),
                exit_code: output.status.code(),
                stderr,
                command: self.command_line(),
            });
        }

        if !stderr.trim().is_empty() {
            tracing::debug!(library = %self.library, stderr = %stderr.trim_end(), "compiler diagnostics");
        }

        Ok(CompileOutput {
            elapsed,
            stdout,
            stderr,
        })
    }
}
