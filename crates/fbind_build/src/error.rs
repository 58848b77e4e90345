//! Error types for library builds.

use std::path::PathBuf;

/// Errors that can occur while building libraries.
///
/// Staleness checks never produce errors; only running the compiler does.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The build directory could not be used as the compiler's working directory.
    #[error("build directory {path} is not accessible: {source}")]
    Io {
        /// The offending directory.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The compiler program could not be started.
    #[error("compiler '{compiler}' could not be started: {source}")]
    CompilerNotFound {
        /// The compiler program that was invoked.
        compiler: String,
        /// The underlying spawn error.
        source: std::io::Error,
    },

    /// The compiler ran and reported failure.
    #[error(
        "compiling '{library}' failed ({}){}\n\ncommand: {command}",
        exit_label(.exit_code),
        stderr_block(.stderr)
    )]
    BuildFailed {
        /// The library being built.
        library: String,
        /// The compiler's exit code, `None` if it was killed by a signal.
        exit_code: Option<i32>,
        /// Captured compiler diagnostics.
        stderr: String,
        /// The full command line.
        command: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

fn stderr_block(stderr: &str) -> String {
    let trimmed = stderr.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n\ncompiler stderr:\n{trimmed}")
    }
}
