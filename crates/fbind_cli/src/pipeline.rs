//! Shared helpers for CLI commands.
//!
//! Project root resolution, config loading, toolchain selection with command
//! line overrides, and locating a library artifact by name or path.

use std::path::{Path, PathBuf};

use fbind_config::{ProjectConfig, Toolchain, CONFIG_FILE};
use fbind_ffi::library::DEFAULT_SYMBOL_TOOL;

use crate::{GlobalArgs, ToolchainArgs};

/// A loaded project: its root, configuration and build directory.
pub struct Project {
    /// Directory containing the configuration file.
    pub root: PathBuf,
    /// The parsed configuration.
    pub config: ProjectConfig,
}

impl Project {
    /// Directory holding the sources and the built libraries.
    pub fn work_dir(&self) -> PathBuf {
        self.root.join(&self.config.project.path)
    }
}

/// Walks up from `start` looking for the nearest directory containing `fbind.toml`.
///
/// Returns the directory containing `fbind.toml`, or an error if none is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the configuration file from global CLI args.
///
/// `--config` may name a directory, which holds `fbind.toml`, or any other
/// path, which is the configuration file itself. Without it, walks up from
/// the current directory looking for `fbind.toml`.
pub fn resolve_config_file(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match &global.config {
        Some(config_path) => {
            let p = PathBuf::from(config_path);
            if p.is_dir() {
                Ok(p.join(CONFIG_FILE))
            } else {
                Ok(p)
            }
        }
        None => Ok(find_project_root(&std::env::current_dir()?)?.join(CONFIG_FILE)),
    }
}

/// Finds and loads the project.
///
/// The project root is the directory holding the configuration file.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    let file = resolve_config_file(global)?;
    let config = fbind_config::load_config_file(&file)?;
    let root = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tracing::debug!(
        config = %file.display(),
        project = %config.project.name,
        "loaded project"
    );
    Ok(Project { root, config })
}

/// Loads the project if there is one.
///
/// An explicit `--config` must load; without it, a missing `fbind.toml` is not an error.
pub fn try_load_project(global: &GlobalArgs) -> Result<Option<Project>, Box<dyn std::error::Error>> {
    if global.config.is_some() {
        return load_project(global).map(Some);
    }
    match find_project_root(&std::env::current_dir()?) {
        Ok(_) => load_project(global).map(Some),
        Err(_) => Ok(None),
    }
}

/// Picks the toolchain for a build, returning it with a description of its origin.
///
/// `--compiler` and `--flags` override the corresponding half of whatever
/// the configuration resolves to for the host.
pub fn select_toolchain(
    config: &ProjectConfig,
    overrides: &ToolchainArgs,
) -> Result<(Toolchain, String), Box<dyn std::error::Error>> {
    let hostname = match &overrides.host {
        Some(host) => host.clone(),
        None => crate::host::hostname()?,
    };
    let resolved = fbind_config::resolve_toolchain(config, &hostname);
    let mut toolchain = resolved.toolchain;
    let mut origin = resolved.origin.to_string();

    if let Some(compiler) = &overrides.compiler {
        toolchain.compiler = compiler.clone();
        origin = "command line".to_string();
    }
    if let Some(flags) = &overrides.flags {
        toolchain.flags = flags.split_whitespace().map(str::to_string).collect();
        origin = "command line".to_string();
    }

    tracing::debug!(host = %hostname, compiler = %toolchain.compiler, origin = %origin, "selected toolchain");
    Ok((toolchain, origin))
}

/// A library to inspect or call, and the tool that lists its symbols.
pub struct LibraryTarget {
    /// Path of the shared library.
    pub path: PathBuf,
    /// Symbol-table tool.
    pub symbol_tool: String,
}

/// Locates `name`: a library declared in the project, or else a file path.
pub fn locate_library(
    name: &str,
    global: &GlobalArgs,
) -> Result<LibraryTarget, Box<dyn std::error::Error>> {
    let project = try_load_project(global)?;

    let symbol_tool = project
        .as_ref()
        .map(|p| p.config.symbols.tool.clone())
        .unwrap_or_else(|| DEFAULT_SYMBOL_TOOL.to_string());

    let path = match &project {
        Some(p) if p.config.modules.contains_key(name) => p.work_dir().join(name),
        _ => PathBuf::from(name),
    };

    if !path.is_file() {
        return Err(format!("library {} does not exist; run `fbind build` first", path.display()).into());
    }

    Ok(LibraryTarget { path, symbol_tool })
}

/// Wraps `text` in bold escapes when `color` is on.
pub fn bold(text: &str, color: bool) -> String {
    if color {
        format!("\x1b[1m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}
