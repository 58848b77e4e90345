//! fbind CLI: builds Fortran shared libraries and calls into them.
//!
//! Provides `fbind init` for project scaffolding, `fbind build` to recompile
//! stale libraries, `fbind status` to report staleness without building,
//! `fbind symbols` to list a library's exports and `fbind call` to invoke a
//! routine with literal arguments.

#![warn(missing_docs)]

mod build;
mod call;
mod host;
mod init;
mod pipeline;
mod status;
mod symbols;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// fbind: incremental Fortran builds and foreign calls.
#[derive(Parser, Debug)]
#[command(name = "fbind", version, about = "Build and call Fortran shared libraries")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Configuration file to use, or a directory holding `fbind.toml`.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new fbind project.
    Init {
        /// Project name (creates a subdirectory). If omitted, initializes in
        /// the current directory.
        name: Option<String>,

        /// Directory for Fortran sources and built libraries, relative to the project.
        #[arg(short, long, default_value = "fortran")]
        path: String,
    },
    /// Recompile every library whose sources changed.
    Build(BuildArgs),
    /// Report which libraries are stale without building.
    Status(StatusArgs),
    /// List the exported symbols of a library.
    Symbols(SymbolsArgs),
    /// Call a routine of a library with literal arguments.
    Call(CallArgs),
}

/// Toolchain overrides shared by `build` and `status`.
#[derive(Parser, Debug, Default)]
pub struct ToolchainArgs {
    /// Compiler to use instead of the configured one.
    #[arg(long)]
    pub compiler: Option<String>,

    /// Compiler flags, as one string, replacing the configured ones.
    #[arg(long, allow_hyphen_values = true)]
    pub flags: Option<String>,

    /// Resolve the toolchain as if running on this host.
    #[arg(long)]
    pub host: Option<String>,
}

/// Arguments for the `fbind build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Toolchain overrides.
    #[command(flatten)]
    pub toolchain: ToolchainArgs,
}

/// Arguments for the `fbind status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Exit with status 1 if any library is stale.
    #[arg(long)]
    pub check: bool,

    /// Toolchain overrides.
    #[command(flatten)]
    pub toolchain: ToolchainArgs,
}

/// Arguments for the `fbind symbols` subcommand.
#[derive(Parser, Debug)]
pub struct SymbolsArgs {
    /// Library name from `fbind.toml`, or a path to a shared library.
    pub library: String,

    /// Only list symbols containing this substring.
    pub filter: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `fbind call` subcommand.
#[derive(Parser, Debug)]
pub struct CallArgs {
    /// Library name from `fbind.toml`, or a path to a shared library.
    pub library: String,

    /// Substring identifying exactly one exported routine.
    pub symbol: String,

    /// Arguments as `type:value` literals (`i32:4`, `f64:0.5`, `f64[]:1,2,3`).
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    init_logging(&global);

    let result = match cli.command {
        Command::Init { name, path } => init::run(name, &path),
        Command::Build(ref args) => build::run(args, &global),
        Command::Status(ref args) => status::run(args, &global),
        Command::Symbols(ref args) => symbols::run(args, &global),
        Command::Call(ref args) => call::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the level chosen by flags.
fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(global)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .compact()
        .try_init()
        .ok();
}

fn default_log_level(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn global(quiet: bool, verbose: bool) -> GlobalArgs {
        GlobalArgs {
            quiet,
            verbose,
            color: false,
            config: None,
        }
    }

    #[test]
    fn parse_init_default() {
        let cli = Cli::parse_from(["fbind", "init"]);
        match cli.command {
            Command::Init { name, path } => {
                assert!(name.is_none());
                assert_eq!(path, "fortran");
            }
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn parse_init_with_args() {
        let cli = Cli::parse_from(["fbind", "init", "ocean", "--path", "src"]);
        match cli.command {
            Command::Init { name, path } => {
                assert_eq!(name.as_deref(), Some("ocean"));
                assert_eq!(path, "src");
            }
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn parse_build_default() {
        let cli = Cli::parse_from(["fbind", "build"]);
        match cli.command {
            Command::Build(ref args) => {
                assert!(args.toolchain.compiler.is_none());
                assert!(args.toolchain.flags.is_none());
                assert!(args.toolchain.host.is_none());
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_build_overrides() {
        let cli = Cli::parse_from([
            "fbind",
            "build",
            "--compiler",
            "ifx",
            "--flags",
            "-O2 -g",
            "--host",
            "irene190",
        ]);
        match cli.command {
            Command::Build(ref args) => {
                assert_eq!(args.toolchain.compiler.as_deref(), Some("ifx"));
                assert_eq!(args.toolchain.flags.as_deref(), Some("-O2 -g"));
                assert_eq!(args.toolchain.host.as_deref(), Some("irene190"));
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_status_json_check() {
        let cli = Cli::parse_from(["fbind", "status", "--format", "json", "--check"]);
        match cli.command {
            Command::Status(ref args) => {
                assert_eq!(args.format, ReportFormat::Json);
                assert!(args.check);
            }
            _ => panic!("expected Status command"),
        }
    }

    #[test]
    fn parse_symbols_with_filter() {
        let cli = Cli::parse_from(["fbind", "symbols", "core", "MOD_"]);
        match cli.command {
            Command::Symbols(ref args) => {
                assert_eq!(args.library, "core");
                assert_eq!(args.filter.as_deref(), Some("MOD_"));
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Symbols command"),
        }
    }

    #[test]
    fn parse_call_literals() {
        let cli = Cli::parse_from([
            "fbind", "call", "core", "step", "i32:3", "f64:-0.5", "f64[]:1,2,3",
        ]);
        match cli.command {
            Command::Call(ref args) => {
                assert_eq!(args.library, "core");
                assert_eq!(args.symbol, "step");
                assert_eq!(args.args, ["i32:3", "f64:-0.5", "f64[]:1,2,3"]);
            }
            _ => panic!("expected Call command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["fbind", "--quiet", "--color", "never", "build"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["fbind", "--config", "/path/to/fbind.toml", "status"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/fbind.toml"));
    }

    #[test]
    fn log_level_follows_flags() {
        assert_eq!(default_log_level(&global(true, false)), "error");
        assert_eq!(default_log_level(&global(false, true)), "debug");
        assert_eq!(default_log_level(&global(false, false)), "warn");
    }
}
