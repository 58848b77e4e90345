//! Toolchain resolution: picking the compiler and flags for a given host.

use crate::types::{ProjectConfig, Toolchain};
use std::fmt;

/// Host-name substring selecting the Intel preset.
const INTEL_HOST_PATTERN: &str = "irene";

/// Where a resolved toolchain came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolchainOrigin {
    /// The `[toolchain]` table of `fbind.toml`.
    Project,
    /// A `[[hosts]]` rule, identified by its pattern.
    HostRule(String),
    /// A built-in preset.
    Preset,
}

impl fmt::Display for ToolchainOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolchainOrigin::Project => f.write_str("fbind.toml [toolchain]"),
            ToolchainOrigin::HostRule(pattern) => write!(f, "host rule '{pattern}'"),
            ToolchainOrigin::Preset => f.write_str("built-in preset"),
        }
    }
}

/// A toolchain together with the reason it was chosen.
#[derive(Debug, Clone)]
pub struct ResolvedToolchain {
    /// The selected compiler and flags.
    pub toolchain: Toolchain,
    /// Which configuration layer supplied it.
    pub origin: ToolchainOrigin,
}

/// Resolves the toolchain for `hostname`.
///
/// An explicit `[toolchain]` wins. Otherwise the first `[[hosts]]` rule whose
/// pattern occurs in `hostname` is used, and failing that the built-in preset
/// for the host.
pub fn resolve_toolchain(config: &ProjectConfig, hostname: &str) -> ResolvedToolchain {
    if let Some(toolchain) = &config.toolchain {
        return ResolvedToolchain {
            toolchain: toolchain.clone(),
            origin: ToolchainOrigin::Project,
        };
    }

    if let Some(rule) = config
        .hosts
        .iter()
        .find(|rule| hostname.contains(rule.pattern.as_str()))
    {
        return ResolvedToolchain {
            toolchain: rule.toolchain.clone(),
            origin: ToolchainOrigin::HostRule(rule.pattern.clone()),
        };
    }

    ResolvedToolchain {
        toolchain: builtin_toolchain(hostname),
        origin: ToolchainOrigin::Preset,
    }
}

/// Returns the built-in preset for `hostname`.
///
/// Hosts of the Irene supercomputer get the Intel compiler with AVX-512 code
/// paths and 8-byte default reals; every other host gets gfortran tuned for
/// the local CPU with the same real-kind promotion.
pub fn builtin_toolchain(hostname: &str) -> Toolchain {
    if hostname.contains(INTEL_HOST_PATTERN) {
        Toolchain::new(
            "ifort",
            ["-r8", "-O3", "-mavx2", "-axCORE-AVX512,MIC-AVX512", "-cpp"],
        )
    } else {
        Toolchain::new(
            "gfortran",
            [
                "-cpp",
                "-freal-4-real-8",
                "-Ofast",
                "-march=x86-64",
                "-mtune=native",
                "-ffast-math",
                "-ffree-line-length-none",
            ],
        )
    }
}
