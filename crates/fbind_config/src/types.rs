//! Configuration types deserialized from `fbind.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// The top-level project configuration parsed from `fbind.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata (name, build directory).
    pub project: ProjectMeta,
    /// Libraries to build, keyed by output library name.
    #[serde(default)]
    pub modules: ModuleMap,
    /// Explicit toolchain. When present it wins over host rules and presets.
    #[serde(default)]
    pub toolchain: Option<Toolchain>,
    /// Host-name rules selecting a toolchain, checked in order.
    #[serde(default)]
    pub hosts: Vec<HostRule>,
    /// Symbol-table inspection settings.
    #[serde(default)]
    pub symbols: SymbolConfig,
}

/// Core project metadata.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// Directory holding the Fortran sources and the built libraries,
    /// relative to the directory containing `fbind.toml`.
    #[serde(default = "default_project_path")]
    pub path: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

fn default_project_path() -> String {
    ".".to_string()
}

/// Mapping from library name (used verbatim as the artifact file name) to its sources.
pub type ModuleMap = BTreeMap<String, SourceList>;

/// The ordered source files of one library.
///
/// Accepts either `core = "core.f90"` or `core = ["kinds.f90", "core.f90"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SourceList(Vec<String>);

impl SourceList {
    /// Creates a source list from file names.
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(files.into_iter().map(Into::into).collect())
    }

    /// The file names, in declaration order.
    pub fn files(&self) -> &[String] {
        &self.0
    }

    /// Number of source files.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no source files are declared.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the file names.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl From<&str> for SourceList {
    fn from(file: &str) -> Self {
        Self(vec![file.to_string()])
    }
}

impl From<Vec<&str>> for SourceList {
    fn from(files: Vec<&str>) -> Self {
        Self::new(files)
    }
}

impl<'a> IntoIterator for &'a SourceList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for SourceList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StringOrVec;

        impl<'de> Visitor<'de> for StringOrVec {
            type Value = Vec<String>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a source file name or a list of source file names")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(vec![v.to_string()])
            }

            fn visit_seq<A: de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Self::Value, A::Error> {
                let mut vec = Vec::new();
                while let Some(val) = seq.next_element::<String>()? {
                    vec.push(val);
                }
                Ok(vec)
            }
        }

        deserializer.deserialize_any(StringOrVec).map(SourceList)
    }
}

/// A compiler program and the flags passed before the sources.
///
/// The shared-library flags (`-fPIC -shared`) and the output name are added by
/// the build orchestrator and do not belong here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Toolchain {
    /// Compiler program name or path (e.g., `"gfortran"`, `"/opt/intel/bin/ifort"`).
    pub compiler: String,
    /// Compiler flags, in order.
    ///
    /// Accepts a list of strings or one whitespace-separated string.
    #[serde(default, deserialize_with = "deserialize_flags")]
    pub flags: Vec<String>,
}

impl Toolchain {
    /// Creates a toolchain from a compiler and its flags.
    pub fn new<I, S>(compiler: impl Into<String>, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            compiler: compiler.into(),
            flags: flags.into_iter().map(Into::into).collect(),
        }
    }
}

/// Deserializes compiler flags from either a list or a single command-line string.
///
/// `flags = "-O3 -cpp"` and `flags = ["-O3", "-cpp"]` are equivalent.
fn deserialize_flags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagsVisitor;

    impl<'de> Visitor<'de> for FlagsVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a flag string or a list of flags")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.split_whitespace().map(str::to_string).collect())
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(FlagsVisitor)
}

/// Selects a toolchain for hosts whose name contains `pattern`.
#[derive(Debug, Clone, Deserialize)]
pub struct HostRule {
    /// Substring matched against the host name.
    pub pattern: String,
    /// The toolchain used on matching hosts.
    #[serde(flatten)]
    pub toolchain: Toolchain,
}

/// Settings for the symbol-table dump utility.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolConfig {
    /// Program used to list a library's symbols.
    #[serde(default = "default_symbol_tool")]
    pub tool: String,
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self {
            tool: default_symbol_tool(),
        }
    }
}

fn default_symbol_tool() -> String {
    "nm".to_string()
}
