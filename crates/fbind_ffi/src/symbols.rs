//! Symbol-table inspection with an `nm`-style tool.
//!
//! Fortran compilers decorate routine names (`step_`, `__ocean_MOD_step`), so
//! routines are looked up by substring against the library's defined
//! external symbols, and the lookup must match exactly one of them.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::FfiError;

/// One line of `nm` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    /// Symbol value, absent for undefined symbols.
    pub address: Option<u64>,
    /// The `nm` type letter (`T`, `D`, `U`, ...).
    pub kind: char,
    /// The symbol name, exactly as the loader knows it.
    pub name: String,
}

impl SymbolEntry {
    /// Returns `true` for global symbols the library itself defines.
    pub fn is_defined_export(&self) -> bool {
        self.kind.is_ascii_uppercase() && self.kind != 'U'
    }
}

/// The parsed symbol table of one library.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    library: PathBuf,
    entries: Vec<SymbolEntry>,
}

impl SymbolTable {
    /// Runs `tool` on `library` and parses its output.
    ///
    /// If the plain listing has no exports (a stripped library), the dynamic
    /// symbol table is listed instead with `-D`.
    pub fn read(tool: &str, library: &Path) -> Result<Self, FfiError> {
        let table = Self::parse(library, &run_tool(tool, &[], library)?);
        if table.exports().next().is_some() {
            return Ok(table);
        }
        tracing::debug!(library = %library.display(), "no static symbols, listing dynamic table");
        Ok(Self::parse(library, &run_tool(tool, &["-D"], library)?))
    }

    /// Parses `nm` output for `library`.
    ///
    /// Lines that do not look like symbol lines (headers, blank lines) are skipped.
    pub fn parse(library: &Path, output: &str) -> Self {
        let entries = output.lines().filter_map(parse_line).collect();
        Self {
            library: library.to_path_buf(),
            entries,
        }
    }

    /// The library this table belongs to.
    pub fn library(&self) -> &Path {
        &self.library
    }

    /// Every parsed entry, in tool order.
    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    /// Defined external symbols.
    pub fn exports(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.entries.iter().filter(|e| e.is_defined_export())
    }

    /// Names of defined external symbols containing `substring`, without duplicates.
    pub fn matching(&self, substring: &str) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in self.exports() {
            if entry.name.contains(substring) && !names.contains(&entry.name.as_str()) {
                names.push(&entry.name);
            }
        }
        names
    }

    /// The single export containing `substring`.
    ///
    /// Fails with [`FfiError::SymbolNotFound`] when nothing matches and with
    /// [`FfiError::SymbolAmbiguous`] listing the candidates when several do.
    pub fn find_unique(&self, substring: &str) -> Result<&str, FfiError> {
        match self.matching(substring).as_slice() {
            [] => Err(FfiError::SymbolNotFound {
                symbol: substring.to_string(),
                library: self.library.clone(),
            }),
            [name] => Ok(name),
            many => Err(FfiError::SymbolAmbiguous {
                symbol: substring.to_string(),
                library: self.library.clone(),
                candidates: many.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }
}

/// Parses `<address> <kind> <name>` or `<kind> <name>` (undefined symbols).
fn parse_line(line: &str) -> Option<SymbolEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let (address, kind, name) = match fields.as_slice() {
        [address, kind, name] => (Some(u64::from_str_radix(address, 16).ok()?), *kind, *name),
        [kind, name] => (None, *kind, *name),
        _ => return None,
    };
    let mut chars = kind.chars();
    let kind = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    Some(SymbolEntry {
        address,
        kind,
        name: name.to_string(),
    })
}

fn run_tool(tool: &str, extra: &[&str], library: &Path) -> Result<String, FfiError> {
    let failed = |reason: String| FfiError::SymbolToolFailed {
        tool: tool.to_string(),
        library: library.to_path_buf(),
        reason,
    };

    let output = Command::new(tool)
        .args(extra)
        .arg(library)
        .output()
        .map_err(|e| failed(e.to_string()))?;

    if !output.status.success() {
        return Err(failed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NM_OUTPUT: &str = "\
0000000000004030 b completed.0
                 w __cxa_finalize@GLIBC_2.2.5
0000000000001139 T __ocean_MOD_step
00000000000011a0 T __ocean_MOD_substep
0000000000001200 T compute_fluxes_
0000000000004020 D __ocean_MOD_gravity
                 U _gfortran_runtime_error_at
                 U _gfortran_step_counter
";

    fn table() -> SymbolTable {
        SymbolTable::parse(Path::new("libocean"), NM_OUTPUT)
    }

    #[test]
    fn parses_defined_and_undefined_lines() {
        let t = table();
        assert_eq!(t.entries().len(), 8);
        assert_eq!(
            t.entries()[2],
            SymbolEntry {
                address: Some(0x1139),
                kind: 'T',
                name: "__ocean_MOD_step".to_string(),
            }
        );
        assert_eq!(t.entries()[6].address, None);
        assert_eq!(t.entries()[6].kind, 'U');
    }

    #[test]
    fn exports_skip_local_and_undefined() {
        let names: Vec<_> = table().exports().map(|e| e.name.clone()).collect();
        assert_eq!(
            names,
            [
                "__ocean_MOD_step",
                "__ocean_MOD_substep",
                "compute_fluxes_",
                "__ocean_MOD_gravity",
            ]
        );
    }

    #[test]
    fn unique_substring_resolves_full_name() {
        assert_eq!(table().find_unique("fluxes").unwrap(), "compute_fluxes_");
    }

    #[test]
    fn undefined_symbols_do_not_match() {
        // Only `_gfortran_step_counter` (undefined) and the two exports contain "step".
        assert_eq!(
            table().matching("step"),
            ["__ocean_MOD_step", "__ocean_MOD_substep"]
        );
        assert!(matches!(
            table().find_unique("runtime_error"),
            Err(FfiError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn missing_symbol_is_not_found() {
        let err = table().find_unique("advect").unwrap_err();
        match err {
            FfiError::SymbolNotFound { symbol, library } => {
                assert_eq!(symbol, "advect");
                assert_eq!(library, PathBuf::from("libocean"));
            }
            other => panic!("expected SymbolNotFound, got {other:?}"),
        }
    }

    #[test]
    fn several_matches_are_ambiguous() {
        let err = table().find_unique("MOD_").unwrap_err();
        match err {
            FfiError::SymbolAmbiguous { candidates, .. } => {
                assert_eq!(
                    candidates,
                    [
                        "__ocean_MOD_step",
                        "__ocean_MOD_substep",
                        "__ocean_MOD_gravity",
                    ]
                );
            }
            other => panic!("expected SymbolAmbiguous, got {other:?}"),
        }
    }

    #[test]
    fn header_and_blank_lines_are_ignored() {
        let t = SymbolTable::parse(
            Path::new("lib"),
            "\nlib.o:\n0000000000000000 T kernel_\n",
        );
        assert_eq!(t.entries().len(), 1);
        assert_eq!(t.find_unique("kernel").unwrap(), "kernel_");
    }

    #[test]
    fn missing_tool_is_reported() {
        let err = SymbolTable::read("fbind-no-such-nm", Path::new("lib")).unwrap_err();
        assert!(matches!(err, FfiError::SymbolToolFailed { .. }));
    }
}
