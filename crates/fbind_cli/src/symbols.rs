//! `fbind symbols`: list the exported symbols of a library.

use serde::Serialize;

use fbind_ffi::{SymbolEntry, SymbolTable};

use crate::pipeline::locate_library;
use crate::{GlobalArgs, ReportFormat, SymbolsArgs};

#[derive(Debug, Serialize)]
struct SymbolRow<'a> {
    name: &'a str,
    kind: char,
    address: Option<u64>,
}

/// Runs the `fbind symbols` command.
///
/// Returns exit code 1 when a filter is given and nothing matches it.
pub fn run(args: &SymbolsArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let target = locate_library(&args.library, global)?;
    let table = SymbolTable::read(&target.symbol_tool, &target.path)?;
    let entries = filtered(&table, args.filter.as_deref());

    match args.format {
        ReportFormat::Text => {
            for entry in &entries {
                println!("{}", text_line(entry));
            }
        }
        ReportFormat::Json => {
            let rows: Vec<SymbolRow<'_>> = entries
                .iter()
                .map(|e| SymbolRow {
                    name: &e.name,
                    kind: e.kind,
                    address: e.address,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    if entries.is_empty() {
        if let Some(filter) = &args.filter {
            if !global.quiet {
                eprintln!("no exported symbol of {} contains '{filter}'", target.path.display());
            }
            return Ok(1);
        }
    }
    Ok(0)
}

/// Exported symbols, optionally restricted to names containing `filter`.
fn filtered<'a>(table: &'a SymbolTable, filter: Option<&str>) -> Vec<&'a SymbolEntry> {
    table
        .exports()
        .filter(|e| filter.map_or(true, |f| e.name.contains(f)))
        .collect()
}

fn text_line(entry: &SymbolEntry) -> String {
    match entry.address {
        Some(address) => format!("{address:016x} {} {}", entry.kind, entry.name),
        None => format!("{:16} {} {}", "", entry.kind, entry.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn table() -> SymbolTable {
        SymbolTable::parse(
            Path::new("core"),
            "0000000000001139 T __core_MOD_step\n\
             0000000000001200 T flux_\n\
             0000000000000010 t local_helper\n\
             \x20                U _gfortran_stop_string\n",
        )
    }

    #[test]
    fn lists_only_exports() {
        let t = table();
        let names: Vec<_> = filtered(&t, None).into_iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["__core_MOD_step", "flux_"]);
    }

    #[test]
    fn filter_by_substring() {
        let t = table();
        let names: Vec<_> = filtered(&t, Some("MOD"))
            .into_iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, ["__core_MOD_step"]);
        assert!(filtered(&t, Some("advect")).is_empty());
    }

    #[test]
    fn text_line_format() {
        let t = table();
        let entry = &t.entries()[1];
        assert_eq!(text_line(entry), "0000000000001200 T flux_");

        let undefined = SymbolEntry {
            address: None,
            kind: 'U',
            name: "x".to_string(),
        };
        assert_eq!(text_line(&undefined), format!("{} U x", " ".repeat(16)));
    }
}
