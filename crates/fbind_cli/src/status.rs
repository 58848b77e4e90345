//! `fbind status`: report library staleness without building.

use serde::Serialize;

use crate::pipeline::{bold, load_project, select_toolchain};
use crate::{GlobalArgs, ReportFormat, StatusArgs};

/// One library in the status report.
#[derive(Debug, Serialize)]
struct LibraryRow {
    library: String,
    sources: Vec<String>,
    stale: bool,
    reason: String,
}

/// The full status report.
#[derive(Debug, Serialize)]
struct StatusReport {
    project: String,
    directory: String,
    compiler: String,
    flags: Vec<String>,
    toolchain_origin: String,
    libraries: Vec<LibraryRow>,
}

/// Runs the `fbind status` command.
///
/// Returns exit code 0, or 1 with `--check` when any library is stale.
pub fn run(args: &StatusArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let (toolchain, origin) = select_toolchain(&project.config, &args.toolchain)?;
    let work_dir = project.work_dir();

    let libraries: Vec<LibraryRow> = fbind_build::plan(&project.config.modules, &work_dir)
        .into_iter()
        .map(|(library, staleness)| LibraryRow {
            sources: project.config.modules[&library].files().to_vec(),
            stale: staleness.is_stale(),
            reason: staleness.to_string(),
            library,
        })
        .collect();

    let report = StatusReport {
        project: project.config.project.name.clone(),
        directory: work_dir.display().to_string(),
        compiler: toolchain.compiler,
        flags: toolchain.flags,
        toolchain_origin: origin,
        libraries,
    };

    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                for line in text_lines(&report, global.color) {
                    println!("{line}");
                }
            }
        }
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report)?;
            println!("{json}");
        }
    }

    let stale = report.libraries.iter().filter(|l| l.stale).count();
    Ok(if args.check && stale > 0 { 1 } else { 0 })
}

fn text_lines(report: &StatusReport, color: bool) -> Vec<String> {
    let mut lines = vec![
        format!("     Project {} in {}", report.project, report.directory),
        format!(
            "   Toolchain {} {} ({})",
            report.compiler,
            report.flags.join(" "),
            report.toolchain_origin
        ),
    ];
    for row in &report.libraries {
        let status = if row.stale {
            format!("{:>20}: [stale: {}]", row.library, row.reason)
        } else {
            format!("{:>20}: [ok]", row.library)
        };
        lines.push(bold(&status, color));
    }
    lines
}
