//! `fbind build`: recompile stale libraries of the project.

use std::path::Path;

use fbind_build::{LibraryOutcome, LibraryStatus};

use crate::pipeline::{bold, load_project, select_toolchain};
use crate::{BuildArgs, GlobalArgs};

/// Runs the `fbind build` command.
///
/// Visits every library of `[modules]`, compiling those whose artifact is
/// missing or older than a source. Returns exit code 0 on success; a failing
/// compile is returned as an error.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let (toolchain, origin) = select_toolchain(&project.config, &args.toolchain)?;
    let work_dir = project.work_dir();

    if !global.quiet {
        eprintln!(
            "   Building {} with {} ({origin})",
            project.config.project.name, toolchain.compiler
        );
    }

    if project.config.modules.is_empty() {
        eprintln!("warning: no [modules] declared in fbind.toml");
        return Ok(0);
    }

    let report = fbind_build::build_with(&project.config.modules, &work_dir, &toolchain, |outcome| {
        if !global.quiet {
            for line in outcome_lines(outcome, &work_dir, global.color) {
                eprintln!("{line}");
            }
        }
    })?;

    if !global.quiet {
        eprintln!(
            "    Finished {} compiled, {} up to date in {:.2}s",
            report.compiled_count(),
            report.up_to_date_count(),
            report.compile_time().as_secs_f64()
        );
    }

    Ok(0)
}

/// The status line of one library, followed by the commands run for it.
fn outcome_lines(outcome: &LibraryOutcome, work_dir: &Path, color: bool) -> Vec<String> {
    match &outcome.status {
        LibraryStatus::UpToDate => {
            vec![bold(&format!("{:>20}: [ok]", outcome.library), color)]
        }
        LibraryStatus::Compiled { elapsed, command } => vec![
            bold(
                &format!(
                    "{:>20}: [compiled in {:.2} s]",
                    outcome.library,
                    elapsed.as_secs_f64()
                ),
                color,
            ),
            format!("     cd {}", work_dir.display()),
            format!("     {command}"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use fbind_build::Staleness;

    fn outcome(status: LibraryStatus) -> LibraryOutcome {
        LibraryOutcome {
            library: "core".to_string(),
            artifact: PathBuf::from("/work/core"),
            staleness: Staleness::ArtifactMissing,
            status,
        }
    }

    #[test]
    fn up_to_date_line() {
        let lines = outcome_lines(&outcome(LibraryStatus::UpToDate), Path::new("/work"), false);
        assert_eq!(lines, [format!("{:>20}: [ok]", "core")]);
    }

    #[test]
    fn compiled_lines_show_commands() {
        let status = LibraryStatus::Compiled {
            elapsed: Duration::from_millis(1250),
            command: "gfortran -O2 -fPIC -shared core.f90 -o core".to_string(),
        };
        let lines = outcome_lines(&outcome(status), Path::new("/work"), false);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("core: [compiled in 1.25 s]"));
        assert_eq!(lines[0].len(), 20 + ": [compiled in 1.25 s]".len());
        assert_eq!(lines[1], "     cd /work");
        assert_eq!(lines[2], "     gfortran -O2 -fPIC -shared core.f90 -o core");
    }

    #[test]
    fn color_wraps_status_line_only() {
        let lines = outcome_lines(&outcome(LibraryStatus::UpToDate), Path::new("/w"), true);
        assert!(lines[0].starts_with("\x1b[1m"));
    }
}
