//! `fbind init`: project scaffolding command.
//!
//! Creates a project directory with an `fbind.toml` config file and a
//! Fortran source directory holding one template routine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fbind_config::CONFIG_FILE;

/// Name of the template library and its source file stem.
const TEMPLATE_LIBRARY: &str = "hello";

/// Runs the `fbind init` command.
///
/// If `name` is `Some`, creates a new subdirectory with that name.
/// Otherwise initializes in the current working directory.
/// Returns exit code 0 on success.
pub fn run(name: Option<String>, source_path: &str) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = match &name {
        Some(n) => {
            let dir = PathBuf::from(n);
            if dir.exists() {
                return Err(format!("directory '{}' already exists", n).into());
            }
            fs::create_dir_all(&dir)?;
            dir
        }
        None => std::env::current_dir()?,
    };

    if project_dir.join(CONFIG_FILE).exists() {
        return Err(format!("{} already exists", project_dir.join(CONFIG_FILE).display()).into());
    }

    let project_name = project_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("my_project");

    eprintln!("  Creating new fbind project `{project_name}`");

    let source_dir = project_dir.join(source_path);
    fs::create_dir_all(&source_dir)?;

    write_fbind_toml(&project_dir, project_name, source_path)?;
    write_template_source(&source_dir)?;

    eprintln!("     Created {}", project_dir.join(CONFIG_FILE).display());
    eprintln!(
        "     Created {}",
        source_dir.join(format!("{TEMPLATE_LIBRARY}.f90")).display()
    );

    Ok(0)
}

/// Writes the `fbind.toml` configuration file.
fn write_fbind_toml(root: &Path, name: &str, source_path: &str) -> io::Result<()> {
    let content = format!(
        r#"[project]
name = "{name}"
path = "{source_path}"

# library name = source file, or a list of source files compiled together
[modules]
{TEMPLATE_LIBRARY} = "{TEMPLATE_LIBRARY}.f90"

# Without [toolchain] the compiler is picked per host from [[hosts]] rules,
# falling back to a built-in gfortran preset.
# [toolchain]
# compiler = "gfortran"
# flags = ["-O2", "-cpp"]

[symbols]
tool = "nm"
"#
    );
    fs::write(root.join(CONFIG_FILE), content)
}

/// Writes the template Fortran routine.
fn write_template_source(dir: &Path) -> io::Result<()> {
    let content = format!(
        "! Call with: fbind call {TEMPLATE_LIBRARY} add_one i32:3 f64[]:1,2,3
subroutine add_one(n, x)
  implicit none
  integer :: n
  double precision :: x(n)
  x = x + 1
end subroutine add_one
"
    );
    fs::write(dir.join(format!("{TEMPLATE_LIBRARY}.f90")), content)
}
