//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "fbind.toml";

/// Loads and validates an `fbind.toml` configuration from a project directory.
///
/// Reads `<project_dir>/fbind.toml`, parses it, and validates required fields.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates the configuration stored in `path`, whatever its file name.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, &path.display().to_string())
}

/// Parses and validates an `fbind.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    parse_config(content, "inline configuration")
}

fn parse_config(content: &str, origin: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and configuration values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.project.path.is_empty() {
        return Err(ConfigError::MissingField("project.path".to_string()));
    }

    for (library, sources) in &config.modules {
        let invalid = |reason: &str| ConfigError::InvalidModule {
            module: library.clone(),
            reason: reason.to_string(),
        };
        if library.trim().is_empty() {
            return Err(invalid("library name is blank"));
        }
        if sources.is_empty() {
            return Err(invalid("no source files"));
        }
        if sources.iter().any(|s| s.trim().is_empty()) {
            return Err(invalid("blank source file name"));
        }
    }

    if let Some(toolchain) = &config.toolchain {
        if toolchain.compiler.is_empty() {
            return Err(ConfigError::MissingField("toolchain.compiler".to_string()));
        }
    }

    for rule in &config.hosts {
        if rule.pattern.is_empty() {
            return Err(ConfigError::MissingField("hosts.pattern".to_string()));
        }
        if rule.toolchain.compiler.is_empty() {
            return Err(ConfigError::MissingField(format!(
                "hosts.compiler for pattern '{}'",
                rule.pattern
            )));
        }
    }

    if config.symbols.tool.is_empty() {
        return Err(ConfigError::MissingField("symbols.tool".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[project]
name = "ocean"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.name, "ocean");
        assert_eq!(config.project.path, ".");
        assert!(config.modules.is_empty());
        assert!(config.toolchain.is_none());
        assert!(config.hosts.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[project]
name = "ocean"
description = "shallow water kernels"
path = "fortran"

[modules]
core = "core.f90"
fluxes = ["kinds.f90", "fluxes.f90"]

[toolchain]
compiler = "gfortran"
flags = ["-O2", "-cpp"]

[[hosts]]
pattern = "irene"
compiler = "ifort"
flags = "-r8 -O3"

[symbols]
tool = "llvm-nm"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.name, "ocean");
        assert_eq!(config.project.path, "fortran");
        assert_eq!(config.project.description, "shallow water kernels");
        assert_eq!(config.modules.len(), 2);
        assert_eq!(config.modules["fluxes"].len(), 2);
        assert_eq!(config.toolchain.as_ref().unwrap().compiler, "gfortran");
        assert_eq!(config.hosts[0].toolchain.flags, ["-r8", "-O3"]);
        assert_eq!(config.symbols.tool, "llvm-nm");
    }

    #[test]
    fn missing_name_errors() {
        let toml = r#"
[project]
name = ""
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn empty_source_list_errors() {
        let toml = r#"
[project]
name = "test"

[modules]
core = []
"#;
        let err = load_config_from_str(toml).unwrap_err();
        match err {
            ConfigError::InvalidModule { module, reason } => {
                assert_eq!(module, "core");
                assert_eq!(reason, "no source files");
            }
            other => panic!("expected InvalidModule, got {other:?}"),
        }
    }

    #[test]
    fn blank_source_name_errors() {
        let toml = r#"
[project]
name = "test"

[modules]
core = ["core.f90", " "]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidModule { ref module, .. } if module == "core"));
    }

    #[test]
    fn empty_compiler_errors() {
        let toml = r#"
[project]
name = "test"

[toolchain]
compiler = ""
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn empty_host_pattern_errors() {
        let toml = r#"
[project]
name = "test"

[[hosts]]
pattern = ""
compiler = "ifort"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let toml = "this is not valid toml {{{}}}";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref origin, .. } if origin == "inline configuration"));
    }

    #[test]
    fn module_value_of_wrong_type_errors() {
        let toml = r#"
[project]
name = "test"

[modules]
core = 3
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[project]\nname = \"disk\"\n\n[modules]\nlib = \"lib.f90\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.project.name, "disk");
        assert_eq!(config.modules["lib"].files(), ["lib.f90"]);
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        match err {
            ConfigError::Io { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/dir").join(CONFIG_FILE))
            }
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn load_named_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[project]\nname = \"default\"\n").unwrap();
        let custom = dir.path().join("custom.toml");
        std::fs::write(&custom, "[project]\nname = \"custom\"\n").unwrap();

        assert_eq!(load_config_file(&custom).unwrap().project.name, "custom");
        assert_eq!(load_config(dir.path()).unwrap().project.name, "default");
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[project\n").unwrap();
        let err = load_config_file(&path).unwrap_err();
        assert!(err.to_string().starts_with(&path.display().to_string()));
    }
}
