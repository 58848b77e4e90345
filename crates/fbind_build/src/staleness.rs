//! Modification-time comparison between a library artifact and its sources.
//!
//! An artifact is stale when it is missing, when one of its sources is
//! missing, or when a source was modified strictly after the artifact.
//! Nothing is cached: every check reads the file system again.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Outcome of comparing an artifact with its sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// The artifact and every source exist, and no source is newer.
    UpToDate,
    /// The artifact does not exist.
    ArtifactMissing,
    /// A declared source does not exist (or its metadata is unreadable).
    SourceMissing(PathBuf),
    /// A source was modified after the artifact.
    SourceNewer(PathBuf),
}

impl Staleness {
    /// Returns `true` if the artifact has to be rebuilt.
    pub fn is_stale(&self) -> bool {
        !matches!(self, Staleness::UpToDate)
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Staleness::UpToDate => f.write_str("up to date"),
            Staleness::ArtifactMissing => f.write_str("artifact missing"),
            Staleness::SourceMissing(path) => write!(f, "source {} missing", path.display()),
            Staleness::SourceNewer(path) => write!(f, "{} changed", path.display()),
        }
    }
}

/// Compares `<dir>/<library>` against each `<dir>/<source>`.
///
/// The artifact is checked first, then sources in declaration order; the
/// first reason for a rebuild is returned.
pub fn check_staleness<S: AsRef<str>>(dir: &Path, library: &str, sources: &[S]) -> Staleness {
    let artifact = dir.join(library);
    let Some(artifact_time) = modified(&artifact) else {
        return Staleness::ArtifactMissing;
    };

    for source in sources {
        let path = dir.join(source.as_ref());
        match modified(&path) {
            None => return Staleness::SourceMissing(path),
            Some(source_time) if source_time > artifact_time => {
                return Staleness::SourceNewer(path);
            }
            Some(_) => {}
        }
    }

    Staleness::UpToDate
}

/// Returns `true` if `<dir>/<library>` needs rebuilding.
pub fn is_stale<S: AsRef<str>>(dir: &Path, library: &str, sources: &[S]) -> bool {
    check_staleness(dir, library, sources).is_stale()
}

/// Modification time of a regular file, `None` if absent or unreadable.
fn modified(path: &Path) -> Option<SystemTime> {
    let metadata = std::fs::metadata(path).ok()?;
    if !metadata.is_file() {
        return None;
    }
    metadata.modified().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn touch(dir: &Path, name: &str, time: SystemTime) {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(time).unwrap();
    }

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    #[test]
    fn missing_artifact_is_stale_regardless_of_sources() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.f90", at(0));
        assert_eq!(
            check_staleness(dir.path(), "mylib", &["a.f90"]),
            Staleness::ArtifactMissing
        );
        // Even with no sources at all.
        assert!(is_stale::<&str>(dir.path(), "mylib", &[]));
    }

    #[test]
    fn older_sources_are_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.f90", at(10));
        touch(dir.path(), "b.f90", at(20));
        touch(dir.path(), "mylib", at(30));
        let status = check_staleness(dir.path(), "mylib", &["a.f90", "b.f90"]);
        assert_eq!(status, Staleness::UpToDate);
        assert!(!status.is_stale());
    }

    #[test]
    fn equal_times_are_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.f90", at(30));
        touch(dir.path(), "mylib", at(30));
        assert!(!is_stale(dir.path(), "mylib", &["a.f90"]));
    }

    #[test]
    fn any_newer_source_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.f90", at(10));
        touch(dir.path(), "b.f90", at(40));
        touch(dir.path(), "mylib", at(30));
        assert_eq!(
            check_staleness(dir.path(), "mylib", &["a.f90", "b.f90"]),
            Staleness::SourceNewer(dir.path().join("b.f90"))
        );
    }

    #[test]
    fn missing_source_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "mylib", at(30));
        assert_eq!(
            check_staleness(dir.path(), "mylib", &["gone.f90"]),
            Staleness::SourceMissing(dir.path().join("gone.f90"))
        );
    }

    #[test]
    fn directory_named_like_artifact_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("mylib")).unwrap();
        touch(dir.path(), "a.f90", at(0));
        assert_eq!(
            check_staleness(dir.path(), "mylib", &["a.f90"]),
            Staleness::ArtifactMissing
        );
    }

    #[test]
    fn display_reasons() {
        assert_eq!(Staleness::UpToDate.to_string(), "up to date");
        assert_eq!(Staleness::ArtifactMissing.to_string(), "artifact missing");
        assert_eq!(
            Staleness::SourceNewer(PathBuf::from("src/a.f90")).to_string(),
            "src/a.f90 changed"
        );
    }
}
