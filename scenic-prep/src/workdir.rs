use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::error::RunnerError;

pub const WORK_SUBDIR: &str = "work";

fn create_dir(path: &Path) -> Result<(), RunnerError> {
    std::fs::create_dir_all(path).map_err(|source| RunnerError::DirectoryCreate {
        path: path.to_path_buf(),
        source,
    })
}

/// Prepares `output_dir` and its `work/` subdirectory, returning the latter.
///
/// An existing `output_dir` is an error unless `overwrite` is set, in which
/// case it is removed recursively first. If removal succeeds but creation
/// fails, no output directory is left behind.
pub fn prepare_output_directory(output_dir: &Path, overwrite: bool) -> Result<PathBuf, RunnerError> {
    if output_dir.exists() {
        if !overwrite {
            error!("Output directory already exists: {}", output_dir.display());
            return Err(RunnerError::DirectoryExists(output_dir.to_path_buf()));
        }
        let removed = if output_dir.is_dir() {
            std::fs::remove_dir_all(output_dir)
        } else {
            std::fs::remove_file(output_dir)
        };
        if let Err(source) = removed {
            error!("Failed to overwrite existing output directory: {}", source);
            return Err(RunnerError::DirectoryOverwriteFailed {
                path: output_dir.to_path_buf(),
                source,
            });
        }
        info!("Overwriting existing output directory: {}", output_dir.display());
    }

    let working_dir = output_dir.join(WORK_SUBDIR);
    create_dir(output_dir)?;
    create_dir(&working_dir)?;
    info!("Created output directory: {}", output_dir.display());
    info!("Created working directory: {}", working_dir.display());
    Ok(working_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_output_and_work_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("results");
        let work = prepare_output_directory(&out, false).unwrap();
        assert_eq!(work, out.join("work"));
        assert!(work.is_dir());
    }

    #[test]
    fn existing_directory_without_overwrite_is_left_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("results");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("keep.txt"), "previous run").unwrap();

        let err = prepare_output_directory(&out, false).unwrap_err();
        assert!(matches!(err, RunnerError::DirectoryExists(ref p) if p == &out));
        assert_eq!(
            std::fs::read_to_string(out.join("keep.txt")).unwrap(),
            "previous run"
        );
        assert!(!out.join("work").exists());
    }

    #[test]
    fn overwrite_replaces_previous_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("results");
        std::fs::create_dir_all(out.join("work/ab/cdef")).unwrap();
        std::fs::write(out.join("report.html"), "old").unwrap();
        std::fs::write(out.join("work/ab/cdef/.command.sh"), "old").unwrap();

        let work = prepare_output_directory(&out, true).unwrap();
        let entries: Vec<_> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("work")]);
        assert_eq!(std::fs::read_dir(&work).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn undeletable_directory_fails_to_overwrite() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("results");
        let locked = out.join("locked");
        std::fs::create_dir_all(&locked).unwrap();
        std::fs::write(locked.join("file"), "x").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        // root ignores directory permissions
        let result = prepare_output_directory(&out, true);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).ok();
        if locked.join("file").exists() {
            assert!(matches!(
                result,
                Err(RunnerError::DirectoryOverwriteFailed { .. })
            ));
        }
    }
}
