use std::path::PathBuf;
use thiserror::Error;

/// Failures while converting an `.h5ad` file into a loom file.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("the input file was expected at {} but could not be found", .0.display())]
    FileNotFound(PathBuf),

    #[error("could not read {} as an AnnData file: {message}", path.display())]
    Format { path: PathBuf, message: String },

    #[error("failed to write loom file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: hdf5::Error,
    },

    #[error("{what} has {found} entries but the matrix expects {expected}")]
    Shape {
        what: String,
        expected: usize,
        found: usize,
    },
}

/// Failures of the pipeline runner. Every variant aborts the run.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("the `{program}` command was not found; make sure it is installed and on your PATH")]
    EngineUnavailable { program: String },

    #[error("`{program} -version` failed (exit code {code:?}); please verify the installation")]
    EngineVerificationFailed { program: String, code: Option<i32> },

    #[error("could not launch `{program}`: {source}")]
    EngineLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration file not found at {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("could not parse configuration file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration is missing required field `{group}.{key}`")]
    ConfigMissingField {
        group: &'static str,
        key: &'static str,
    },

    #[error("configuration field `{group}.{key}` must be a single value, not a list or mapping")]
    ConfigInvalidField {
        group: &'static str,
        key: &'static str,
    },

    #[error("output directory {} already exists; use --overwrite to replace it", .0.display())]
    DirectoryExists(PathBuf),

    #[error("failed to remove existing output directory {}: {source}", path.display())]
    DirectoryOverwriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pipeline failed (exit code {code:?})")]
    PipelineExecutionFailed { code: Option<i32> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
