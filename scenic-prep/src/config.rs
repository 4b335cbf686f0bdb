//! YAML run configuration for the SCENIC pipeline runner.
//!
//! ```yaml
//! paths:
//!   output_directory: /data/run1/
//! pipeline:
//!   loom_input: /data/pbmc.loom
//!   loom_output: /data/pbmc_scenic.loom
//!   TFs: /refs/hs_hgnc_tfs.txt
//!   motifs: /refs/motifs.tbl
//!   db: "/refs/*feather"
//!   thr_min_genes: 1
//!   thr_min_cells: 1
//! nextflow:
//!   process_name: scenic
//!   nextflow_config: /refs/nextflow.config
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::RunnerError;

pub const DEFAULT_WORKFLOW: &str = "aertslab/SCENICprotocol";
pub const DEFAULT_PROFILE: &str = "singularity";
pub const DEFAULT_THRESHOLD: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub paths: PathsConfig,
    pub pipeline: PipelineConfig,
    pub nextflow: NextflowConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    pub output_directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub loom_input: String,
    pub loom_output: String,
    pub tfs: String,
    pub motifs: String,
    pub db: String,
    pub thr_min_genes: u64,
    pub thr_min_cells: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextflowConfig {
    pub process_name: String,
    pub nextflow_config: String,
    pub workflow: String,
    pub profile: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    paths: RawPaths,
    #[serde(default)]
    pipeline: RawPipeline,
    #[serde(default)]
    nextflow: RawNextflow,
}

// Path and name fields take any YAML scalar, so `process_name: 2024` or
// `db: 1` are read as the strings "2024" and "1".
type Scalar = Option<serde_yaml::Value>;

#[derive(Debug, Default, Deserialize)]
struct RawPaths {
    output_directory: Scalar,
}

#[derive(Debug, Default, Deserialize)]
struct RawPipeline {
    loom_input: Scalar,
    loom_output: Scalar,
    #[serde(rename = "TFs")]
    tfs: Scalar,
    motifs: Scalar,
    db: Scalar,
    thr_min_genes: Option<u64>,
    thr_min_cells: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawNextflow {
    process_name: Scalar,
    nextflow_config: Scalar,
    workflow: Scalar,
    profile: Scalar,
}

fn scalar(value: Scalar, group: &'static str, key: &'static str) -> Result<Option<String>, RunnerError> {
    use serde_yaml::Value;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(RunnerError::ConfigInvalidField { group, key }),
    }
}

fn required(value: Scalar, group: &'static str, key: &'static str) -> Result<String, RunnerError> {
    scalar(value, group, key)?.ok_or(RunnerError::ConfigMissingField { group, key })
}

fn optional(value: Scalar, group: &'static str, key: &'static str, default: &str) -> Result<String, RunnerError> {
    Ok(scalar(value, group, key)?.unwrap_or_else(|| default.to_owned()))
}

impl RawConfig {
    fn validate(self) -> Result<RunConfig, RunnerError> {
        let RawConfig {
            paths,
            pipeline,
            nextflow,
        } = self;
        Ok(RunConfig {
            paths: PathsConfig {
                output_directory: required(paths.output_directory, "paths", "output_directory")?.into(),
            },
            pipeline: PipelineConfig {
                loom_input: required(pipeline.loom_input, "pipeline", "loom_input")?,
                loom_output: required(pipeline.loom_output, "pipeline", "loom_output")?,
                tfs: required(pipeline.tfs, "pipeline", "TFs")?,
                motifs: required(pipeline.motifs, "pipeline", "motifs")?,
                db: required(pipeline.db, "pipeline", "db")?,
                thr_min_genes: pipeline.thr_min_genes.unwrap_or(DEFAULT_THRESHOLD),
                thr_min_cells: pipeline.thr_min_cells.unwrap_or(DEFAULT_THRESHOLD),
            },
            nextflow: NextflowConfig {
                process_name: required(nextflow.process_name, "nextflow", "process_name")?,
                nextflow_config: required(nextflow.nextflow_config, "nextflow", "nextflow_config")?,
                workflow: optional(nextflow.workflow, "nextflow", "workflow", DEFAULT_WORKFLOW)?,
                profile: optional(nextflow.profile, "nextflow", "profile", DEFAULT_PROFILE)?,
            },
        })
    }
}

fn render(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => "~".to_owned(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_owned())
            .unwrap_or_else(|_| format!("{other:?}")),
    }
}

/// Logs every top-level group of the document and its key/value pairs.
fn log_groups(doc: &serde_yaml::Value) {
    let Some(groups) = doc.as_mapping() else {
        return;
    };
    for (group, entries) in groups {
        info!("Configuration for: {}", render(group));
        match entries.as_mapping() {
            Some(entries) => {
                for (key, value) in entries {
                    info!("\t {} : {}", render(key), render(value));
                }
            }
            None => info!("\t {}", render(entries)),
        }
    }
}

impl RunConfig {
    /// Parses and validates a configuration document.
    pub fn from_yaml_str(text: &str, origin: &Path) -> Result<Self, RunnerError> {
        let parse_err = |source| RunnerError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        };
        let doc: serde_yaml::Value = serde_yaml::from_str(text).map_err(parse_err)?;
        log_groups(&doc);
        let raw: RawConfig = serde_yaml::from_value(doc).map_err(parse_err)?;
        raw.validate()
    }

    /// Loads the configuration at `path`, failing fast if it is missing,
    /// malformed or lacks a required field.
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        if !path.is_file() {
            return Err(RunnerError::ConfigNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
paths:
  output_directory: /tmp/scenic_out/
pipeline:
  loom_input: in.loom
  loom_output: out.loom
  TFs: tfs.txt
  motifs: motifs.tbl
  db: "dbs/*feather"
  thr_min_genes: 200
nextflow:
  process_name: scenic
  nextflow_config: nextflow.config
"#;

    fn parse(text: &str) -> Result<RunConfig, RunnerError> {
        RunConfig::from_yaml_str(text, Path::new("config.yaml"))
    }

    #[test]
    fn full_config_is_typed_with_defaults() {
        let cfg = parse(FULL).unwrap();
        assert_eq!(cfg.paths.output_directory, PathBuf::from("/tmp/scenic_out/"));
        assert_eq!(cfg.pipeline.tfs, "tfs.txt");
        assert_eq!(cfg.pipeline.db, "dbs/*feather");
        assert_eq!(cfg.pipeline.thr_min_genes, 200);
        assert_eq!(cfg.pipeline.thr_min_cells, 1);
        assert_eq!(cfg.nextflow.workflow, "aertslab/SCENICprotocol");
        assert_eq!(cfg.nextflow.profile, "singularity");
    }

    #[test]
    fn missing_tfs_names_the_field() {
        let text = FULL.replace("  TFs: tfs.txt\n", "");
        match parse(&text) {
            Err(RunnerError::ConfigMissingField { group, key }) => {
                assert_eq!(group, "pipeline");
                assert_eq!(key, "TFs");
            }
            other => panic!("expected a missing field error, got {other:?}"),
        }
    }

    #[test]
    fn missing_group_reports_its_first_field() {
        let text = "pipeline: {}\nnextflow: {}\n";
        assert!(matches!(
            parse(text),
            Err(RunnerError::ConfigMissingField {
                group: "paths",
                key: "output_directory"
            })
        ));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        assert!(matches!(
            parse("paths: [unterminated"),
            Err(RunnerError::ConfigParse { .. })
        ));
        assert!(matches!(
            parse("pipeline:\n  thr_min_genes: many\n"),
            Err(RunnerError::ConfigParse { .. })
        ));
    }

    #[test]
    fn scalar_values_are_read_as_strings() {
        let text = FULL
            .replace("process_name: scenic", "process_name: 2024")
            .replace("db: \"dbs/*feather\"", "db: 1")
            .replace("motifs: motifs.tbl", "motifs: true");
        let cfg = parse(&text).unwrap();
        assert_eq!(cfg.nextflow.process_name, "2024");
        assert_eq!(cfg.pipeline.db, "1");
        assert_eq!(cfg.pipeline.motifs, "true");
    }

    #[test]
    fn null_value_counts_as_missing() {
        let text = FULL.replace("motifs: motifs.tbl", "motifs:");
        assert!(matches!(
            parse(&text),
            Err(RunnerError::ConfigMissingField {
                group: "pipeline",
                key: "motifs"
            })
        ));
    }

    #[test]
    fn nested_value_is_rejected() {
        let text = FULL.replace("process_name: scenic", "process_name: [a, b]");
        assert!(matches!(
            parse(&text),
            Err(RunnerError::ConfigInvalidField {
                group: "nextflow",
                key: "process_name"
            })
        ));
    }

    #[test]
    fn missing_file_is_config_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = RunConfig::load(&dir.path().join("config.yaml")).unwrap_err();
        assert!(matches!(err, RunnerError::ConfigNotFound(_)));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.yaml");
        std::fs::write(&p, FULL).unwrap();
        let cfg = RunConfig::load(&p).unwrap();
        assert_eq!(cfg.nextflow.process_name, "scenic");
    }
}
