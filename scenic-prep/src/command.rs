use chrono::{DateTime, Local};
use std::ffi::OsString;
use std::fmt;
use std::path::Path;

use crate::config::RunConfig;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Labels one execution of the workflow: `<process_name>_<timestamp>`.
pub fn run_identifier(process_name: &str, at: DateTime<Local>) -> String {
    format!("{}_{}", process_name, at.format(TIMESTAMP_FORMAT))
}

/// A fully composed invocation of the workflow engine, kept as discrete
/// arguments so that paths are never interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: String,
    pub args: Vec<OsString>,
    pub run_name: String,
}

impl EngineCommand {
    /// Builds `<program> run <workflow> ...` for `config`, using `work_dir`
    /// as the engine's scratch directory and `run_name` as its run label.
    pub fn scenic(program: &str, config: &RunConfig, work_dir: &Path, run_name: String) -> Self {
        let p = &config.pipeline;
        let nf = &config.nextflow;

        let args: Vec<OsString> = vec![
            "run".into(),
            nf.workflow.clone().into(),
            "--loom_input".into(),
            p.loom_input.clone().into(),
            "--loom_output".into(),
            p.loom_output.clone().into(),
            "--TFs".into(),
            p.tfs.clone().into(),
            "--motifs".into(),
            p.motifs.clone().into(),
            "--db".into(),
            p.db.clone().into(),
            "--thr_min_genes".into(),
            p.thr_min_genes.to_string().into(),
            "--thr_min_cells".into(),
            p.thr_min_cells.to_string().into(),
            "--transpose".into(),
            "-work-dir".into(),
            work_dir.as_os_str().to_owned(),
            "-c".into(),
            nf.nextflow_config.clone().into(),
            "-resume".into(),
            "-name".into(),
            run_name.clone().into(),
            "-ansi-log".into(),
            "false".into(),
            "-with-report".into(),
            "-with-dag".into(),
            "-with-timeline".into(),
            "-with-trace".into(),
            "-profile".into(),
            nf.profile.clone().into(),
        ];

        EngineCommand {
            program: program.to_owned(),
            args,
            run_name,
        }
    }
}

fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        arg.to_owned()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Renders the command shell-quoted, for logging only.
impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for a in &self.args {
            write!(f, " {}", quote(&a.to_string_lossy()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn config() -> RunConfig {
        RunConfig::from_yaml_str(
            r#"
paths:
  output_directory: out/
pipeline:
  loom_input: my data/in.loom
  loom_output: out.loom
  TFs: tfs.txt
  motifs: motifs.tbl
  db: "dbs/*feather"
nextflow:
  process_name: scenic
  nextflow_config: nextflow.config
"#,
            Path::new("config.yaml"),
        )
        .unwrap()
    }

    #[test]
    fn run_identifier_is_sortable_to_the_second() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(run_identifier("scenic", at), "scenic_20240309_070501");
    }

    #[test]
    fn scenic_command_has_every_flag_in_order() {
        let cmd = EngineCommand::scenic(
            "nextflow",
            &config(),
            Path::new("out/work"),
            "scenic_1".into(),
        );
        let args: Vec<String> = cmd
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let expected = [
            "run",
            "aertslab/SCENICprotocol",
            "--loom_input",
            "my data/in.loom",
            "--loom_output",
            "out.loom",
            "--TFs",
            "tfs.txt",
            "--motifs",
            "motifs.tbl",
            "--db",
            "dbs/*feather",
            "--thr_min_genes",
            "1",
            "--thr_min_cells",
            "1",
            "--transpose",
            "-work-dir",
            "out/work",
            "-c",
            "nextflow.config",
            "-resume",
            "-name",
            "scenic_1",
            "-ansi-log",
            "false",
            "-with-report",
            "-with-dag",
            "-with-timeline",
            "-with-trace",
            "-profile",
            "singularity",
        ];
        assert_eq!(args, expected);
        assert_eq!(cmd.program, "nextflow");
    }

    #[test]
    fn display_quotes_unsafe_arguments() {
        let cmd = EngineCommand {
            program: "nextflow".into(),
            args: vec!["--db".into(), "dbs/*feather".into(), "it's".into()],
            run_name: String::new(),
        };
        assert_eq!(cmd.to_string(), r"nextflow --db 'dbs/*feather' 'it'\''s'");
    }
}
