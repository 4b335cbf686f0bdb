use chrono::Local;
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::command::{run_identifier, EngineCommand};
use crate::config::RunConfig;
use crate::engine::{RunStatus, WorkflowEngine};
use crate::error::RunnerError;
use crate::workdir::prepare_output_directory;

pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config_path: PathBuf,
    pub overwrite: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            overwrite: false,
        }
    }
}

/// The outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_name: String,
    pub work_dir: PathBuf,
    /// `None` if the cleanup command could not be launched.
    pub cleanup: Option<RunStatus>,
}

/// Runs the SCENIC protocol end to end: verify the engine, load the
/// configuration, prepare the output directory, compose and run the engine
/// command, then clean up. The child's output is echoed to `out`.
///
/// Every step is fatal on error. A non-zero exit of the pipeline itself
/// skips the cleanup; the cleanup's own exit status is only logged.
pub fn run_pipeline<E: WorkflowEngine>(
    opts: &RunOptions,
    engine: &E,
    out: &mut dyn Write,
) -> Result<RunReport, RunnerError> {
    info!("Config file path: {}", opts.config_path.display());
    info!("Force overwrite: {}", opts.overwrite);

    engine.verify()?;

    let config = RunConfig::load(&opts.config_path)?;

    let work_dir = prepare_output_directory(&config.paths.output_directory, opts.overwrite)?;

    let run_name = run_identifier(&config.nextflow.process_name, Local::now());
    let command = EngineCommand::scenic(engine.program(), &config, &work_dir, run_name);
    info!(" ---------- Prepared Nextflow command: ");
    info!("{}", command);

    let status = engine.run(&command, out)?;
    if !status.success() {
        error!("Pipeline failed with exit code {:?}", status.code);
        return Err(RunnerError::PipelineExecutionFailed { code: status.code });
    }

    let cleanup = match engine.clean(out) {
        Ok(s) if s.success() => Some(s),
        Ok(s) => {
            warn!("Nextflow clean up exited with code {:?}", s.code);
            Some(s)
        }
        Err(e) => {
            warn!("Nextflow clean up could not be run: {}", e);
            None
        }
    };
    info!("Nextflow clean up complete!");
    info!("Pipeline complete!");

    Ok(RunReport {
        run_name: command.run_name,
        work_dir,
        cleanup,
    })
}
