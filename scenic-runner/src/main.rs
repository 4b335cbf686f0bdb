use clap::Parser;
use scenic_prep::logging::stdout_subscriber;
use scenic_prep::runner::DEFAULT_CONFIG_PATH;
use scenic_prep::{run_pipeline, Nextflow, RunOptions};
use std::path::PathBuf;
use tracing::error;

/// Run the SCENIC pipeline via Nextflow.
#[derive(Parser, Debug)]
#[command(name = "scenic-runner", version)]
struct Args {
    /// Path to the input configuration file
    #[arg(long = "config_path", default_value = DEFAULT_CONFIG_PATH)]
    config_path: PathBuf,

    /// If present, clear and overwrite existing output directory
    #[arg(long)]
    overwrite: bool,

    /// Nextflow executable to use
    #[arg(long = "nextflow_bin", default_value = scenic_prep::engine::DEFAULT_ENGINE)]
    nextflow_bin: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let opts = RunOptions {
        config_path: args.config_path,
        overwrite: args.overwrite,
    };
    let engine = Nextflow::new(args.nextflow_bin);

    tracing::subscriber::with_default(stdout_subscriber(), || {
        let mut stdout = std::io::stdout();
        run_pipeline(&opts, &engine, &mut stdout).inspect_err(|e| error!("{}", e))
    })?;
    Ok(())
}
