use clap::Parser;
use scenic_prep::convert_h5ad_to_loom;
use scenic_prep::logging::stdout_subscriber;
use std::path::PathBuf;
use tracing::error;

/// Convert AnnData (.h5ad) to SCENIC-compatible loom file.
#[derive(Parser, Debug)]
#[command(name = "h5ad2loom", version)]
struct Args {
    /// Path to input h5ad file.
    #[arg(short, long)]
    input: PathBuf,

    /// Path to output loom file.
    #[arg(short, long)]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing::subscriber::with_default(stdout_subscriber(), || {
        convert_h5ad_to_loom(&args.input, &args.output)
            .inspect_err(|e| error!("{}", e))
            .map(|_| ())
    })?;
    Ok(())
}
