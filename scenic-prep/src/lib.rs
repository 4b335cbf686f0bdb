//! Preparing single-cell data for SCENIC and running the SCENIC protocol.
//!
//! Two independent tools are built on this crate:
//!
//! * [`convert_h5ad_to_loom`] turns an AnnData (`.h5ad`) file into the loom
//!   file the SCENIC protocol reads, cleaning gene and cell names and adding
//!   the `nGene` and `nUMI` per-cell summaries.
//! * [`run_pipeline`] loads a YAML [`RunConfig`], prepares the output
//!   directory and drives the protocol through a [`WorkflowEngine`]
//!   (Nextflow in practice), streaming its output as it runs.

pub mod command;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod h5ad;
pub mod logging;
pub mod loom;
pub mod matrix;
pub mod names;
pub mod runner;
pub mod workdir;

pub use config::RunConfig;
pub use convert::{convert_h5ad_to_loom, ConversionSummary};
pub use engine::{Nextflow, RunStatus, WorkflowEngine};
pub use error::{ConvertError, RunnerError};
pub use runner::{run_pipeline, RunOptions, RunReport};
