use std::path::Path;
use tracing::info;

use crate::error::ConvertError;
use crate::h5ad::read_h5ad;
use crate::loom::{write_loom, AttrValues, LoomContents};
use crate::names::{clean_feature_names, clean_sample_names};

/// What was written by [`convert_h5ad_to_loom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    pub ncells: usize,
    pub nfeatures: usize,
}

/// Converts the AnnData file at `h5ad_path` into a SCENIC-compatible loom
/// file at `loom_path`.
///
/// Feature names are upper-cased and trimmed, cell names trimmed. The loom
/// matrix is the transpose of `X` (features as rows, cells as columns), with
/// row attribute `features` and column attributes `CellID`, `nGene` (number
/// of strictly positive entries per cell) and `nUMI` (sum per cell). An
/// existing file at `loom_path` is overwritten.
pub fn convert_h5ad_to_loom<P: AsRef<Path>>(
    h5ad_path: P,
    loom_path: P,
) -> Result<ConversionSummary, ConvertError> {
    let h5ad_path = h5ad_path.as_ref();
    let loom_path = loom_path.as_ref();

    let sw = libsw::Sw::new_started();
    let adata = read_h5ad(h5ad_path)?;
    info!("reading {} took {:#?}", h5ad_path.display(), sw.elapsed());

    let genes = clean_feature_names(&adata.var_names);
    let cells = clean_sample_names(&adata.obs_names);
    let stats = adata.matrix.cell_stats();

    let contents = LoomContents {
        matrix: &adata.matrix,
        row_attrs: vec![("features", AttrValues::Strings(&genes))],
        col_attrs: vec![
            ("CellID", AttrValues::Strings(&cells)),
            ("nGene", AttrValues::Ints(&stats.n_gene)),
            ("nUMI", AttrValues::Floats(&stats.n_umi)),
        ],
    };

    info!("Writing loom file to: {}", loom_path.display());
    let sw = libsw::Sw::new_started();
    write_loom(loom_path, &contents)?;
    info!("writing loom file took {:#?}", sw.elapsed());
    info!("Loom file created successfully.");

    Ok(ConversionSummary {
        ncells: cells.len(),
        nfeatures: genes.len(),
    })
}
