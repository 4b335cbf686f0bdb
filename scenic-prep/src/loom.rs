//! Writer for the loom format (an HDF5 layout used by SCENIC).
//!
//! A loom file stores a single `genes x cells` matrix at `/matrix`, one
//! dataset per row attribute under `/row_attrs` and one per column attribute
//! under `/col_attrs`. Global attributes live as scalar datasets in `/attrs`.

use hdf5::types::VarLenUnicode;
use hdf5::{File, Group};
use ndarray::{s, Array1};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, trace};

use crate::error::ConvertError;
use crate::matrix::ExpressionMatrix;

pub const LOOM_SPEC_VERSION: &str = "3.0.0";

/// Number of cells written to `/matrix` per slice.
const CELL_BLOCK: usize = 512;
const CHUNK: usize = 64;

/// The values of one row or column attribute.
#[derive(Debug, Clone, Copy)]
pub enum AttrValues<'a> {
    Strings(&'a [String]),
    Ints(&'a [i64]),
    Floats(&'a [f64]),
}

impl AttrValues<'_> {
    pub fn len(&self) -> usize {
        match self {
            AttrValues::Strings(v) => v.len(),
            AttrValues::Ints(v) => v.len(),
            AttrValues::Floats(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything that goes into one loom file. The matrix is given with cells
/// as rows and is stored transposed.
pub struct LoomContents<'a> {
    pub matrix: &'a ExpressionMatrix,
    pub row_attrs: Vec<(&'a str, AttrValues<'a>)>,
    pub col_attrs: Vec<(&'a str, AttrValues<'a>)>,
}

fn to_unicode(s: &str) -> hdf5::Result<VarLenUnicode> {
    VarLenUnicode::from_str(s).map_err(|e| hdf5::Error::Internal(e.to_string()))
}

fn write_attr(group: &Group, name: &str, values: AttrValues<'_>) -> hdf5::Result<()> {
    match values {
        AttrValues::Strings(v) => {
            let arr = v
                .iter()
                .map(|s| to_unicode(s))
                .collect::<hdf5::Result<Array1<VarLenUnicode>>>()?;
            group.new_dataset_builder().with_data(&arr).create(name)?;
        }
        AttrValues::Ints(v) => {
            group.new_dataset_builder().with_data(v).create(name)?;
        }
        AttrValues::Floats(v) => {
            group.new_dataset_builder().with_data(v).create(name)?;
        }
    }
    Ok(())
}

fn write_global_str(group: &Group, name: &str, value: &str) -> hdf5::Result<()> {
    let scalar = ndarray::arr0(to_unicode(value)?);
    group.new_dataset_builder().with_data(&scalar).create(name)?;
    Ok(())
}

fn write_matrix(file: &File, matrix: &ExpressionMatrix) -> hdf5::Result<()> {
    let (ngenes, ncells) = (matrix.nfeatures(), matrix.ncells());
    let builder = file.new_dataset::<f32>().shape((ngenes, ncells));
    let ds = if ngenes > 0 && ncells > 0 {
        builder
            .chunk((ngenes.min(CHUNK), ncells.min(CHUNK)))
            .create("matrix")?
    } else {
        builder.create("matrix")?
    };

    let mut start = 0;
    while start < ncells {
        let end = (start + CELL_BLOCK).min(ncells);
        trace!("writing cells {}..{} of /matrix", start, end);
        let block = matrix.transposed_block(start..end);
        ds.write_slice(&block, s![.., start..end])?;
        start = end;
    }
    Ok(())
}

fn write_contents(file: &File, contents: &LoomContents<'_>) -> hdf5::Result<()> {
    write_matrix(file, contents.matrix)?;

    let row_attrs = file.create_group("row_attrs")?;
    for (name, values) in &contents.row_attrs {
        write_attr(&row_attrs, name, *values)?;
    }
    let col_attrs = file.create_group("col_attrs")?;
    for (name, values) in &contents.col_attrs {
        write_attr(&col_attrs, name, *values)?;
    }

    file.create_group("layers")?;
    file.create_group("row_graphs")?;
    file.create_group("col_graphs")?;

    let attrs = file.create_group("attrs")?;
    write_global_str(&attrs, "LOOM_SPEC_VERSION", LOOM_SPEC_VERSION)?;
    let created = chrono::Utc::now().format("%Y%m%dT%H%M%S%.6fZ").to_string();
    write_global_str(&attrs, "CreationDate", &created)?;
    Ok(())
}

/// Creates (or truncates) the loom file at `path` and writes `contents`.
///
/// Attribute lengths are checked against the matrix before anything is
/// written. A failure part way through leaves a partial file behind.
pub fn write_loom(path: &Path, contents: &LoomContents<'_>) -> Result<(), ConvertError> {
    let (ngenes, ncells) = (contents.matrix.nfeatures(), contents.matrix.ncells());
    for (name, values) in &contents.row_attrs {
        if values.len() != ngenes {
            return Err(ConvertError::Shape {
                what: (*name).to_owned(),
                expected: ngenes,
                found: values.len(),
            });
        }
    }
    for (name, values) in &contents.col_attrs {
        if values.len() != ncells {
            return Err(ConvertError::Shape {
                what: (*name).to_owned(),
                expected: ncells,
                found: values.len(),
            });
        }
    }

    let write_err = |source| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_err)?;
    write_contents(&file, contents).map_err(write_err)?;
    file.close().map_err(write_err)?;
    debug!("wrote {} x {} loom matrix", ngenes, ncells);
    Ok(())
}
