use anndata::data::array::{ArrayData, DynArray, DynCscMatrix, DynCsrMatrix};
use anndata::{AnnData, AnnDataOp, ArrayElemOp, Backend};
use anndata_hdf5::H5;
use nalgebra_sparse::{CscMatrix, CsrMatrix};
use ndarray::{ArrayD, Ix2};
use std::path::Path;
use tracing::{debug, trace};

use crate::error::ConvertError;
use crate::matrix::ExpressionMatrix;

/// The pieces of an AnnData file needed to build a loom file.
#[derive(Debug)]
pub struct AnnDataContents {
    pub matrix: ExpressionMatrix,
    pub obs_names: Vec<String>,
    pub var_names: Vec<String>,
}

fn format_err(path: &Path, e: impl std::fmt::Display) -> ConvertError {
    ConvertError::Format {
        path: path.to_path_buf(),
        message: format!("{e:#}"),
    }
}

macro_rules! csr_as_f64 {
    ($m:expr) => {{
        let (pattern, values) = $m.into_pattern_and_values();
        CsrMatrix::try_from_pattern_and_values(
            pattern,
            values.into_iter().map(|v| v as f64).collect(),
        )
        .map_err(|e| e.to_string())
    }};
}

macro_rules! csc_as_f64 {
    ($m:expr) => {{
        let (pattern, values) = $m.into_pattern_and_values();
        CscMatrix::try_from_pattern_and_values(
            pattern,
            values.into_iter().map(|v| v as f64).collect(),
        )
        .map(|csc| CsrMatrix::from(&csc))
        .map_err(|e| e.to_string())
    }};
}

fn dense_as_f64<T: Copy>(a: ArrayD<T>, f: impl Fn(T) -> f64) -> Result<ExpressionMatrix, String> {
    a.mapv(f)
        .into_dimensionality::<Ix2>()
        .map(ExpressionMatrix::Dense)
        .map_err(|e| format!("X is not two-dimensional: {e}"))
}

/// Turns whatever numeric type `X` was stored with into an f64 matrix.
/// Boolean and string matrices are rejected.
fn to_expression_matrix(x: ArrayData) -> Result<ExpressionMatrix, String> {
    match x {
        ArrayData::Array(a) => {
            trace!("X is a dense array");
            match a {
                DynArray::I8(a) => dense_as_f64(a, f64::from),
                DynArray::I16(a) => dense_as_f64(a, f64::from),
                DynArray::I32(a) => dense_as_f64(a, f64::from),
                DynArray::I64(a) => dense_as_f64(a, |v| v as f64),
                DynArray::U8(a) => dense_as_f64(a, f64::from),
                DynArray::U16(a) => dense_as_f64(a, f64::from),
                DynArray::U32(a) => dense_as_f64(a, f64::from),
                DynArray::U64(a) => dense_as_f64(a, |v| v as f64),
                DynArray::F32(a) => dense_as_f64(a, f64::from),
                DynArray::F64(a) => dense_as_f64(a, |v| v),
                DynArray::Bool(_) => Err("Bool matrix type is not supported".to_owned()),
                DynArray::String(_) => Err("String matrix type is not supported".to_owned()),
                #[allow(unreachable_patterns)]
                _ => Err("unsupported dense matrix type".to_owned()),
            }
        }
        ArrayData::CsrMatrix(m) => {
            trace!("X is a CSR matrix");
            let csr = match m {
                DynCsrMatrix::I8(l) => csr_as_f64!(l),
                DynCsrMatrix::I16(l) => csr_as_f64!(l),
                DynCsrMatrix::I32(l) => csr_as_f64!(l),
                DynCsrMatrix::I64(l) => csr_as_f64!(l),
                DynCsrMatrix::U8(l) => csr_as_f64!(l),
                DynCsrMatrix::U16(l) => csr_as_f64!(l),
                DynCsrMatrix::U32(l) => csr_as_f64!(l),
                DynCsrMatrix::U64(l) => csr_as_f64!(l),
                DynCsrMatrix::F32(l) => csr_as_f64!(l),
                DynCsrMatrix::F64(l) => Ok(l),
                DynCsrMatrix::Bool(_) => Err("Bool matrix type is not supported".to_owned()),
                DynCsrMatrix::String(_) => Err("String matrix type is not supported".to_owned()),
            }?;
            Ok(ExpressionMatrix::Sparse(csr))
        }
        ArrayData::CscMatrix(m) => {
            trace!("X is a CSC matrix; converting to CSR");
            let csr = match m {
                DynCscMatrix::I8(l) => csc_as_f64!(l),
                DynCscMatrix::I16(l) => csc_as_f64!(l),
                DynCscMatrix::I32(l) => csc_as_f64!(l),
                DynCscMatrix::I64(l) => csc_as_f64!(l),
                DynCscMatrix::U8(l) => csc_as_f64!(l),
                DynCscMatrix::U16(l) => csc_as_f64!(l),
                DynCscMatrix::U32(l) => csc_as_f64!(l),
                DynCscMatrix::U64(l) => csc_as_f64!(l),
                DynCscMatrix::F32(l) => csc_as_f64!(l),
                DynCscMatrix::F64(l) => Ok(CsrMatrix::from(&l)),
                DynCscMatrix::Bool(_) => Err("Bool matrix type is not supported".to_owned()),
                DynCscMatrix::String(_) => Err("String matrix type is not supported".to_owned()),
            }?;
            Ok(ExpressionMatrix::Sparse(csr))
        }
        _ => Err("expected X to be a dense array, CSR or CSC matrix".to_owned()),
    }
}

/// Reads `X`, `obs_names` and `var_names` from the `.h5ad` file at `path`.
pub fn read_h5ad(path: &Path) -> Result<AnnDataContents, ConvertError> {
    if !path.is_file() {
        return Err(ConvertError::FileNotFound(path.to_path_buf()));
    }

    let store = H5::open(path).map_err(|e| format_err(path, e))?;
    let adata = AnnData::<H5>::open(store).map_err(|e| format_err(path, e))?;
    debug!(
        "opened {} with {} obs and {} vars",
        path.display(),
        adata.n_obs(),
        adata.n_vars()
    );

    let obs_names = adata.obs_names().into_vec();
    let var_names = adata.var_names().into_vec();

    let x: ArrayData = adata
        .get_x()
        .get()
        .map_err(|e| format_err(path, e))?
        .ok_or_else(|| format_err(path, "the file has no X matrix"))?;
    let matrix = to_expression_matrix(x).map_err(|e| format_err(path, e))?;
    adata.close().map_err(|e| format_err(path, e))?;

    if obs_names.len() != matrix.ncells() {
        return Err(ConvertError::Shape {
            what: "obs_names".to_owned(),
            expected: matrix.ncells(),
            found: obs_names.len(),
        });
    }
    if var_names.len() != matrix.nfeatures() {
        return Err(ConvertError::Shape {
            what: "var_names".to_owned(),
            expected: matrix.nfeatures(),
            found: var_names.len(),
        });
    }

    Ok(AnnDataContents {
        matrix,
        obs_names,
        var_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn integer_dense_matrices_are_widened() {
        let x = ArrayData::Array(DynArray::I32(array![[1, 0], [0, 5]].into_dyn()));
        match to_expression_matrix(x).unwrap() {
            ExpressionMatrix::Dense(m) => assert_eq!(m, array![[1.0, 0.0], [0.0, 5.0]]),
            other => panic!("expected a dense matrix, got {other:?}"),
        }
    }

    #[test]
    fn csc_matrices_become_csr() {
        let csc =
            CscMatrix::try_from_csc_data(2, 2, vec![0, 1, 2], vec![1, 0], vec![3.0f32, 4.0])
                .unwrap();
        let x = ArrayData::CscMatrix(DynCscMatrix::F32(csc));
        let m = to_expression_matrix(x).unwrap();
        assert_eq!(m.transposed_block(0..2), array![[0.0f32, 3.0], [4.0, 0.0]]);
    }

    #[test]
    fn boolean_matrices_are_rejected() {
        let x = ArrayData::Array(DynArray::Bool(array![[true]].into_dyn()));
        assert!(to_expression_matrix(x).is_err());
    }

    #[test]
    fn missing_input_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_h5ad(&dir.path().join("absent.h5ad")).unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound(_)));
    }

    #[test]
    fn non_hdf5_input_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("not_anndata.h5ad");
        std::fs::write(&p, "cell,gene\n").unwrap();
        let err = read_h5ad(&p).unwrap_err();
        assert!(matches!(err, ConvertError::Format { .. }));
    }
}
