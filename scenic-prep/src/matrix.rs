use nalgebra_sparse::CsrMatrix;
use ndarray::{s, Array2};
use std::ops::Range;

/// An expression matrix with cells as rows and features as columns,
/// held either densely or in CSR form.
#[derive(Debug, Clone)]
pub enum ExpressionMatrix {
    Dense(Array2<f64>),
    Sparse(CsrMatrix<f64>),
}

/// Per-cell summary statistics, one entry per row of the matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CellStats {
    /// number of features with a strictly positive value
    pub n_gene: Vec<i64>,
    /// total of all values
    pub n_umi: Vec<f64>,
}

impl ExpressionMatrix {
    pub fn ncells(&self) -> usize {
        match self {
            ExpressionMatrix::Dense(m) => m.nrows(),
            ExpressionMatrix::Sparse(m) => m.nrows(),
        }
    }

    pub fn nfeatures(&self) -> usize {
        match self {
            ExpressionMatrix::Dense(m) => m.ncols(),
            ExpressionMatrix::Sparse(m) => m.ncols(),
        }
    }

    /// Computes `nGene` and `nUMI` for every cell. Dense and sparse inputs
    /// holding the same values give identical results.
    pub fn cell_stats(&self) -> CellStats {
        let n = self.ncells();
        let mut n_gene = Vec::with_capacity(n);
        let mut n_umi = Vec::with_capacity(n);
        match self {
            ExpressionMatrix::Dense(m) => {
                for row in m.rows() {
                    n_gene.push(row.iter().filter(|&&v| v > 0.0).count() as i64);
                    n_umi.push(row.sum());
                }
            }
            ExpressionMatrix::Sparse(m) => {
                for row in m.row_iter() {
                    let vals = row.values();
                    n_gene.push(vals.iter().filter(|&&v| v > 0.0).count() as i64);
                    n_umi.push(vals.iter().sum());
                }
            }
        }
        CellStats { n_gene, n_umi }
    }

    /// Returns the transpose of the rows in `cells`, i.e. a
    /// `nfeatures x cells.len()` block of the loom matrix.
    pub fn transposed_block(&self, cells: Range<usize>) -> Array2<f32> {
        match self {
            // HDF5 slab writes only accept C-ordered blocks
            ExpressionMatrix::Dense(m) => m
                .slice(s![cells, ..])
                .t()
                .as_standard_layout()
                .mapv(|v| v as f32),
            ExpressionMatrix::Sparse(m) => {
                let mut block = Array2::<f32>::zeros((m.ncols(), cells.len()));
                for (j, cell) in cells.enumerate() {
                    let row = m.row(cell);
                    for (&g, &v) in row.col_indices().iter().zip(row.values()) {
                        block[[g, j]] = v as f32;
                    }
                }
                block
            }
        }
    }
}
