use std::ops::{Index, IndexMut};

use crate::error::{Error, Result};

/// Dense row-major matrix backed by one contiguous buffer.
///
/// Rows are output nodes and columns are input nodes when the matrix holds
/// a layer's weights. The shape is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Like `zeros`, but reports allocation failure instead of aborting.
    pub fn try_zeros(rows: usize, cols: usize) -> Result<Matrix> {
        let len = rows
            .checked_mul(cols)
            .ok_or_else(|| Error::Allocation(format!("{rows}x{cols} matrix overflows usize")))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)?;
        data.resize(len, 0.0);
        Ok(Matrix { rows, cols, data })
    }

    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Matrix> {
        Error::check_len("matrix data", rows * cols, data.len())?;
        Ok(Matrix { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, r: usize) -> &[f32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [f32] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable view of the raw buffer. The length cannot change through it.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// `out[r] = Σ_c self[r][c] * x[c]`.
    ///
    /// # Panics
    /// Panics if `x.len() != cols` or `out.len() != rows`; callers check
    /// shapes against the topology first.
    pub fn mul_vec(&self, x: &[f32], out: &mut [f32]) {
        assert_eq!(x.len(), self.cols, "mul_vec: input length");
        assert_eq!(out.len(), self.rows, "mul_vec: output length");
        for (o, row) in out.iter_mut().zip(self.data.chunks_exact(self.cols)) {
            *o = row.iter().zip(x).map(|(w, v)| w * v).sum();
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f32;

    fn index(&self, (r, c): (usize, usize)) -> &f32 {
        debug_assert!(c < self.cols);
        &self.data[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f32 {
        debug_assert!(c < self.cols);
        &mut self.data[r * self.cols + c]
    }
}
