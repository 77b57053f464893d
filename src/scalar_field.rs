// src/scalar_field.rs

use crate::grid::Grid3D;

/// Scalar field defined on a cubic 3D grid, one value per cell.
///
/// Used for charge density, right-hand sides, potentials, residuals and
/// multigrid corrections. Each solver invocation owns its fields exclusively;
/// nothing here is shared between concurrent solves.
#[derive(Debug, Clone)]
pub struct ScalarField {
    pub grid: Grid3D,
    pub data: Vec<f64>,
}

impl ScalarField {
    /// Create a zero field on the given grid.
    pub fn zeros(grid: Grid3D) -> Self {
        Self {
            grid,
            data: vec![0.0; grid.n_cells()],
        }
    }

    /// Wrap caller-provided cell values. The length must match the cell count.
    pub fn from_vec(grid: Grid3D, data: Vec<f64>) -> Self {
        assert!(
            data.len() == grid.n_cells(),
            "field length {} does not match cell count {} (grid size {})",
            data.len(),
            grid.n_cells(),
            grid.n
        );
        Self { grid, data }
    }

    /// Get the flat index in `data` for grid indices (i, j, k).
    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        self.grid.idx(i, j, k)
    }

    /// Set all cells to the same value.
    pub fn set_uniform(&mut self, v: f64) {
        for cell in &mut self.data {
            *cell = v;
        }
    }

    /// Euclidean inner product with another field on the same grid.
    pub fn dot(&self, other: &ScalarField) -> f64 {
        debug_assert_eq!(self.grid, other.grid);
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// 2-norm of the field.
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// self += a * other (the axpy step of the Krylov recurrences).
    pub fn axpy(&mut self, a: f64, other: &ScalarField) {
        debug_assert_eq!(self.grid, other.grid);
        for (x, y) in self.data.iter_mut().zip(other.data.iter()) {
            *x += a * y;
        }
    }

    /// self *= a.
    pub fn scale(&mut self, a: f64) {
        for x in &mut self.data {
            *x *= a;
        }
    }
}
