// src/grid.rs

/// Uniform cubic finite-difference grid.
///
/// `n` cells per axis with spacing `h`. The nucleus sits on the central grid
/// vertex, so cell centers are at `(i + 0.5 - n/2) * h` per axis relative to
/// it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid3D {
    pub n: usize,
    pub h: f64,
}

impl Grid3D {
    /// Create a new cubic grid with n³ cells and spacing h.
    ///
    /// `n` must be an even power of two so the grid can be coarsened cleanly
    /// by the multigrid hierarchy.
    pub fn new(n: usize, h: f64) -> Self {
        assert!(
            n >= 2 && n.is_power_of_two(),
            "grid size must be an even power of two, got {}",
            n
        );
        assert!(h > 0.0, "grid spacing must be positive, got {}", h);
        Self { n, h }
    }

    /// Total number of cells.
    pub fn n_cells(&self) -> usize {
        self.n * self.n * self.n
    }

    /// Convert (i, j, k) indices to a flat index into a 1D array.
    /// X varies innermost, then Y, then Z.
    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.n && j < self.n && k < self.n);
        (k * self.n + j) * self.n + i
    }

    /// Derived grid at the given coarseness factor: n/factor cells per axis,
    /// spacing h*factor.
    pub fn coarsen(&self, factor: usize) -> Self {
        assert!(
            factor >= 1 && self.n % factor == 0 && self.n / factor >= 2,
            "grid of size {} cannot be coarsened by factor {}",
            self.n,
            factor
        );
        Self {
            n: self.n / factor,
            h: self.h * (factor as f64),
        }
    }

    /// Physical cell-center coordinates relative to the nucleus.
    ///
    /// Signed indices are allowed so callers can evaluate positions of
    /// would-be neighbors outside the grid (ghost positions for the
    /// monopole boundary term).
    #[inline]
    pub fn cell_center(&self, i: isize, j: isize, k: isize) -> [f64; 3] {
        let half = 0.5 * self.n as f64;
        [
            (i as f64 + 0.5 - half) * self.h,
            (j as f64 + 0.5 - half) * self.h,
            (k as f64 + 0.5 - half) * self.h,
        ]
    }

    /// True if (i, j, k) lies inside the grid.
    #[inline]
    pub fn contains(&self, i: isize, j: isize, k: isize) -> bool {
        let n = self.n as isize;
        i >= 0 && i < n && j >= 0 && j < n && k >= 0 && k < n
    }
}
