// src/stencil.rs
//
// Matrix-free 7-point Laplacian for the discrete Poisson equation
//
//   ∇²φ = -4π ρ        (Gaussian units)
//
// split into an interior part (depends on the current iterate) and a
// precomputed boundary part. Out-of-grid neighbors are not stored as ghost
// cells; their contribution is evaluated analytically once per grid using a
// monopole approximation of the enclosed charge (potential 1/|x - x_nucleus|
// at the neighbor's cell center, nucleus on the central grid vertex).
//
// Every solver in this crate works against the effective system
//
//   A_interior x = -4π ρ - boundary_field(grid)
//
// and reports the 2-norm of the residual b_eff - A_interior x.

use crate::grid::Grid3D;
use crate::scalar_field::ScalarField;

use rayon::prelude::*;

use std::f64::consts::PI;

/// Axis-aligned neighbor offsets of the 7-point stencil.
pub const NEIGHBOR_OFFSETS: [[isize; 3]; 6] = [
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
];

/// Apply the interior part of the discrete Laplacian.
///
/// Each cell accumulates -6/h² times its own value plus 1/h² times each
/// in-grid neighbor; out-of-grid neighbors contribute nothing here (they are
/// handled by `boundary_field`). Fully data-parallel across cells.
pub fn apply_interior(x: &ScalarField) -> ScalarField {
    let grid = x.grid;
    let n = grid.n;
    let plane = n * n;
    let inv_h2 = 1.0 / (grid.h * grid.h);

    let src: &[f64] = &x.data;
    let mut out = ScalarField::zeros(grid);

    // Parallelise over contiguous X-rows (k,j rows), the same sweep shape as
    // the smoothers.
    out.data
        .par_chunks_mut(n)
        .enumerate()
        .for_each(|(row_idx, out_row)| {
            let k = row_idx / n;
            let j = row_idx % n;
            let base = row_idx * n;

            for i in 0..n {
                let id = base + i;
                let mut acc = -6.0 * src[id];

                if i > 0 {
                    acc += src[id - 1];
                }
                if i + 1 < n {
                    acc += src[id + 1];
                }
                if j > 0 {
                    acc += src[id - n];
                }
                if j + 1 < n {
                    acc += src[id + n];
                }
                if k > 0 {
                    acc += src[id - plane];
                }
                if k + 1 < n {
                    acc += src[id + plane];
                }

                out_row[i] = inv_h2 * acc;
            }
        });

    out
}

/// Boundary part of the stencil: state-independent, computed once per grid.
///
/// For every face-neighbor position that falls outside the grid, the cell
/// accumulates 1/h² times the analytic monopole potential 1/|x_neighbor|
/// evaluated at the neighbor's physical cell center. This emulates an
/// unbounded domain for a unit charge centered on the grid.
pub fn boundary_field(grid: Grid3D) -> ScalarField {
    let n = grid.n;
    let inv_h2 = 1.0 / (grid.h * grid.h);

    let mut out = ScalarField::zeros(grid);

    out.data
        .par_chunks_mut(n)
        .enumerate()
        .for_each(|(row_idx, out_row)| {
            let k = (row_idx / n) as isize;
            let j = (row_idx % n) as isize;

            // Interior rows only have boundary contributions at i = 0 and
            // i = n-1, but the loop is cheap enough to keep uniform.
            for i in 0..n {
                let i = i as isize;
                let mut acc = 0.0;

                for [di, dj, dk] in NEIGHBOR_OFFSETS {
                    let (ni, nj, nk) = (i + di, j + dj, k + dk);
                    if grid.contains(ni, nj, nk) {
                        continue;
                    }
                    let p = grid.cell_center(ni, nj, nk);
                    let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
                    acc += 1.0 / r;
                }

                out_row[i as usize] = inv_h2 * acc;
            }
        });

    out
}

/// Reference charge density: a point charge `q` split evenly over the 8
/// central cells (q/8 per cell, expressed per unit volume).
pub fn point_charge_density(grid: Grid3D, q: f64) -> ScalarField {
    let n = grid.n;
    let cell_volume = grid.h * grid.h * grid.h;
    let rho = q / 8.0 / cell_volume;

    let mut out = ScalarField::zeros(grid);
    for k in [n / 2 - 1, n / 2] {
        for j in [n / 2 - 1, n / 2] {
            for i in [n / 2 - 1, n / 2] {
                let id = grid.idx(i, j, k);
                out.data[id] = rho;
            }
        }
    }
    out
}

/// Effective right-hand side b_eff = -4π ρ - boundary_field(grid).
///
/// The boundary term is folded in once up front so every solver works only
/// with the interior operator thereafter.
pub fn build_rhs(rho: &ScalarField, grid: Grid3D) -> ScalarField {
    assert!(
        rho.grid == grid,
        "charge density grid (n={}, h={}) does not match solve grid (n={}, h={})",
        rho.grid.n,
        rho.grid.h,
        grid.n,
        grid.h
    );
    assert!(!rho.data.is_empty(), "charge density field is empty");

    let boundary = boundary_field(grid);
    let mut b = ScalarField::zeros(grid);
    for id in 0..b.data.len() {
        b.data[id] = -4.0 * PI * rho.data[id] - boundary.data[id];
    }
    b
}

/// Residual r = b - A_interior x.
pub fn residual(x: &ScalarField, b: &ScalarField) -> ScalarField {
    debug_assert_eq!(x.grid, b.grid);
    let mut r = apply_interior(x);
    for (rv, bv) in r.data.iter_mut().zip(b.data.iter()) {
        *rv = bv - *rv;
    }
    r
}

/// 2-norm of the residual, the universal convergence metric.
pub fn residual_norm(x: &ScalarField, b: &ScalarField) -> f64 {
    residual(x, b).norm()
}
