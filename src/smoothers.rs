// src/smoothers.rs
//
// Relaxation sweeps for the interior Laplacian.
//
// Jacobi reads only the previous iterate, so all cells update in parallel.
// Red-black Gauss-Seidel 2-colors the cells by index parity: every 7-point
// neighbor of a cell has the opposite color, so all cells of one color
// update independently; the barrier between the red and the black sweep is
// the only synchronization point. New values are computed into a scratch
// buffer in parallel and then committed per color.

use crate::scalar_field::ScalarField;
use crate::stencil;

use rayon::prelude::*;

/// Sum of in-grid face-neighbor values (unit weights; the 1/h² factor is
/// applied by the caller).
#[inline]
fn neighbor_sum(src: &[f64], n: usize, i: usize, j: usize, k: usize, id: usize) -> f64 {
    let plane = n * n;
    let mut s = 0.0;
    if i > 0 {
        s += src[id - 1];
    }
    if i + 1 < n {
        s += src[id + 1];
    }
    if j > 0 {
        s += src[id - n];
    }
    if j + 1 < n {
        s += src[id + n];
    }
    if k > 0 {
        s += src[id - plane];
    }
    if k + 1 < n {
        s += src[id + plane];
    }
    s
}

/// Jacobi relaxation: x += (1/D)(b - A x) with constant diagonal D = -6/h².
///
/// Converges slowly; kept for reference and diagnostics, not production use.
pub fn jacobi_sweeps(x: &mut ScalarField, b: &ScalarField, iters: usize) {
    debug_assert_eq!(x.grid, b.grid);
    let inv_diag = x.grid.h * x.grid.h / -6.0;

    for _ in 0..iters {
        let ax = stencil::apply_interior(x);
        x.data
            .par_iter_mut()
            .zip(ax.data.par_iter())
            .zip(b.data.par_iter())
            .for_each(|((xv, av), bv)| {
                *xv += inv_diag * (bv - av);
            });
    }
}

/// One parallel half-sweep of red-black Gauss-Seidel for the given color
/// (0 = red, 1 = black). Updates are computed into `tmp` and committed back,
/// so same-color update order cannot matter.
fn gsrb_color_sweep(x: &mut ScalarField, b: &ScalarField, color: usize, tmp: &mut Vec<f64>) {
    let n = x.grid.n;
    let inv_h2 = 1.0 / (x.grid.h * x.grid.h);
    let diag = -6.0 * inv_h2;

    let src: &[f64] = &x.data;
    let rhs: &[f64] = &b.data;

    tmp.par_chunks_mut(n)
        .enumerate()
        .for_each(|(row_idx, tmp_row)| {
            let k = row_idx / n;
            let j = row_idx % n;
            let base = row_idx * n;

            for i in 0..n {
                if (i + j + k) & 1 != color {
                    continue;
                }
                let id = base + i;
                let s = neighbor_sum(src, n, i, j, k, id);
                tmp_row[i] = (rhs[id] - inv_h2 * s) / diag;
            }
        });

    let committed: &[f64] = &tmp[..];
    x.data
        .par_chunks_mut(n)
        .enumerate()
        .for_each(|(row_idx, x_row)| {
            let k = row_idx / n;
            let j = row_idx % n;
            let base = row_idx * n;
            for i in 0..n {
                if (i + j + k) & 1 != color {
                    continue;
                }
                x_row[i] = committed[base + i];
            }
        });
}

/// Red-black Gauss-Seidel: one iteration is a full red sweep followed by a
/// full black sweep (the black cells read the freshly committed red values).
pub fn gsrb_sweeps(x: &mut ScalarField, b: &ScalarField, iters: usize) {
    debug_assert_eq!(x.grid, b.grid);
    let mut tmp = vec![0.0; x.data.len()];

    for _ in 0..iters {
        for color in 0..2 {
            gsrb_color_sweep(x, b, color, &mut tmp);
        }
    }
}

/// Comparison-only single-level variant: relax each color half of the grid
/// against a damped-Jacobi-style update x[c] += Δt (b[c] - (A x)[c]) with
/// Δt = h²/(-6). Not a multigrid level; kept as an alternative smoother for
/// diagnostics.
pub fn damped_red_black_sweeps(x: &mut ScalarField, b: &ScalarField, iters: usize) {
    debug_assert_eq!(x.grid, b.grid);
    let n = x.grid.n;
    let inv_h2 = 1.0 / (x.grid.h * x.grid.h);
    let dt = x.grid.h * x.grid.h / -6.0;

    let mut tmp = vec![0.0; x.data.len()];

    for _ in 0..iters {
        for color in 0..2 {
            let src: &[f64] = &x.data;
            let rhs: &[f64] = &b.data;

            tmp.par_chunks_mut(n)
                .enumerate()
                .for_each(|(row_idx, tmp_row)| {
                    let k = row_idx / n;
                    let j = row_idx % n;
                    let base = row_idx * n;

                    for i in 0..n {
                        if (i + j + k) & 1 != color {
                            continue;
                        }
                        let id = base + i;
                        let ax = inv_h2 * (neighbor_sum(src, n, i, j, k, id) - 6.0 * src[id]);
                        tmp_row[i] = src[id] + dt * (rhs[id] - ax);
                    }
                });

            let committed: &[f64] = &tmp;
            x.data
                .par_chunks_mut(n)
                .enumerate()
                .for_each(|(row_idx, x_row)| {
                    let k = row_idx / n;
                    let j = row_idx % n;
                    let base = row_idx * n;
                    for i in 0..n {
                        if (i + j + k) & 1 != color {
                            continue;
                        }
                        x_row[i] = committed[base + i];
                    }
                });
        }
    }
}
