// src/preconditioner.rs
//
// Fixed-stencil approximation of the inverse Laplacian Green's function,
// used to seed the PCG search directions. The kernel combines two decaying
// exponentials of the squared integer offset distance d²,
//
//   K(d²) = 0.6 exp(-2.25 d²) + 0.4 exp(-0.72 d²),   d² <= 4
//
// giving a 33-point 3D stencil. Weights are quantized to 16-bit signed fixed
// point (scale 32767) for compact storage. The kernel is translation
// invariant and independent of the grid spacing, so one shared instance
// serves every preconditioned solve.

use crate::scalar_field::ScalarField;

use rayon::prelude::*;

use std::sync::OnceLock;

/// Fixed-point scale of the quantized kernel weights.
pub const WEIGHT_SCALE: f64 = 32767.0;

/// Largest squared offset distance included in the kernel.
const MAX_D2: i32 = 4;

/// One kernel tap: integer offset plus a 16-bit fixed-point weight
/// (fraction of 1.0, scale 32767).
#[derive(Debug, Clone, Copy)]
pub struct KernelEntry {
    pub di: i8,
    pub dj: i8,
    pub dk: i8,
    pub weight: i16,
}

/// Precomputed inverse-Laplacian convolution kernel.
#[derive(Debug, Clone)]
pub struct InverseKernel {
    entries: Vec<KernelEntry>,
}

fn kernel_profile(d2: f64) -> f64 {
    0.6 * (-2.25 * d2).exp() + 0.4 * (-0.72 * d2).exp()
}

impl InverseKernel {
    /// Build the quantized 33-point kernel.
    pub fn build() -> Self {
        let r = 2i32;
        let mut entries = Vec::new();

        for dk in -r..=r {
            for dj in -r..=r {
                for di in -r..=r {
                    let d2 = di * di + dj * dj + dk * dk;
                    if d2 > MAX_D2 {
                        continue;
                    }
                    let w = kernel_profile(d2 as f64);
                    let weight = (w * WEIGHT_SCALE).round() as i16;
                    entries.push(KernelEntry {
                        di: di as i8,
                        dj: dj as i8,
                        dk: dk as i8,
                        weight,
                    });
                }
            }
        }

        Self { entries }
    }

    /// Shared kernel instance. The weights do not depend on the grid, so one
    /// build serves every resolution.
    pub fn shared() -> &'static InverseKernel {
        static KERNEL: OnceLock<InverseKernel> = OnceLock::new();
        KERNEL.get_or_init(InverseKernel::build)
    }

    pub fn entries(&self) -> &[KernelEntry] {
        &self.entries
    }

    /// Finite convolution: for each cell, sum weight * x[neighbor] over all
    /// kernel offsets that remain in-grid, skipping the rest. No wraparound
    /// and no boundary correction; this is an approximate preconditioner,
    /// not an exact solve.
    pub fn apply(&self, x: &ScalarField) -> ScalarField {
        let grid = x.grid;
        let n = grid.n as isize;
        let plane = n * n;

        let src: &[f64] = &x.data;
        let entries = &self.entries;
        let mut out = ScalarField::zeros(grid);

        out.data
            .par_chunks_mut(grid.n)
            .enumerate()
            .for_each(|(row_idx, out_row)| {
                let k = (row_idx / grid.n) as isize;
                let j = (row_idx % grid.n) as isize;

                for i in 0..n {
                    let mut acc = 0.0;
                    for e in entries {
                        let ni = i + e.di as isize;
                        let nj = j + e.dj as isize;
                        let nk = k + e.dk as isize;
                        if ni < 0 || ni >= n || nj < 0 || nj >= n || nk < 0 || nk >= n {
                            continue;
                        }
                        let w = e.weight as f64 / WEIGHT_SCALE;
                        acc += w * src[(nk * plane + nj * n + ni) as usize];
                    }
                    out_row[i as usize] = acc;
                }
            });

        out
    }
}
