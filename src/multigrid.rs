// src/multigrid.rs
//
// Geometric multigrid V-cycle with red-black Gauss-Seidel smoothing.
//
// The hierarchy is an explicit list of grid descriptors indexed by depth
// (coarseness 2^d relative to the finest grid). Levels hold no persistent
// storage: residual and correction fields are allocated per V-cycle step and
// dropped when the recursive call returns. The smoothing schedule is fully
// caller-specified, e.g. "1-4-1" (one coarse level) or "1-2-4-2-1" (two);
// the engine performs no automatic depth or schedule selection.
//
// Transfer operators, cell-centered:
//   restriction  : full weighting, each coarse cell = mean of its 8 children
//   prolongation : direct injection, each coarse value added to all 8 children

use crate::grid::Grid3D;
use crate::scalar_field::ScalarField;
use crate::smoothers;
use crate::solver::trace_enabled;
use crate::stencil;

use rayon::prelude::*;

/// Per-depth GSRB sweep counts for one V-cycle, descending then ascending.
///
/// A schedule of odd length 2d+1 drives d coarse levels: entry 0 is the
/// fine-level pre-smooth, entry d the coarsest-level smooth, entry 2d the
/// fine-level post-smooth. Symmetric schedules are typical but not required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MgSchedule {
    sweeps: Vec<usize>,
}

impl MgSchedule {
    pub fn new(sweeps: Vec<usize>) -> Self {
        assert!(
            sweeps.len() % 2 == 1,
            "multigrid schedule must have odd length (pre..coarsest..post), got {}",
            sweeps.len()
        );
        Self { sweeps }
    }

    /// Parse a dash-separated schedule such as "1-4-1".
    pub fn parse(s: &str) -> Option<Self> {
        let sweeps: Option<Vec<usize>> =
            s.trim().split('-').map(|t| t.trim().parse().ok()).collect();
        let sweeps = sweeps?;
        if sweeps.is_empty() || sweeps.len() % 2 == 0 {
            return None;
        }
        Some(Self { sweeps })
    }

    /// Number of coarse levels below the finest grid.
    pub fn depth(&self) -> usize {
        self.sweeps.len() / 2
    }

    /// Sweep count on the descending leg at the given depth (0 = finest).
    fn descend(&self, depth: usize) -> usize {
        self.sweeps[depth]
    }

    /// Sweep count on the ascending leg at the given depth.
    fn ascend(&self, depth: usize) -> usize {
        self.sweeps[self.sweeps.len() - 1 - depth]
    }
}

impl std::fmt::Display for MgSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.sweeps.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join("-"))
    }
}

/// Restrict a fine field to the next-coarser grid by full weighting: each
/// coarse cell is the arithmetic mean of its 8 child fine cells.
pub fn restrict(fine: &ScalarField, coarse_grid: Grid3D) -> ScalarField {
    let nf = fine.grid.n;
    let nc = coarse_grid.n;
    assert!(
        nf == 2 * nc,
        "restriction expects a 2:1 grid pair, got fine {} vs coarse {}",
        nf,
        nc
    );

    let src: &[f64] = &fine.data;
    let mut coarse = ScalarField::zeros(coarse_grid);

    coarse
        .data
        .par_chunks_mut(nc)
        .enumerate()
        .for_each(|(row_idx, row)| {
            let kc = row_idx / nc;
            let jc = row_idx % nc;

            for ic in 0..nc {
                let mut sum = 0.0;
                for dk in 0..2 {
                    for dj in 0..2 {
                        for di in 0..2 {
                            let id =
                                ((2 * kc + dk) * nf + (2 * jc + dj)) * nf + (2 * ic + di);
                            sum += src[id];
                        }
                    }
                }
                row[ic] = sum / 8.0;
            }
        });

    coarse
}

/// Prolong a coarse correction back to the fine grid by direct injection:
/// each coarse cell's value is added unmodified to all 8 of its children.
pub fn prolong_add(coarse: &ScalarField, fine: &mut ScalarField) {
    let nf = fine.grid.n;
    let nc = coarse.grid.n;
    assert!(
        nf == 2 * nc,
        "prolongation expects a 2:1 grid pair, got fine {} vs coarse {}",
        nf,
        nc
    );

    let src: &[f64] = &coarse.data;

    fine.data
        .par_chunks_mut(nf)
        .enumerate()
        .for_each(|(row_idx, row)| {
            let kc = (row_idx / nf) / 2;
            let jc = (row_idx % nf) / 2;
            let base = (kc * nc + jc) * nc;

            for i in 0..nf {
                row[i] += src[base + i / 2];
            }
        });
}

/// Explicit level hierarchy for the V-cycle.
pub struct Multigrid {
    levels: Vec<Grid3D>,
}

impl Multigrid {
    /// Build a hierarchy of `depth` coarse levels below `grid`. The finest
    /// grid size must be divisible by 2^depth with at least 2 cells per axis
    /// at the coarsest level.
    pub fn new(grid: Grid3D, depth: usize) -> Self {
        assert!(
            grid.n >> depth >= 2,
            "grid of size {} cannot support {} coarse levels",
            grid.n,
            depth
        );
        let levels = (0..=depth).map(|d| grid.coarsen(1 << d)).collect();
        Self { levels }
    }

    /// One V-cycle: fine residual, pre-smooth a correction from zero, recurse
    /// through the coarse levels, then fold the correction into x.
    pub fn v_cycle(&self, x: &mut ScalarField, b: &ScalarField, schedule: &MgSchedule) {
        debug_assert_eq!(x.grid, self.levels[0]);
        debug_assert_eq!(schedule.depth() + 1, self.levels.len());

        let r = stencil::residual(x, b);

        let mut e = ScalarField::zeros(self.levels[0]);
        smoothers::gsrb_sweeps(&mut e, &r, schedule.descend(0));

        if schedule.depth() > 0 {
            self.coarse_step(0, &mut e, &r, schedule);
        }

        x.axpy(1.0, &e);
    }

    /// Recursive coarse-level step at depth `d` (fine side of the transfer).
    ///
    /// Given the current correction `e` and residual `r` on level d:
    /// re-residual against e, restrict to level d+1, smooth a coarse
    /// correction from zero (spacing h·2c via the level's grid), recurse if a
    /// deeper level remains, inject the coarse correction back, then
    /// post-smooth a delta against the updated correction and fold it into e.
    fn coarse_step(&self, d: usize, e: &mut ScalarField, r: &ScalarField, schedule: &MgSchedule) {
        let corrected = stencil::residual(e, r);
        let r_coarse = restrict(&corrected, self.levels[d + 1]);

        let mut e_coarse = ScalarField::zeros(self.levels[d + 1]);
        smoothers::gsrb_sweeps(&mut e_coarse, &r_coarse, schedule.descend(d + 1));

        if d + 1 < schedule.depth() {
            self.coarse_step(d + 1, &mut e_coarse, &r_coarse, schedule);
        }

        prolong_add(&e_coarse, e);

        let corrected = stencil::residual(e, r);
        let mut delta = ScalarField::zeros(self.levels[d]);
        smoothers::gsrb_sweeps(&mut delta, &corrected, schedule.ascend(d));
        e.axpy(1.0, &delta);
    }

    /// Run `cycles` V-cycles from x = 0 and return the iterate with its
    /// residual norm. `tol_abs` stops early once the residual norm falls
    /// below it.
    pub fn solve(
        &self,
        b: &ScalarField,
        cycles: usize,
        schedule: &MgSchedule,
        tol_abs: Option<f64>,
    ) -> (ScalarField, f64) {
        let mut x = ScalarField::zeros(self.levels[0]);
        let mut rnorm = stencil::residual_norm(&x, b);

        for cycle in 0..cycles {
            self.v_cycle(&mut x, b, schedule);
            rnorm = stencil::residual_norm(&x, b);

            if trace_enabled() {
                eprintln!("[mg] cycle {} residual {:.6e}", cycle + 1, rnorm);
            }
            if let Some(tol) = tol_abs {
                if rnorm <= tol {
                    break;
                }
            }
        }

        (x, rnorm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stencil::{build_rhs, point_charge_density, residual_norm};

    #[test]
    fn schedule_parses_and_round_trips() {
        let s = MgSchedule::parse("1-2-4-2-1").unwrap();
        assert_eq!(s.depth(), 2);
        assert_eq!(s.descend(0), 1);
        assert_eq!(s.descend(1), 2);
        assert_eq!(s.descend(2), 4);
        assert_eq!(s.ascend(1), 2);
        assert_eq!(s.ascend(0), 1);
        assert_eq!(s.to_string(), "1-2-4-2-1");

        // Even-length and junk schedules are rejected.
        assert!(MgSchedule::parse("1-2").is_none());
        assert!(MgSchedule::parse("a-b-c").is_none());
    }

    #[test]
    fn restricting_a_constant_field_preserves_the_constant() {
        let fine_grid = Grid3D::new(8, 0.25);
        let mut fine = ScalarField::zeros(fine_grid);
        fine.set_uniform(3.25);

        let coarse = restrict(&fine, fine_grid.coarsen(2));
        for &v in &coarse.data {
            assert_eq!(v, 3.25);
        }

        // Injecting it back reproduces the original constant exactly.
        let mut back = ScalarField::zeros(fine_grid);
        prolong_add(&coarse, &mut back);
        for &v in &back.data {
            assert_eq!(v, 3.25);
        }
    }

    #[test]
    fn restriction_averages_the_eight_children() {
        let fine_grid = Grid3D::new(4, 0.5);
        let mut fine = ScalarField::zeros(fine_grid);
        // Mark one child block with distinct values averaging to 2.0.
        let vals = [1.0, 2.0, 3.0, 4.0, 0.0, 2.0, 2.0, 2.0];
        let mut idx = 0;
        for dk in 0..2 {
            for dj in 0..2 {
                for di in 0..2 {
                    fine.data[fine_grid.idx(di, dj, dk)] = vals[idx];
                    idx += 1;
                }
            }
        }

        let coarse = restrict(&fine, fine_grid.coarsen(2));
        assert!((coarse.data[0] - 2.0).abs() < 1e-12);
        assert_eq!(coarse.data[1], 0.0);
    }

    #[test]
    fn v_cycles_reduce_the_residual() {
        let grid = Grid3D::new(8, 0.25);
        let rho = point_charge_density(grid, 1.0);
        let b = build_rhs(&rho, grid);

        let schedule = MgSchedule::parse("1-4-1").unwrap();
        let mg = Multigrid::new(grid, schedule.depth());

        let x0 = ScalarField::zeros(grid);
        let r0 = residual_norm(&x0, &b);

        let (_, r5) = mg.solve(&b, 5, &schedule, None);
        assert!(r5 < 0.1 * r0, "5 cycles only got {} from {}", r5, r0);
    }

    #[test]
    fn deeper_schedule_runs_on_a_larger_grid() {
        let grid = Grid3D::new(16, 0.25);
        let rho = point_charge_density(grid, 1.0);
        let b = build_rhs(&rho, grid);

        let schedule = MgSchedule::parse("1-2-4-2-1").unwrap();
        let mg = Multigrid::new(grid, schedule.depth());

        let (x, r) = mg.solve(&b, 10, &schedule, None);
        let r0 = residual_norm(&ScalarField::zeros(grid), &b);
        assert!(r < 0.01 * r0, "10 deep cycles only got {} from {}", r, r0);
        assert_eq!(x.data.len(), grid.n_cells());
    }
}
