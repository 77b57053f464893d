// src/solver.rs
//
// Entry points exposed to the external collaborators (charge-density
// producer, energy/force evaluator): right-hand-side construction, a method
// dispatcher, and a residual-norm diagnostic for caller-driven convergence
// loops. Method-specific knobs live in `SolveConfig`, with optional env-var
// overrides for experiments that should not require plumbing new parameters
// through the call sites.

use crate::grid::Grid3D;
use crate::krylov;
use crate::multigrid::{MgSchedule, Multigrid};
use crate::scalar_field::ScalarField;
use crate::smoothers;
use crate::stencil;

use std::sync::OnceLock;

pub use crate::stencil::build_rhs;

/// Solver selection for `solve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Reference / diagnostic only; converges slowly.
    Jacobi,
    /// Red-black Gauss-Seidel sweeps.
    GaussSeidel,
    ConjugateGradient,
    PreconditionedConjugateGradient,
    Multigrid,
}

impl Method {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jacobi" => Some(Self::Jacobi),
            "gs" | "gsrb" | "gauss_seidel" | "gauss-seidel" => Some(Self::GaussSeidel),
            "cg" | "conjugate_gradient" => Some(Self::ConjugateGradient),
            "pcg" | "preconditioned_cg" => Some(Self::PreconditionedConjugateGradient),
            "mg" | "multigrid" => Some(Self::Multigrid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jacobi => "jacobi",
            Self::GaussSeidel => "gsrb",
            Self::ConjugateGradient => "cg",
            Self::PreconditionedConjugateGradient => "pcg",
            Self::Multigrid => "mg",
        }
    }
}

/// Method-specific parameters for `solve`.
#[derive(Debug, Clone)]
pub struct SolveConfig {
    /// Sweep / iteration budget for Jacobi, GSRB, CG and PCG.
    pub iterations: usize,

    /// V-cycle count for multigrid.
    pub v_cycles: usize,

    /// Per-depth GSRB sweep schedule for multigrid.
    pub schedule: MgSchedule,

    /// Optional early stop for multigrid once the residual norm falls below
    /// this value; `None` runs the full cycle budget.
    pub tol_abs: Option<f64>,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            iterations: 20,
            v_cycles: 15,
            schedule: MgSchedule::new(vec![1, 4, 1]),
            tol_abs: None,
        }
    }
}

impl SolveConfig {
    /// Configure via env vars so experiments don't require plumbing
    /// parameters through every call site.
    pub fn from_env() -> Self {
        fn get_usize(name: &str) -> Option<usize> {
            std::env::var(name)
                .ok()
                .and_then(|s| s.trim().parse::<usize>().ok())
        }
        fn get_f64(name: &str) -> Option<f64> {
            std::env::var(name)
                .ok()
                .and_then(|s| s.trim().parse::<f64>().ok())
        }

        let mut cfg = Self::default();

        if let Some(v) = get_usize("POISSON_SOLVER_ITERATIONS") {
            cfg.iterations = v.max(1);
        }
        if let Some(v) = get_usize("POISSON_SOLVER_VCYCLES") {
            cfg.v_cycles = v.max(1);
        }
        if let Ok(v) = std::env::var("POISSON_SOLVER_SCHEDULE") {
            if let Some(s) = MgSchedule::parse(&v) {
                cfg.schedule = s;
            }
        }
        if let Some(v) = get_f64("POISSON_SOLVER_TOL_ABS") {
            cfg.tol_abs = Some(v.max(0.0));
        }

        cfg
    }
}

/// Opt-in per-iteration residual traces on stderr.
#[inline]
pub(crate) fn trace_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var("POISSON_SOLVER_TRACE").is_ok())
}

fn check_field(f: &ScalarField, grid: Grid3D) {
    assert!(!f.data.is_empty(), "field is empty");
    assert!(
        f.grid == grid && f.data.len() == grid.n_cells(),
        "field (n={}, len={}) does not match solve grid (n={}, {} cells)",
        f.grid.n,
        f.data.len(),
        grid.n,
        grid.n_cells()
    );
}

/// Solve the effective interior system A x = b with the chosen method from
/// x = 0. Returns the iterate and its final residual 2-norm.
///
/// Every method runs its configured budget to completion; callers that need
/// stagnation or blow-up handling monitor the returned residual norm (see
/// `residual_norm` for re-checking a solution later).
pub fn solve(method: Method, b: &ScalarField, grid: Grid3D, cfg: &SolveConfig) -> (ScalarField, f64) {
    check_field(b, grid);

    match method {
        Method::Jacobi => {
            let mut x = ScalarField::zeros(grid);
            smoothers::jacobi_sweeps(&mut x, b, cfg.iterations);
            let r = stencil::residual_norm(&x, b);
            (x, r)
        }
        Method::GaussSeidel => {
            let mut x = ScalarField::zeros(grid);
            smoothers::gsrb_sweeps(&mut x, b, cfg.iterations);
            let r = stencil::residual_norm(&x, b);
            (x, r)
        }
        Method::ConjugateGradient => krylov::conjugate_gradient(b, cfg.iterations),
        Method::PreconditionedConjugateGradient => {
            krylov::preconditioned_conjugate_gradient(b, cfg.iterations)
        }
        Method::Multigrid => {
            let mg = Multigrid::new(grid, cfg.schedule.depth());
            mg.solve(b, cfg.v_cycles, &cfg.schedule, cfg.tol_abs)
        }
    }
}

/// Diagnostic entry point: 2-norm of b - A x for a caller-driven convergence
/// loop.
pub fn residual_norm(solution: &ScalarField, b: &ScalarField, grid: Grid3D) -> f64 {
    check_field(b, grid);
    check_field(solution, grid);
    stencil::residual_norm(solution, b)
}
