// tests/solver_methods.rs
//
// Integration tests for the solve dispatcher wiring and the env-var
// configuration overrides. These are about *wiring*, not about convergence
// quality (see tests/convergence.rs for that).

use poisson_sim::grid::Grid3D;
use poisson_sim::krylov;
use poisson_sim::multigrid::{MgSchedule, Multigrid};
use poisson_sim::scalar_field::ScalarField;
use poisson_sim::solver::{build_rhs, solve, Method, SolveConfig};
use poisson_sim::stencil::point_charge_density;

use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn reference_rhs(grid: Grid3D) -> ScalarField {
    let rho = point_charge_density(grid, 1.0);
    build_rhs(&rho, grid)
}

#[test]
fn dispatch_routes_to_pcg() {
    let grid = Grid3D::new(8, 0.25);
    let b = reference_rhs(grid);
    let cfg = SolveConfig {
        iterations: 8,
        ..SolveConfig::default()
    };

    let (x_dispatch, r_dispatch) =
        solve(Method::PreconditionedConjugateGradient, &b, grid, &cfg);
    let (x_direct, r_direct) = krylov::preconditioned_conjugate_gradient(&b, 8);

    assert_eq!(r_dispatch, r_direct);
    let max_abs = x_dispatch
        .data
        .iter()
        .zip(x_direct.data.iter())
        .map(|(a, c)| (a - c).abs())
        .fold(0.0f64, f64::max);
    assert!(max_abs == 0.0, "dispatcher vs direct PCG mismatch: {}", max_abs);
}

#[test]
fn dispatch_routes_to_multigrid() {
    let grid = Grid3D::new(8, 0.25);
    let b = reference_rhs(grid);
    let schedule = MgSchedule::parse("1-4-1").unwrap();
    let cfg = SolveConfig {
        v_cycles: 3,
        schedule: schedule.clone(),
        tol_abs: None,
        ..SolveConfig::default()
    };

    let (x_dispatch, r_dispatch) = solve(Method::Multigrid, &b, grid, &cfg);

    let mg = Multigrid::new(grid, schedule.depth());
    let (x_direct, r_direct) = mg.solve(&b, 3, &schedule, None);

    assert_eq!(r_dispatch, r_direct);
    let max_abs = x_dispatch
        .data
        .iter()
        .zip(x_direct.data.iter())
        .map(|(a, c)| (a - c).abs())
        .fold(0.0f64, f64::max);
    assert!(max_abs == 0.0, "dispatcher vs direct MG mismatch: {}", max_abs);
}

#[test]
fn solve_config_reads_env_overrides() {
    // NOTE: Mutating process environment variables is `unsafe` in recent
    // Rust because it can race with concurrent reads of `environ`. The
    // mutations here are serialized behind ENV_LOCK.
    let _guard = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();

    unsafe {
        std::env::set_var("POISSON_SOLVER_ITERATIONS", "33");
        std::env::set_var("POISSON_SOLVER_SCHEDULE", "1-2-4-2-1");
        std::env::set_var("POISSON_SOLVER_TOL_ABS", "1e-4");
    }

    let cfg = SolveConfig::from_env();

    unsafe {
        std::env::remove_var("POISSON_SOLVER_ITERATIONS");
        std::env::remove_var("POISSON_SOLVER_SCHEDULE");
        std::env::remove_var("POISSON_SOLVER_TOL_ABS");
    }

    assert_eq!(cfg.iterations, 33);
    assert_eq!(cfg.schedule, MgSchedule::parse("1-2-4-2-1").unwrap());
    assert_eq!(cfg.tol_abs, Some(1e-4));
    // Unset knobs keep their defaults.
    assert_eq!(cfg.v_cycles, SolveConfig::default().v_cycles);
}

#[test]
fn gauss_seidel_dispatch_beats_jacobi_dispatch() {
    let grid = Grid3D::new(8, 0.25);
    let b = reference_rhs(grid);
    let cfg = SolveConfig {
        iterations: 15,
        ..SolveConfig::default()
    };

    let (_, r_jacobi) = solve(Method::Jacobi, &b, grid, &cfg);
    let (_, r_gsrb) = solve(Method::GaussSeidel, &b, grid, &cfg);
    assert!(
        r_gsrb < r_jacobi,
        "gsrb {} not ahead of jacobi {}",
        r_gsrb,
        r_jacobi
    );
}
