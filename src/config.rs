// src/config.rs

use crate::grid::Grid3D;
use crate::solver::{Method, SolveConfig};

use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// Provenance record of one solve, written as JSON next to a run's outputs
/// by external drivers.
#[derive(Serialize)]
pub struct RunConfig {
    pub geometry: GeometryConfig,
    pub solver: SolverConfig,
    pub result: ResultInfo,
}

#[derive(Serialize)]
pub struct GeometryConfig {
    pub n: usize,
    pub h: f64,
}

#[derive(Serialize)]
pub struct SolverConfig {
    pub method: String,
    pub iterations: usize,
    pub v_cycles: usize,
    pub schedule: String,
    pub tol_abs: Option<f64>,
}

#[derive(Serialize)]
pub struct ResultInfo {
    pub residual_norm: f64,
}

impl RunConfig {
    pub fn new(grid: Grid3D, method: Method, cfg: &SolveConfig, residual_norm: f64) -> Self {
        Self {
            geometry: GeometryConfig {
                n: grid.n,
                h: grid.h,
            },
            solver: SolverConfig {
                method: method.as_str().to_string(),
                iterations: cfg.iterations,
                v_cycles: cfg.v_cycles,
                schedule: cfg.schedule.to_string(),
                tol_abs: cfg.tol_abs,
            },
            result: ResultInfo { residual_norm },
        }
    }

    pub fn write_to_dir(&self, out_dir: &Path) -> std::io::Result<()> {
        let path = out_dir.join("solve_config.json");
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
