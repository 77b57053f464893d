// src/lib.rs
//
// Iterative solver core for the discrete Poisson equation on a uniform cubic
// grid: matrix-free 7-point Laplacian with a precomputed monopole boundary
// term, Jacobi / red-black Gauss-Seidel smoothers, CG and PCG Krylov drivers
// with a quantized inverse-Laplacian preconditioner, and a geometric
// multigrid V-cycle. Charge-density construction and everything downstream
// of the potential (wave functions, energies, forces) live outside this
// crate and interact with it through `solver`.

pub mod config;
pub mod grid;
pub mod krylov;
pub mod multigrid;
pub mod preconditioner;
pub mod scalar_field;
pub mod smoothers;
pub mod solver;
pub mod stencil;
