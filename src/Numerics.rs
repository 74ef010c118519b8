//! # Numerics Module
//!
//! Small, dependency-light numerical kernels used by the convergence methods.
//!
//! ## Main Structures
//!
//! - **`NelderMead`**: derivative-free simplex minimizer. Used row by row to find the
//!   apparent order of convergence, whose defining relation is implicit and only
//!   piecewise smooth (absolute values), so gradients are not available.
//!   The five-level LES error separation also uses it to polish its starting orders
//!   before the Newton-Raphson solve of `RustedSciThe`.
//!
//! The solver is pure: it borrows the objective, owns no global state and reports
//! non-convergence as a value, never by panicking.
pub mod nelder_mead;
