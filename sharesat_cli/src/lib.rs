//! Library half of the CLI crate: the argument surface, the DIMACS loader,
//! and [StubSolver](solver::StubSolver), the reference engine the binary
//! wires into a portfolio. Split out from `main` so `sharesat_tests` can
//! drive a real engine end to end without depending on a binary target.

pub mod cli;
pub mod config_io;
pub mod dimacs;
pub mod solver;
