//! Reports: the outcome of some procedure, most importantly termination.

use crate::solver::SolveResult;

/// Final outcome of a portfolio run, as recorded by the termination bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Solve {
    Satisfiable,
    Unsatisfiable,
    Unknown,
    TimedOut,
}

impl From<SolveResult> for Solve {
    fn from(result: SolveResult) -> Self {
        match result {
            SolveResult::Satisfiable => Solve::Satisfiable,
            SolveResult::Unsatisfiable => Solve::Unsatisfiable,
            SolveResult::Unknown => Solve::Unknown,
        }
    }
}

impl std::fmt::Display for Solve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Satisfiable => write!(f, "satisfiable"),
            Self::Unsatisfiable => write!(f, "unsatisfiable"),
            Self::Unknown => write!(f, "unknown"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Report {
    /// A solver on `rank` reported `result`; this is not yet the final word
    /// (the termination bus decides the winner).
    SolverFinished { rank: u32, solver_id: u32, result: Solve },
    /// The termination bus recorded a final result.
    Terminated { result: Solve, winner_rank: u32 },
}
