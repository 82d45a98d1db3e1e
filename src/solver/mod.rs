//! Solver adapters.
//!
//! A backend takes a [`LinearModel`] and returns one boolean per variable
//! together with a [`SolveStatus`]. Infeasible and undecided outcomes are
//! data; only failures of the backend itself are errors.

mod milp;
pub use milp::MilpSolver;

// When built with the `gurobi` feature, expose the real implementation
#[cfg(feature = "gurobi")]
mod gurobi;
#[cfg(feature = "gurobi")]
pub use gurobi::GurobiSolver;

// Otherwise provide a stub so callers can still select it at runtime
#[cfg(not(feature = "gurobi"))]
mod gurobi_stub {
    use super::{RawSolution, SolverBackend, SolverConfig};
    use crate::error::ModelError;
    use crate::model::LinearModel;

    pub struct GurobiSolver {
        pub config: SolverConfig,
    }

    impl GurobiSolver {
        pub fn new(config: SolverConfig) -> Self {
            GurobiSolver { config }
        }
    }

    impl SolverBackend for GurobiSolver {
        fn name(&self) -> &'static str {
            "gurobi"
        }

        fn solve(&self, _model: &LinearModel) -> Result<RawSolution, ModelError> {
            Err(ModelError::BackendUnavailable("gurobi"))
        }
    }
}

#[cfg(not(feature = "gurobi"))]
pub use gurobi_stub::GurobiSolver;

use crate::error::ModelError;
use crate::model::LinearModel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome reported by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Proven optimal
    Optimal,
    /// Feasible, optimality not proven (time or gap limit)
    Feasible,
    /// No assignment satisfies the model
    Infeasible,
    /// Stopped without an assignment or a proof
    Unknown,
}

impl SolveStatus {
    /// Whether the backend produced an assignment worth decoding.
    pub fn is_usable(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Raw backend output, indexed by variable id.
#[derive(Debug, Clone)]
pub struct RawSolution {
    pub status: SolveStatus,
    /// Empty unless `status` is usable
    pub values: Vec<bool>,
    /// Objective value reported by the backend, if any
    pub objective: Option<f64>,
}

impl RawSolution {
    pub fn empty(status: SolveStatus) -> Self {
        RawSolution {
            status,
            values: Vec::new(),
            objective: None,
        }
    }

    #[inline]
    pub fn value(&self, id: usize) -> bool {
        self.values.get(id).copied().unwrap_or(false)
    }
}

/// Backend configuration
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Time limit in seconds
    pub time_limit: Option<f64>,
    /// Relative MIP gap tolerance
    pub mip_gap: f64,
    /// Number of threads (0 = automatic)
    pub threads: i32,
    /// Enable solver output
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            time_limit: None,
            mip_gap: 1e-6,
            threads: 0,
            verbose: false,
        }
    }
}

pub trait SolverBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, model: &LinearModel) -> Result<RawSolution, ModelError>;
}

/// Runtime backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Backend {
    /// Pure-Rust branch and bound (microlp through good_lp)
    #[default]
    Milp,
    /// Gurobi, requires the `gurobi` feature and a license
    Gurobi,
}

impl Backend {
    pub fn create(&self, config: SolverConfig) -> Box<dyn SolverBackend> {
        match self {
            Backend::Milp => Box::new(MilpSolver::new(config)),
            Backend::Gurobi => Box::new(GurobiSolver::new(config)),
        }
    }
}
