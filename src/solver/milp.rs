//! Pure-Rust MILP backend (good_lp + microlp).
//!
//! microlp runs branch and bound to completion, so every solution it returns
//! is reported as optimal. It has no time limit, gap or thread parameter.

use super::{RawSolution, SolveStatus, SolverBackend, SolverConfig};
use crate::error::ModelError;
use crate::model::{LinearExpr, LinearModel, ObjectiveSense, Sense};
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};

pub struct MilpSolver {
    config: SolverConfig,
}

impl MilpSolver {
    pub fn new(config: SolverConfig) -> Self {
        MilpSolver { config }
    }
}

impl Default for MilpSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

/// Options set away from their defaults that microlp cannot honour.
fn ignored_options(config: &SolverConfig) -> Vec<&'static str> {
    let defaults = SolverConfig::default();
    let mut ignored = Vec::new();
    if config.time_limit.is_some() {
        ignored.push("Time limit");
    }
    if config.mip_gap != defaults.mip_gap {
        ignored.push("MIP gap");
    }
    if config.threads != defaults.threads {
        ignored.push("Thread count");
    }
    ignored
}

fn to_expression(expr: &LinearExpr, vars: &[Variable]) -> Expression {
    expr.terms
        .iter()
        .map(|&(v, c)| (c as f64) * vars[v.0])
        .sum()
}

impl SolverBackend for MilpSolver {
    fn name(&self) -> &'static str {
        "milp"
    }

    fn solve(&self, model: &LinearModel) -> Result<RawSolution, ModelError> {
        for option in ignored_options(&self.config) {
            log::warn!("{} is not supported by the milp backend; ignoring it", option);
        }
        if model.has_contradiction() {
            log::info!("Model contains an unsatisfiable empty row");
            return Ok(RawSolution::empty(SolveStatus::Infeasible));
        }
        if model.var_count() == 0 {
            return Ok(RawSolution {
                status: SolveStatus::Optimal,
                values: Vec::new(),
                objective: Some(0.0),
            });
        }

        let mut problem = ProblemVariables::new();
        let vars: Vec<Variable> = problem.add_vector(variable().binary(), model.var_count());

        let objective = to_expression(model.objective(), &vars);
        let unsolved = match model.objective_sense() {
            ObjectiveSense::Maximize => problem.maximise(objective),
            ObjectiveSense::Minimize => problem.minimise(objective),
        };
        let mut solver_model = unsolved.using(default_solver);

        for row in model.constraints().iter().filter(|c| !c.expr.is_empty()) {
            let lhs = to_expression(&row.expr, &vars);
            let rhs = row.rhs as f64;
            let c = match row.sense {
                Sense::Eq => constraint!(lhs == rhs),
                Sense::Le => constraint!(lhs <= rhs),
                Sense::Ge => constraint!(lhs >= rhs),
            };
            solver_model.add_constraint(c);
        }

        match solver_model.solve() {
            Ok(solution) => {
                let values: Vec<bool> = vars.iter().map(|&v| solution.value(v) > 0.5).collect();
                let objective = model.objective().evaluate(&values) as f64;
                Ok(RawSolution {
                    status: SolveStatus::Optimal,
                    values,
                    objective: Some(objective),
                })
            }
            Err(ResolutionError::Infeasible) => Ok(RawSolution::empty(SolveStatus::Infeasible)),
            Err(e) => {
                log::warn!("milp backend stopped without a solution: {}", e);
                Ok(RawSolution::empty(SolveStatus::Unknown))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstraintFamily, VarId};

    fn tiny() -> LinearModel {
        let mut model = LinearModel::new(vec!["a".into(), "b".into(), "c".into()]);
        model.set_objective(
            ObjectiveSense::Maximize,
            LinearExpr {
                terms: vec![(VarId(0), 3), (VarId(1), 2), (VarId(2), 1)],
            },
        );
        model.add_constraint(
            ConstraintFamily::AssignOnce,
            LinearExpr::sum([VarId(0), VarId(1)]),
            Sense::Le,
            1,
        );
        model
    }

    #[test]
    fn test_solves_small_program() {
        let raw = MilpSolver::default().solve(&tiny()).unwrap();
        assert_eq!(raw.status, SolveStatus::Optimal);
        assert_eq!(raw.values, vec![true, false, true]);
        assert_eq!(raw.objective, Some(4.0));
    }

    #[test]
    fn test_unsupported_options_are_ignored() {
        assert!(ignored_options(&SolverConfig::default()).is_empty());

        let config = SolverConfig {
            time_limit: Some(5.0),
            mip_gap: 0.05,
            threads: 4,
            verbose: true,
        };
        assert_eq!(
            ignored_options(&config),
            vec!["Time limit", "MIP gap", "Thread count"]
        );

        let raw = MilpSolver::new(config).solve(&tiny()).unwrap();
        assert_eq!(raw.status, SolveStatus::Optimal);
        assert_eq!(raw.values, vec![true, false, true]);
    }

    #[test]
    fn test_infeasible_is_not_an_error() {
        let mut model = tiny();
        model.add_constraint(
            ConstraintFamily::TourStaffing,
            LinearExpr::sum([VarId(0), VarId(1)]),
            Sense::Eq,
            2,
        );
        let raw = MilpSolver::default().solve(&model).unwrap();
        assert_eq!(raw.status, SolveStatus::Infeasible);
        assert!(raw.values.is_empty());
    }

    #[test]
    fn test_empty_contradiction_short_circuits() {
        let mut model = tiny();
        model.add_constraint(ConstraintFamily::TourStaffing, LinearExpr::new(), Sense::Eq, 1);
        let raw = MilpSolver::default().solve(&model).unwrap();
        assert_eq!(raw.status, SolveStatus::Infeasible);
    }
}
