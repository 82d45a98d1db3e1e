//! Gurobi backend.
//!
//! Translates the linear model row by row. A time- or gap-limited run that
//! found an incumbent is reported as FEASIBLE.

use super::{RawSolution, SolveStatus, SolverBackend, SolverConfig};
use crate::error::ModelError;
use crate::model::{LinearExpr, LinearModel, ObjectiveSense, Sense, VarId};
use grb::prelude::*;

/// Gurobi-based solver
pub struct GurobiSolver {
    config: SolverConfig,
}

impl GurobiSolver {
    pub fn new(config: SolverConfig) -> Self {
        GurobiSolver { config }
    }
}

fn backend_err(context: &str, e: grb::Error) -> ModelError {
    ModelError::Backend(format!("{}: {}", context, e))
}

fn to_expr(expr: &LinearExpr, vars: &[Var]) -> Expr {
    expr.terms
        .iter()
        .map(|&(v, c)| (c as f64) * vars[v.0])
        .grb_sum()
}

impl SolverBackend for GurobiSolver {
    fn name(&self) -> &'static str {
        "gurobi"
    }

    fn solve(&self, model: &LinearModel) -> Result<RawSolution, ModelError> {
        if model.has_contradiction() {
            log::info!("Model contains an unsatisfiable empty row");
            return Ok(RawSolution::empty(SolveStatus::Infeasible));
        }

        let env = Env::new("").map_err(|e| backend_err("Failed to create Gurobi environment", e))?;
        let mut m = Model::with_env("TourRoster", env)
            .map_err(|e| backend_err("Failed to create model", e))?;

        if let Some(limit) = self.config.time_limit {
            m.set_param(param::TimeLimit, limit)
                .map_err(|e| backend_err("Failed to set time limit", e))?;
        }
        m.set_param(param::MIPGap, self.config.mip_gap)
            .map_err(|e| backend_err("Failed to set MIP gap", e))?;
        m.set_param(param::Threads, self.config.threads)
            .map_err(|e| backend_err("Failed to set threads", e))?;
        if !self.config.verbose {
            m.set_param(param::OutputFlag, 0)
                .map_err(|e| backend_err("Failed to set output flag", e))?;
        }

        let mut vars: Vec<Var> = Vec::with_capacity(model.var_count());
        for id in 0..model.var_count() {
            let var = add_binvar!(m, name: model.var_name(VarId(id)))
                .map_err(|e| backend_err("Failed to add variable", e))?;
            vars.push(var);
        }
        m.update().map_err(|e| backend_err("Failed to update model", e))?;

        for (i, row) in model.constraints().iter().enumerate() {
            if row.expr.is_empty() {
                continue;
            }
            let lhs = to_expr(&row.expr, &vars);
            let rhs = row.rhs as f64;
            let constr = match row.sense {
                Sense::Eq => c!(lhs == rhs),
                Sense::Le => c!(lhs <= rhs),
                Sense::Ge => c!(lhs >= rhs),
            };
            m.add_constr(&format!("{}_{}", row.family.name(), i), constr)
                .map_err(|e| backend_err("Failed to add constraint", e))?;
        }

        let sense = match model.objective_sense() {
            ObjectiveSense::Maximize => ModelSense::Maximize,
            ObjectiveSense::Minimize => ModelSense::Minimize,
        };
        m.set_objective(to_expr(model.objective(), &vars), sense)
            .map_err(|e| backend_err("Failed to set objective", e))?;

        m.optimize().map_err(|e| backend_err("Optimization failed", e))?;

        let status = m.status().map_err(|e| backend_err("Failed to get status", e))?;
        let solutions = m.get_attr(attr::SolCount).unwrap_or(0);

        let status = match status {
            Status::Optimal => SolveStatus::Optimal,
            Status::Infeasible | Status::InfOrUnbd => SolveStatus::Infeasible,
            Status::TimeLimit
            | Status::NodeLimit
            | Status::SolutionLimit
            | Status::Interrupted
            | Status::IterationLimit
                if solutions > 0 =>
            {
                SolveStatus::Feasible
            }
            _ => SolveStatus::Unknown,
        };

        if !status.is_usable() {
            return Ok(RawSolution::empty(status));
        }

        let mut values = Vec::with_capacity(vars.len());
        for var in &vars {
            let val = m
                .get_obj_attr(attr::X, var)
                .map_err(|e| backend_err("Failed to read variable value", e))?;
            values.push(val > 0.5);
        }
        let objective = m.get_attr(attr::ObjVal).ok();

        Ok(RawSolution {
            status,
            values,
            objective,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConstraintFamily;

    #[test]
    #[ignore]
    fn test_gurobi_small_program() {
        let mut model = LinearModel::new(vec!["a".into(), "b".into()]);
        model.set_objective(
            ObjectiveSense::Maximize,
            LinearExpr {
                terms: vec![(VarId(0), 2), (VarId(1), 1)],
            },
        );
        model.add_constraint(
            ConstraintFamily::AssignOnce,
            LinearExpr::sum([VarId(0), VarId(1)]),
            Sense::Le,
            1,
        );
        let raw = GurobiSolver::new(SolverConfig::default()).solve(&model).unwrap();
        assert_eq!(raw.status, SolveStatus::Optimal);
        assert_eq!(raw.values, vec![true, false]);
    }
}
