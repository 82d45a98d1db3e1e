//! Solver-independent linear program over boolean variables.
//!
//! Backends translate a [`LinearModel`] into their own representation; the
//! builder never touches a solver API directly.

use super::constraints::ConstraintFamily;
use serde::{Deserialize, Serialize};

/// Dense variable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VarId(pub usize);

/// Sum of integer-weighted variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, i64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        LinearExpr { terms: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        LinearExpr {
            terms: Vec::with_capacity(capacity),
        }
    }

    /// Sum of the given variables, each with coefficient 1.
    pub fn sum<I: IntoIterator<Item = VarId>>(vars: I) -> Self {
        LinearExpr {
            terms: vars.into_iter().map(|v| (v, 1)).collect(),
        }
    }

    pub fn add_term(&mut self, var: VarId, coefficient: i64) {
        self.terms.push((var, coefficient));
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn evaluate(&self, values: &[bool]) -> i64 {
        self.terms
            .iter()
            .filter(|(v, _)| values.get(v.0).copied().unwrap_or(false))
            .map(|&(_, c)| c)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Eq,
    Le,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveSense {
    Maximize,
    Minimize,
}

/// `expr <sense> rhs`, tagged with the family that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    pub family: ConstraintFamily,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: i64,
}

impl LinearConstraint {
    pub fn is_satisfied_by(&self, values: &[bool]) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::Eq => lhs == self.rhs,
            Sense::Le => lhs <= self.rhs,
            Sense::Ge => lhs >= self.rhs,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinearModel {
    var_names: Vec<String>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
    objective_sense: ObjectiveSense,
}

impl LinearModel {
    /// Model with one boolean variable per name and no constraints.
    pub fn new(var_names: Vec<String>) -> Self {
        LinearModel {
            var_names,
            constraints: Vec::new(),
            objective: LinearExpr::new(),
            objective_sense: ObjectiveSense::Maximize,
        }
    }

    pub fn var_count(&self) -> usize {
        self.var_names.len()
    }

    pub fn var_name(&self, var: VarId) -> &str {
        &self.var_names[var.0]
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn objective_sense(&self) -> ObjectiveSense {
        self.objective_sense
    }

    pub fn add_constraint(
        &mut self,
        family: ConstraintFamily,
        expr: LinearExpr,
        sense: Sense,
        rhs: i64,
    ) {
        self.constraints.push(LinearConstraint {
            family,
            expr,
            sense,
            rhs,
        });
    }

    pub fn set_objective(&mut self, sense: ObjectiveSense, expr: LinearExpr) {
        self.objective_sense = sense;
        self.objective = expr;
    }

    pub fn count_family(&self, family: ConstraintFamily) -> usize {
        self.constraints.iter().filter(|c| c.family == family).count()
    }

    /// True when some row has no terms and can never hold (`0 <sense> rhs`
    /// is false). Backends skip empty rows, so they check this first.
    pub fn has_contradiction(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| c.expr.is_empty() && !c.is_satisfied_by(&[]))
    }

    /// Constraints violated by an assignment, in insertion order.
    pub fn violated_by<'m>(&'m self, values: &'m [bool]) -> impl Iterator<Item = &'m LinearConstraint> + 'm {
        self.constraints
            .iter()
            .filter(move |c| !c.is_satisfied_by(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_evaluation() {
        let expr = LinearExpr {
            terms: vec![(VarId(0), 1), (VarId(1), 1), (VarId(2), -2)],
        };
        let c = LinearConstraint {
            family: ConstraintFamily::Linkage,
            expr,
            sense: Sense::Eq,
            rhs: 0,
        };
        assert!(c.is_satisfied_by(&[true, true, true]));
        assert!(c.is_satisfied_by(&[false, false, false]));
        assert!(!c.is_satisfied_by(&[true, false, false]));
        assert!(!c.is_satisfied_by(&[true, false, true]));
    }

    #[test]
    fn test_violations_listed() {
        let mut model = LinearModel::new(vec!["a".into(), "b".into()]);
        model.add_constraint(
            ConstraintFamily::AssignOnce,
            LinearExpr::sum([VarId(0), VarId(1)]),
            Sense::Le,
            1,
        );
        model.add_constraint(
            ConstraintFamily::TourStaffing,
            LinearExpr::sum([VarId(0)]),
            Sense::Ge,
            1,
        );
        assert_eq!(model.violated_by(&[true, false]).count(), 0);
        assert_eq!(model.violated_by(&[true, true]).count(), 1);
        assert_eq!(model.violated_by(&[false, false]).count(), 1);
        assert_eq!(model.count_family(ConstraintFamily::AssignOnce), 1);
    }
}
