//! Weighted preference objective.

use super::linear::{LinearExpr, LinearModel, ObjectiveSense};
use super::variables::VariableSpace;
use crate::registry::Registry;

/// Maximize `sum rating(g) * priority(t) * x[g,t,s]`.
///
/// Ties are left to the solver.
pub(crate) fn set_preference_objective(
    registry: &Registry,
    space: &VariableSpace,
    model: &mut LinearModel,
) {
    let mut expr = LinearExpr::with_capacity(space.assign_count());
    for (g, t, s) in space.assignments() {
        let weight = registry.guide(g).rating * registry.tour(t).priority;
        if weight != 0 {
            expr.add_term(space.assign(g, t, s), weight);
        }
    }
    model.set_objective(ObjectiveSense::Maximize, expr);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{GuideId, SlotWindow, TourId, WEEK_SLOTS};

    #[test]
    fn test_weights_are_rating_times_priority() {
        let mut registry = Registry::new(1).unwrap();
        registry.add_tour(TourId(0), 1, 5, SlotWindow::new(0, 3), None).unwrap();
        registry.add_tour(TourId(1), 1, 0, SlotWindow::new(0, 3), None).unwrap();
        registry.add_guide(GuideId(0), 3, &[true; WEEK_SLOTS], None).unwrap();

        let space = VariableSpace::new(1, 2, 4);
        let mut model = LinearModel::new(space.names());
        set_preference_objective(&registry, &space, &mut model);

        assert_eq!(model.objective_sense(), ObjectiveSense::Maximize);
        // zero-priority tour contributes no terms
        assert_eq!(model.objective().terms.len(), 4);
        assert!(model.objective().terms.iter().all(|&(_, c)| c == 15));
    }
}
