//! MILP formulation of the guide/tour assignment problem.
//!
//! The formulation uses:
//! - Binary variables x[g][t][s]: guide g staffs tour t at slot s
//! - Binary variables y[t][s]: tour t runs at slot s
//! - Nine independent constraint families (see [`ConstraintFamily`])
//! - A weighted preference objective, maximized
//!
//! A [`ScheduleModel`] borrows its [`Registry`], so entities cannot change
//! while a model built from them is alive.

pub mod constraints;
pub mod linear;
pub mod objective;
pub mod variables;

pub use constraints::{ConstraintFamily, FamilySet};
pub use linear::{LinearConstraint, LinearExpr, LinearModel, ObjectiveSense, Sense, VarId};
pub use variables::{Variable, VariableSpace};

use crate::error::ModelError;
use crate::registry::Registry;
use crate::schedule::Schedule;
use crate::solver::SolverBackend;
use constraints::BuildContext;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// What the slot load cap counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlotLoadMode {
    /// Tours starting in the slot (`sum_t y[t,s]`)
    #[default]
    TourStarts,
    /// Guide assignments in the slot (`sum_{g,t} x[g,t,s]`)
    GuideAssignments,
}

/// Workload cap applied to the final, possibly shorter, week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FinalWeekPolicy {
    /// Same cap as a full week
    #[default]
    FullCap,
    /// Cap scaled by the window length, rounded down
    Prorated,
}

/// Model-level configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum tour-slots per guide per week
    pub weekly_workload: u32,
    /// Maximum load per slot
    pub max_slot_load: u32,
    pub slot_load_mode: SlotLoadMode,
    pub final_week_policy: FinalWeekPolicy,
    /// Constraint families to generate
    pub families: FamilySet,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            weekly_workload: 7,
            max_slot_load: 1,
            slot_load_mode: SlotLoadMode::default(),
            final_week_policy: FinalWeekPolicy::default(),
            families: FamilySet::all(),
        }
    }
}

/// Size of a built model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatistics {
    pub guides: usize,
    pub tours: usize,
    pub slots: usize,
    pub variables: usize,
    pub constraints: usize,
    /// Row count per family, in family order
    pub family_rows: Vec<(ConstraintFamily, usize)>,
    pub objective_terms: usize,
}

impl std::fmt::Display for ModelStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Model: {} guides x {} tours x {} slots",
            self.guides, self.tours, self.slots
        )?;
        writeln!(f, "  Variables: {}", self.variables)?;
        writeln!(f, "  Constraints: {}", self.constraints)?;
        for (family, rows) in &self.family_rows {
            writeln!(f, "    {:<16} {:>8}", family.name(), rows)?;
        }
        write!(f, "  Objective terms: {}", self.objective_terms)
    }
}

/// A fully built, immutable model ready to be handed to a solver.
#[derive(Debug)]
pub struct ScheduleModel<'a> {
    registry: &'a Registry,
    config: SchedulerConfig,
    space: VariableSpace,
    program: LinearModel,
}

impl<'a> ScheduleModel<'a> {
    pub fn build(registry: &'a Registry, config: &SchedulerConfig) -> Self {
        let start = Instant::now();
        let space = VariableSpace::new(
            registry.guides().len(),
            registry.tours().len(),
            registry.slot_count(),
        );
        let mut program = LinearModel::new(space.names());

        let ctx = BuildContext {
            registry,
            space: &space,
            config,
        };
        for family in config.families.iter() {
            let before = program.constraints().len();
            constraints::add_family(family, &ctx, &mut program);
            log::debug!(
                "Added {} '{}' constraints",
                program.constraints().len() - before,
                family
            );
        }
        objective::set_preference_objective(registry, &space, &mut program);

        log::info!(
            "Built model with {} variables and {} constraints in {:.3}s",
            program.var_count(),
            program.constraints().len(),
            start.elapsed().as_secs_f64()
        );

        ScheduleModel {
            registry,
            config: config.clone(),
            space,
            program,
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn space(&self) -> &VariableSpace {
        &self.space
    }

    pub fn program(&self) -> &LinearModel {
        &self.program
    }

    pub fn statistics(&self) -> ModelStatistics {
        ModelStatistics {
            guides: self.space.guides(),
            tours: self.space.tours(),
            slots: self.space.slots(),
            variables: self.program.var_count(),
            constraints: self.program.constraints().len(),
            family_rows: self
                .config
                .families
                .iter()
                .map(|f| (f, self.program.count_family(f)))
                .collect(),
            objective_terms: self.program.objective().terms.len(),
        }
    }

    /// Solve with `backend` and decode the result.
    ///
    /// Infeasible or undecided outcomes are returned as an empty schedule with
    /// the matching status; only backend failures are errors.
    pub fn solve<B: SolverBackend + ?Sized>(&self, backend: &B) -> Result<Schedule, ModelError> {
        let start = Instant::now();
        let raw = backend.solve(&self.program)?;
        let elapsed = start.elapsed().as_secs_f64();
        log::info!(
            "Solver `{}` finished with status {} in {:.3}s",
            backend.name(),
            raw.status,
            elapsed
        );

        let mut schedule = Schedule::extract(self.registry, &self.space, &raw);
        schedule.solve_time = elapsed;
        Ok(schedule)
    }
}
