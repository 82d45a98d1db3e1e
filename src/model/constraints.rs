//! Constraint families.
//!
//! Every family is independent: it only reads the registry and the variable
//! space and appends rows to the linear model, so families can be added in
//! any order or switched off to be tested in isolation.

use super::linear::{LinearExpr, LinearModel, Sense};
use super::variables::VariableSpace;
use super::{FinalWeekPolicy, SchedulerConfig, SlotLoadMode};
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintFamily {
    /// `sum_g x[g,t,s] = guide_count(t) * y[t,s]`
    Linkage,
    /// Fixed tours run at their fixed slot with a full group.
    FixedTour,
    /// Guides staff each of their fixed tours exactly once.
    FixedGuide,
    /// Each tour is staffed by exactly `guide_count` guide-slots.
    TourStaffing,
    /// No assignment while unavailable.
    Availability,
    /// Per-slot load cap.
    SlotLoad,
    /// Per-guide, per-week workload cap.
    WeeklyWorkload,
    /// At most one tour per guide and slot.
    AssignOnce,
    /// No assignment outside the tour's window.
    ValidRange,
}

impl ConstraintFamily {
    pub const ALL: [ConstraintFamily; 9] = [
        ConstraintFamily::Linkage,
        ConstraintFamily::FixedTour,
        ConstraintFamily::FixedGuide,
        ConstraintFamily::TourStaffing,
        ConstraintFamily::Availability,
        ConstraintFamily::SlotLoad,
        ConstraintFamily::WeeklyWorkload,
        ConstraintFamily::AssignOnce,
        ConstraintFamily::ValidRange,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConstraintFamily::Linkage => "linkage",
            ConstraintFamily::FixedTour => "fixed_tour",
            ConstraintFamily::FixedGuide => "fixed_guide",
            ConstraintFamily::TourStaffing => "tour_staffing",
            ConstraintFamily::Availability => "availability",
            ConstraintFamily::SlotLoad => "slot_load",
            ConstraintFamily::WeeklyWorkload => "weekly_workload",
            ConstraintFamily::AssignOnce => "assign_once",
            ConstraintFamily::ValidRange => "valid_range",
        }
    }

    #[inline]
    fn bit(&self) -> u16 {
        1 << (*self as u16)
    }
}

impl fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of enabled constraint families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilySet {
    mask: u16,
}

impl FamilySet {
    pub fn all() -> Self {
        ConstraintFamily::ALL
            .iter()
            .fold(FamilySet::none(), |set, &f| set.with(f))
    }

    pub fn none() -> Self {
        FamilySet { mask: 0 }
    }

    pub fn only(families: &[ConstraintFamily]) -> Self {
        families.iter().fold(FamilySet::none(), |set, &f| set.with(f))
    }

    pub fn with(self, family: ConstraintFamily) -> Self {
        FamilySet {
            mask: self.mask | family.bit(),
        }
    }

    pub fn without(self, family: ConstraintFamily) -> Self {
        FamilySet {
            mask: self.mask & !family.bit(),
        }
    }

    #[inline]
    pub fn contains(&self, family: ConstraintFamily) -> bool {
        self.mask & family.bit() != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = ConstraintFamily> + '_ {
        ConstraintFamily::ALL
            .into_iter()
            .filter(move |f| self.contains(*f))
    }
}

impl Default for FamilySet {
    fn default() -> Self {
        Self::all()
    }
}

pub(crate) struct BuildContext<'a> {
    pub registry: &'a Registry,
    pub space: &'a VariableSpace,
    pub config: &'a SchedulerConfig,
}

/// Append every row of `family` to `model`.
pub(crate) fn add_family(family: ConstraintFamily, ctx: &BuildContext<'_>, model: &mut LinearModel) {
    match family {
        ConstraintFamily::Linkage => add_linkage(ctx, model),
        ConstraintFamily::FixedTour => add_fixed_tours(ctx, model),
        ConstraintFamily::FixedGuide => add_fixed_guides(ctx, model),
        ConstraintFamily::TourStaffing => add_tour_staffing(ctx, model),
        ConstraintFamily::Availability => add_availability(ctx, model),
        ConstraintFamily::SlotLoad => add_slot_load(ctx, model),
        ConstraintFamily::WeeklyWorkload => add_weekly_workload(ctx, model),
        ConstraintFamily::AssignOnce => add_assign_once(ctx, model),
        ConstraintFamily::ValidRange => add_valid_range(ctx, model),
    }
}

fn add_linkage(ctx: &BuildContext<'_>, model: &mut LinearModel) {
    let space = ctx.space;
    for (t, tour) in ctx.registry.tours().iter().enumerate() {
        for s in 0..space.slots() {
            let mut expr = LinearExpr::with_capacity(space.guides() + 1);
            for g in 0..space.guides() {
                expr.add_term(space.assign(g, t, s), 1);
            }
            expr.add_term(space.active(t, s), -(tour.guide_count as i64));
            model.add_constraint(ConstraintFamily::Linkage, expr, Sense::Eq, 0);
        }
    }
}

fn add_fixed_tours(ctx: &BuildContext<'_>, model: &mut LinearModel) {
    let space = ctx.space;
    for (t, tour) in ctx.registry.tours().iter().enumerate() {
        let Some(pos) = tour.fixed_slot else {
            continue;
        };
        for g in 0..space.guides() {
            for s in (0..space.slots()).filter(|&s| s != pos) {
                model.add_constraint(
                    ConstraintFamily::FixedTour,
                    LinearExpr::sum([space.assign(g, t, s)]),
                    Sense::Eq,
                    0,
                );
            }
        }
        model.add_constraint(
            ConstraintFamily::FixedTour,
            LinearExpr::sum((0..space.guides()).map(|g| space.assign(g, t, pos))),
            Sense::Eq,
            tour.guide_count as i64,
        );
    }
}

fn add_fixed_guides(ctx: &BuildContext<'_>, model: &mut LinearModel) {
    let space = ctx.space;
    for (g, guide) in ctx.registry.guides().iter().enumerate() {
        for t in guide
            .fixed_tours
            .iter()
            .filter_map(|&id| ctx.registry.tour_index(id))
        {
            model.add_constraint(
                ConstraintFamily::FixedGuide,
                LinearExpr::sum((0..space.slots()).map(|s| space.assign(g, t, s))),
                Sense::Eq,
                1,
            );
        }
    }
}

fn add_tour_staffing(ctx: &BuildContext<'_>, model: &mut LinearModel) {
    let space = ctx.space;
    for (t, tour) in ctx.registry.tours().iter().enumerate() {
        let expr = LinearExpr::sum(
            (0..space.guides())
                .flat_map(|g| (0..space.slots()).map(move |s| space.assign(g, t, s))),
        );
        model.add_constraint(
            ConstraintFamily::TourStaffing,
            expr,
            Sense::Eq,
            tour.guide_count as i64,
        );
    }
}

fn add_availability(ctx: &BuildContext<'_>, model: &mut LinearModel) {
    let space = ctx.space;
    for (g, guide) in ctx.registry.guides().iter().enumerate() {
        for s in (0..space.slots()).filter(|&s| !guide.is_available(s)) {
            for t in 0..space.tours() {
                model.add_constraint(
                    ConstraintFamily::Availability,
                    LinearExpr::sum([space.assign(g, t, s)]),
                    Sense::Eq,
                    0,
                );
            }
        }
    }
}

fn add_slot_load(ctx: &BuildContext<'_>, model: &mut LinearModel) {
    let space = ctx.space;
    let cap = ctx.config.max_slot_load as i64;
    for s in 0..space.slots() {
        let expr = match ctx.config.slot_load_mode {
            SlotLoadMode::TourStarts => {
                LinearExpr::sum((0..space.tours()).map(|t| space.active(t, s)))
            }
            SlotLoadMode::GuideAssignments => LinearExpr::sum(
                (0..space.guides())
                    .flat_map(|g| (0..space.tours()).map(move |t| space.assign(g, t, s))),
            ),
        };
        model.add_constraint(ConstraintFamily::SlotLoad, expr, Sense::Le, cap);
    }
}

fn add_weekly_workload(ctx: &BuildContext<'_>, model: &mut LinearModel) {
    let space = ctx.space;
    let windows = ctx.registry.week_windows();
    for g in 0..space.guides() {
        for window in &windows {
            let cap = ctx
                .config
                .final_week_policy
                .cap(ctx.config.weekly_workload, window.len());
            let expr = LinearExpr::sum(
                (0..space.tours())
                    .flat_map(|t| window.clone().map(move |s| space.assign(g, t, s))),
            );
            model.add_constraint(ConstraintFamily::WeeklyWorkload, expr, Sense::Le, cap as i64);
        }
    }
}

fn add_assign_once(ctx: &BuildContext<'_>, model: &mut LinearModel) {
    let space = ctx.space;
    for g in 0..space.guides() {
        for s in 0..space.slots() {
            model.add_constraint(
                ConstraintFamily::AssignOnce,
                LinearExpr::sum((0..space.tours()).map(|t| space.assign(g, t, s))),
                Sense::Le,
                1,
            );
        }
    }
}

fn add_valid_range(ctx: &BuildContext<'_>, model: &mut LinearModel) {
    let space = ctx.space;
    for (t, tour) in ctx.registry.tours().iter().enumerate() {
        for s in (0..space.slots()).filter(|&s| !tour.window.contains(s)) {
            model.add_constraint(
                ConstraintFamily::ValidRange,
                LinearExpr::sum((0..space.guides()).map(|g| space.assign(g, t, s))),
                Sense::Eq,
                0,
            );
        }
    }
}

impl FinalWeekPolicy {
    /// Workload cap for a week window of `len` slots.
    pub fn cap(&self, weekly_workload: u32, len: usize) -> u32 {
        match self {
            FinalWeekPolicy::FullCap => weekly_workload,
            FinalWeekPolicy::Prorated => {
                (weekly_workload as usize * len / crate::registry::WEEK_SLOTS) as u32
            }
        }
    }
}
