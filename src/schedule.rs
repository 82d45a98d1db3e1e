//! Decoded schedules.
//!
//! A [`Schedule`] is what callers consume: guide → tours and tour → slot
//! maps decoded from a raw backend assignment, plus a checker that re-verifies
//! the hard rules directly on the decoded assignment.

use crate::error::ModelError;
use crate::model::{SchedulerConfig, SlotLoadMode, VariableSpace};
use crate::registry::{GuideId, Registry, TourId, SLOTS_PER_DAY, WEEK_SLOTS};
use crate::solver::{RawSolution, SolveStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::path::Path;

/// One guide staffing one tour at one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub guide: GuideId,
    pub tour: TourId,
    pub slot: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub status: SolveStatus,
    /// Tours per guide, in chronological order
    pub guide_assignments: BTreeMap<GuideId, Vec<TourId>>,
    /// Slot at which each staffed tour runs
    pub tour_slots: BTreeMap<TourId, usize>,
    /// Flat list, ordered by guide then slot
    pub assignments: Vec<Assignment>,
    /// Objective value of the decoded assignment
    pub objective: i64,
    /// Wall-clock solve time in seconds
    pub solve_time: f64,
}

/// A hard rule broken by a decoded schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Understaffed { tour: TourId, required: u32, assigned: usize },
    SplitTour { tour: TourId, slots: Vec<usize> },
    DoubleBooked { guide: GuideId, slot: usize },
    Unavailable { guide: GuideId, slot: usize },
    OutsideWindow { tour: TourId, slot: usize },
    WeeklyWorkload { guide: GuideId, week: usize, assigned: usize, cap: u32 },
    SlotLoad { slot: usize, load: usize, cap: u32 },
    FixedTourMoved { tour: TourId, fixed: usize, slot: usize },
    FixedGuideMissing { guide: GuideId, tour: TourId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Understaffed { tour, required, assigned } => {
                write!(f, "tour {} has {} of {} guides", tour, assigned, required)
            }
            Violation::SplitTour { tour, slots } => {
                write!(f, "tour {} runs at several slots {:?}", tour, slots)
            }
            Violation::DoubleBooked { guide, slot } => {
                write!(f, "guide {} has several tours at slot {}", guide, slot)
            }
            Violation::Unavailable { guide, slot } => {
                write!(f, "guide {} is unavailable at slot {}", guide, slot)
            }
            Violation::OutsideWindow { tour, slot } => {
                write!(f, "tour {} runs at slot {} outside its window", tour, slot)
            }
            Violation::WeeklyWorkload { guide, week, assigned, cap } => write!(
                f,
                "guide {} works {} tour-slots in week {} (cap {})",
                guide, assigned, week, cap
            ),
            Violation::SlotLoad { slot, load, cap } => {
                write!(f, "slot {} has load {} (cap {})", slot, load, cap)
            }
            Violation::FixedTourMoved { tour, fixed, slot } => {
                write!(f, "tour {} fixed at slot {} runs at slot {}", tour, fixed, slot)
            }
            Violation::FixedGuideMissing { guide, tour } => {
                write!(f, "guide {} is not on fixed tour {}", guide, tour)
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct AssignmentRow {
    guide: u32,
    tour: u32,
    slot: usize,
    day: usize,
    period: usize,
}

impl Schedule {
    /// Schedule with no assignment, for non-usable statuses.
    pub fn empty(status: SolveStatus) -> Self {
        Schedule {
            status,
            guide_assignments: BTreeMap::new(),
            tour_slots: BTreeMap::new(),
            assignments: Vec::new(),
            objective: 0,
            solve_time: 0.0,
        }
    }

    /// Decode every `x[g,t,s] = 1` of a raw solution.
    ///
    /// Both maps stay empty unless the status is OPTIMAL or FEASIBLE.
    pub fn extract(registry: &Registry, space: &VariableSpace, raw: &RawSolution) -> Self {
        let mut schedule = Schedule::empty(raw.status);
        if !raw.status.is_usable() {
            return schedule;
        }

        for (g, guide) in registry.guides().iter().enumerate() {
            let mut picked: Vec<(usize, usize)> = (0..space.tours())
                .flat_map(|t| (0..space.slots()).map(move |s| (s, t)))
                .filter(|&(s, t)| raw.value(space.assign(g, t, s).0))
                .collect();
            if picked.is_empty() {
                continue;
            }
            picked.sort_unstable();

            let tours = schedule.guide_assignments.entry(guide.id).or_default();
            for (s, t) in picked {
                let tour = registry.tour(t);
                tours.push(tour.id);
                schedule.tour_slots.insert(tour.id, s);
                schedule.objective += guide.rating * tour.priority;
                schedule.assignments.push(Assignment {
                    guide: guide.id,
                    tour: tour.id,
                    slot: s,
                });
            }
        }
        schedule
    }

    pub fn is_usable(&self) -> bool {
        self.status.is_usable()
    }

    /// Tours of one guide, chronologically.
    pub fn tours_of(&self, guide: GuideId) -> &[TourId] {
        self.guide_assignments
            .get(&guide)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Re-check every hard rule on the decoded assignment.
    pub fn violations(&self, registry: &Registry, config: &SchedulerConfig) -> Vec<Violation> {
        let mut violations = Vec::new();
        if !self.is_usable() {
            return violations;
        }

        let mut per_tour: HashMap<TourId, Vec<usize>> = HashMap::new();
        let mut per_guide_slot: HashMap<(GuideId, usize), usize> = HashMap::new();
        let mut per_guide_week: HashMap<(GuideId, usize), usize> = HashMap::new();
        let mut guide_load = vec![0usize; registry.slot_count()];
        let mut tour_starts: HashMap<usize, Vec<TourId>> = HashMap::new();

        for a in &self.assignments {
            per_tour.entry(a.tour).or_default().push(a.slot);
            *per_guide_slot.entry((a.guide, a.slot)).or_default() += 1;
            *per_guide_week.entry((a.guide, a.slot / WEEK_SLOTS)).or_default() += 1;
            if let Some(load) = guide_load.get_mut(a.slot) {
                *load += 1;
            }
            let starts = tour_starts.entry(a.slot).or_default();
            if !starts.contains(&a.tour) {
                starts.push(a.tour);
            }

            if let Some(g) = registry.guide_index(a.guide) {
                if !registry.guide(g).is_available(a.slot) {
                    violations.push(Violation::Unavailable { guide: a.guide, slot: a.slot });
                }
            }
            if let Some(t) = registry.tour_index(a.tour) {
                if !registry.tour(t).window.contains(a.slot) {
                    violations.push(Violation::OutsideWindow { tour: a.tour, slot: a.slot });
                }
            }
        }

        for tour in registry.tours() {
            let mut slots = per_tour.get(&tour.id).cloned().unwrap_or_default();
            if slots.len() != tour.guide_count as usize {
                violations.push(Violation::Understaffed {
                    tour: tour.id,
                    required: tour.guide_count,
                    assigned: slots.len(),
                });
            }
            slots.sort_unstable();
            slots.dedup();
            if slots.len() > 1 {
                violations.push(Violation::SplitTour { tour: tour.id, slots: slots.clone() });
            }
            if let Some(fixed) = tour.fixed_slot {
                for &slot in slots.iter().filter(|&&s| s != fixed) {
                    violations.push(Violation::FixedTourMoved { tour: tour.id, fixed, slot });
                }
            }
        }

        let mut double: Vec<_> = per_guide_slot
            .into_iter()
            .filter(|&(_, n)| n > 1)
            .map(|(key, _)| key)
            .collect();
        double.sort_unstable();
        violations.extend(
            double
                .into_iter()
                .map(|(guide, slot)| Violation::DoubleBooked { guide, slot }),
        );

        let windows = registry.week_windows();
        let mut weekly: Vec<_> = per_guide_week.into_iter().collect();
        weekly.sort_unstable();
        for ((guide, week), assigned) in weekly {
            let len = windows.get(week).map(|w| w.len()).unwrap_or(WEEK_SLOTS);
            let cap = config.final_week_policy.cap(config.weekly_workload, len);
            if assigned > cap as usize {
                violations.push(Violation::WeeklyWorkload { guide, week, assigned, cap });
            }
        }

        for slot in 0..registry.slot_count() {
            let load = match config.slot_load_mode {
                SlotLoadMode::TourStarts => tour_starts.get(&slot).map(Vec::len).unwrap_or(0),
                SlotLoadMode::GuideAssignments => guide_load[slot],
            };
            if load > config.max_slot_load as usize {
                violations.push(Violation::SlotLoad { slot, load, cap: config.max_slot_load });
            }
        }

        for guide in registry.guides() {
            let assigned = self.tours_of(guide.id);
            for &tour in &guide.fixed_tours {
                if !assigned.contains(&tour) {
                    violations.push(Violation::FixedGuideMissing { guide: guide.id, tour });
                }
            }
        }

        violations
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Export one row per assignment: guide, tour, slot, day, period.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        for a in &self.assignments {
            writer.serialize(AssignmentRow {
                guide: a.guide.0,
                tour: a.tour.0,
                slot: a.slot,
                day: a.slot / SLOTS_PER_DAY,
                period: a.slot % SLOTS_PER_DAY,
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Schedule ({})", self.status)?;
        writeln!(f, "  Objective: {}", self.objective)?;
        writeln!(f, "  Tours staffed: {}", self.tour_slots.len())?;
        writeln!(f, "  Guides working: {}", self.guide_assignments.len())?;
        write!(f, "  Time: {:.4}s", self.solve_time)
    }
}
