//! Entity registry for guides and tours.
//!
//! Tours and guides are registered once, before any model is built. The
//! registry owns them in insertion order and keeps id→index maps so that the
//! model builder can address entities by dense indices.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Quarter-day periods per day.
pub const SLOTS_PER_DAY: usize = 4;
/// Days in the canonical availability week.
pub const DAYS_PER_WEEK: usize = 7;
/// Slots in the canonical availability week (7 days x 4 periods).
pub const WEEK_SLOTS: usize = SLOTS_PER_DAY * DAYS_PER_WEEK;

/// Bound on the magnitude of tour priorities and guide ratings. Keeps every
/// objective coefficient and any schedule's total well inside `i64`.
pub const MAX_WEIGHT: i64 = 1_000_000;

/// External identifier of a tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TourId(pub u32);

/// External identifier of a guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuideId(pub u32);

impl fmt::Display for TourId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for GuideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive window of slots `[low, high]` in which a tour may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWindow {
    pub low: usize,
    pub high: usize,
}

impl SlotWindow {
    pub fn new(low: usize, high: usize) -> Self {
        SlotWindow { low, high }
    }

    /// Window covering whole days `[first_day, last_day)`.
    pub fn days(first_day: usize, last_day: usize) -> Self {
        SlotWindow {
            low: first_day * SLOTS_PER_DAY,
            high: (last_day * SLOTS_PER_DAY).saturating_sub(1),
        }
    }

    #[inline]
    pub fn contains(&self, slot: usize) -> bool {
        self.low <= slot && slot <= self.high
    }
}

/// A bookable activity staffed by a fixed number of guides at one slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    pub id: TourId,
    /// Guides required simultaneously
    pub guide_count: u32,
    /// Higher is more valuable
    pub priority: i64,
    pub window: SlotWindow,
    /// Pre-decided slot, if the tour is pinned
    pub fixed_slot: Option<usize>,
}

impl Tour {
    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.fixed_slot.is_some()
    }
}

/// A staff member with a tiled availability pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guide {
    pub id: GuideId,
    /// Higher is more valuable
    pub rating: i64,
    /// One entry per horizon slot
    pub availability: Vec<bool>,
    /// Tours this guide is pre-committed to
    pub fixed_tours: Vec<TourId>,
}

impl Guide {
    #[inline]
    pub fn is_available(&self, slot: usize) -> bool {
        self.availability.get(slot).copied().unwrap_or(false)
    }

    pub fn available_slot_count(&self) -> usize {
        self.availability.iter().filter(|&&a| a).count()
    }
}

/// Owns every tour and guide of one scheduling scenario.
#[derive(Debug, Clone)]
pub struct Registry {
    day_count: usize,
    tours: Vec<Tour>,
    guides: Vec<Guide>,
    tour_index: HashMap<TourId, usize>,
    guide_index: HashMap<GuideId, usize>,
}

impl Registry {
    pub fn new(day_count: usize) -> Result<Self, ModelError> {
        if day_count == 0 {
            return Err(ModelError::EmptyHorizon);
        }
        Ok(Registry {
            day_count,
            tours: Vec::new(),
            guides: Vec::new(),
            tour_index: HashMap::new(),
            guide_index: HashMap::new(),
        })
    }

    pub fn day_count(&self) -> usize {
        self.day_count
    }

    /// Number of slots in the horizon.
    pub fn slot_count(&self) -> usize {
        self.day_count * SLOTS_PER_DAY
    }

    /// Register a tour. A window reaching past the horizon is accepted and
    /// clipped when constraints are generated.
    pub fn add_tour(
        &mut self,
        id: TourId,
        guide_count: u32,
        priority: i64,
        window: SlotWindow,
        fixed_slot: Option<usize>,
    ) -> Result<usize, ModelError> {
        if self.tour_index.contains_key(&id) {
            return Err(ModelError::DuplicateTour(id));
        }
        if guide_count == 0 {
            return Err(ModelError::ZeroGuideCount(id));
        }
        if priority.unsigned_abs() > MAX_WEIGHT as u64 {
            return Err(ModelError::PriorityOutOfRange {
                tour: id,
                priority,
                max: MAX_WEIGHT,
            });
        }
        if window.low > window.high {
            return Err(ModelError::InvertedWindow {
                tour: id,
                low: window.low,
                high: window.high,
            });
        }
        let slot_count = self.slot_count();
        if window.low >= slot_count {
            return Err(ModelError::WindowOutsideHorizon {
                tour: id,
                low: window.low,
                slot_count,
            });
        }
        if let Some(slot) = fixed_slot {
            if !window.contains(slot) {
                return Err(ModelError::FixedSlotOutsideWindow {
                    tour: id,
                    slot,
                    low: window.low,
                    high: window.high,
                });
            }
            if slot >= slot_count {
                return Err(ModelError::FixedSlotOutsideHorizon {
                    tour: id,
                    slot,
                    slot_count,
                });
            }
        }

        let index = self.tours.len();
        self.tours.push(Tour {
            id,
            guide_count,
            priority,
            window,
            fixed_slot,
        });
        self.tour_index.insert(id, index);
        Ok(index)
    }

    /// Register a guide. The 28-entry weekly pattern is tiled over the
    /// horizon, then every fixed tour's slot is forced available.
    ///
    /// Tours referenced through `fixed_tours` must already be registered.
    pub fn add_guide(
        &mut self,
        id: GuideId,
        rating: i64,
        weekly_availability: &[bool],
        fixed_tours: Option<&[TourId]>,
    ) -> Result<usize, ModelError> {
        if self.guide_index.contains_key(&id) {
            return Err(ModelError::DuplicateGuide(id));
        }
        if rating.unsigned_abs() > MAX_WEIGHT as u64 {
            return Err(ModelError::RatingOutOfRange {
                guide: id,
                rating,
                max: MAX_WEIGHT,
            });
        }
        if weekly_availability.len() != WEEK_SLOTS {
            return Err(ModelError::AvailabilityLength {
                guide: id,
                expected: WEEK_SLOTS,
                found: weekly_availability.len(),
            });
        }

        let mut availability: Vec<bool> = (0..self.slot_count())
            .map(|s| weekly_availability[s % WEEK_SLOTS])
            .collect();

        let fixed_tours = fixed_tours.map(<[TourId]>::to_vec).unwrap_or_default();
        for &tour_id in &fixed_tours {
            let tour_idx = self
                .tour_index
                .get(&tour_id)
                .copied()
                .ok_or(ModelError::UnknownTour { guide: id, tour: tour_id })?;
            if let Some(slot) = self.tours[tour_idx].fixed_slot {
                availability[slot] = true;
            }
        }

        let index = self.guides.len();
        self.guides.push(Guide {
            id,
            rating,
            availability,
            fixed_tours,
        });
        self.guide_index.insert(id, index);
        Ok(index)
    }

    pub fn tours(&self) -> &[Tour] {
        &self.tours
    }

    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    #[inline]
    pub fn tour(&self, index: usize) -> &Tour {
        &self.tours[index]
    }

    #[inline]
    pub fn guide(&self, index: usize) -> &Guide {
        &self.guides[index]
    }

    pub fn tour_index(&self, id: TourId) -> Option<usize> {
        self.tour_index.get(&id).copied()
    }

    pub fn guide_index(&self, id: GuideId) -> Option<usize> {
        self.guide_index.get(&id).copied()
    }

    /// Week-aligned slot windows covering the horizon. The last one is
    /// shorter when the horizon is not a whole number of weeks.
    pub fn week_windows(&self) -> Vec<std::ops::Range<usize>> {
        let slot_count = self.slot_count();
        (0..slot_count)
            .step_by(WEEK_SLOTS)
            .map(|start| start..(start + WEEK_SLOTS).min(slot_count))
            .collect()
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Horizon: {} days ({} slots)", self.day_count, self.slot_count())?;
        writeln!(
            f,
            "Tours: {} ({} fixed)",
            self.tours.len(),
            self.tours.iter().filter(|t| t.is_fixed()).count()
        )?;
        writeln!(
            f,
            "Guides: {} ({} with fixed tours)",
            self.guides.len(),
            self.guides.iter().filter(|g| !g.fixed_tours.is_empty()).count()
        )?;
        write!(
            f,
            "Guide-slots required: {}",
            self.tours.iter().map(|t| t.guide_count as usize).sum::<usize>()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always() -> Vec<bool> {
        vec![true; WEEK_SLOTS]
    }

    #[test]
    fn test_availability_is_tiled_over_horizon() {
        let mut registry = Registry::new(10).unwrap();
        let mut weekly = vec![false; WEEK_SLOTS];
        weekly[1] = true;
        registry.add_guide(GuideId(7), 3, &weekly, None).unwrap();

        let guide = registry.guide(0);
        assert_eq!(guide.availability.len(), 40);
        assert!(guide.is_available(1));
        assert!(guide.is_available(29));
        assert!(!guide.is_available(2));
        assert_eq!(guide.available_slot_count(), 2);
    }

    #[test]
    fn test_fixed_tour_forces_availability() {
        let mut registry = Registry::new(7).unwrap();
        registry
            .add_tour(TourId(1), 1, 5, SlotWindow::new(0, 27), Some(12))
            .unwrap();
        registry
            .add_guide(GuideId(0), 5, &vec![false; WEEK_SLOTS], Some(&[TourId(1)][..]))
            .unwrap();

        let guide = registry.guide(0);
        assert!(guide.is_available(12));
        assert_eq!(guide.available_slot_count(), 1);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut registry = Registry::new(7).unwrap();
        registry.add_tour(TourId(1), 1, 5, SlotWindow::new(0, 10), None).unwrap();
        assert!(matches!(
            registry.add_tour(TourId(1), 2, 5, SlotWindow::new(0, 10), None),
            Err(ModelError::DuplicateTour(TourId(1)))
        ));

        registry.add_guide(GuideId(3), 5, &always(), None).unwrap();
        assert!(matches!(
            registry.add_guide(GuideId(3), 5, &always(), None),
            Err(ModelError::DuplicateGuide(GuideId(3)))
        ));
        assert_eq!(registry.tours().len(), 1);
        assert_eq!(registry.guides().len(), 1);
    }

    #[test]
    fn test_malformed_availability_rejected() {
        let mut registry = Registry::new(7).unwrap();
        let err = registry
            .add_guide(GuideId(0), 5, &[true; 27], None)
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::AvailabilityLength { expected: 28, found: 27, .. }
        ));
    }

    #[test]
    fn test_extreme_weights_rejected() {
        let mut registry = Registry::new(7).unwrap();
        assert!(matches!(
            registry.add_tour(TourId(0), 1, i64::MAX, SlotWindow::new(0, 3), None),
            Err(ModelError::PriorityOutOfRange { priority: i64::MAX, .. })
        ));
        assert!(matches!(
            registry.add_tour(TourId(0), 1, i64::MIN, SlotWindow::new(0, 3), None),
            Err(ModelError::PriorityOutOfRange { .. })
        ));
        assert!(matches!(
            registry.add_guide(GuideId(0), -MAX_WEIGHT - 1, &always(), None),
            Err(ModelError::RatingOutOfRange { .. })
        ));
        assert!(registry.tours().is_empty());
        assert!(registry.guides().is_empty());

        registry
            .add_tour(TourId(0), 1, MAX_WEIGHT, SlotWindow::new(0, 3), None)
            .unwrap();
        registry.add_guide(GuideId(0), -MAX_WEIGHT, &always(), None).unwrap();
    }

    #[test]
    fn test_forward_reference_rejected() {
        let mut registry = Registry::new(7).unwrap();
        let err = registry
            .add_guide(GuideId(0), 5, &always(), Some(&[TourId(9)][..]))
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownTour { tour: TourId(9), .. }));
        assert!(registry.guide_index(GuideId(0)).is_none());
    }

    #[test]
    fn test_fixed_slot_must_lie_in_window() {
        let mut registry = Registry::new(7).unwrap();
        assert!(matches!(
            registry.add_tour(TourId(0), 1, 5, SlotWindow::new(4, 8), Some(9)),
            Err(ModelError::FixedSlotOutsideWindow { slot: 9, .. })
        ));
        assert!(matches!(
            registry.add_tour(TourId(0), 1, 5, SlotWindow::new(4, 100), Some(50)),
            Err(ModelError::FixedSlotOutsideHorizon { slot: 50, .. })
        ));
        assert!(registry.tours().is_empty());
    }

    #[test]
    fn test_window_validation() {
        let mut registry = Registry::new(2).unwrap();
        assert!(matches!(
            registry.add_tour(TourId(0), 1, 1, SlotWindow::new(5, 3), None),
            Err(ModelError::InvertedWindow { .. })
        ));
        assert!(matches!(
            registry.add_tour(TourId(0), 1, 1, SlotWindow::new(8, 12), None),
            Err(ModelError::WindowOutsideHorizon { .. })
        ));
        assert!(matches!(
            registry.add_tour(TourId(0), 0, 1, SlotWindow::new(0, 3), None),
            Err(ModelError::ZeroGuideCount(_))
        ));
        // Reaching past the horizon is fine.
        assert_eq!(
            registry.add_tour(TourId(0), 1, 1, SlotWindow::new(0, 40), None).unwrap(),
            0
        );
    }

    #[test]
    fn test_week_windows_truncate_last_week() {
        let registry = Registry::new(10).unwrap();
        assert_eq!(registry.week_windows(), vec![0..28, 28..40]);

        let registry = Registry::new(14).unwrap();
        assert_eq!(registry.week_windows(), vec![0..28, 28..56]);
    }

    #[test]
    fn test_day_window() {
        let w = SlotWindow::days(2, 5);
        assert_eq!(w, SlotWindow::new(8, 19));
        assert!(w.contains(8) && w.contains(19) && !w.contains(20));
    }

    #[test]
    fn test_empty_horizon_rejected() {
        assert!(matches!(Registry::new(0), Err(ModelError::EmptyHorizon)));
    }
}
