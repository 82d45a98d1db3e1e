//! Scenario files and synthetic scenario generation.
//!
//! A scenario bundles the horizon, the caps, and every tour and guide, and
//! can be stored as JSON. The generator draws group sizes and weights from
//! fixed tables skewed towards mid-range values.

use crate::error::ModelError;
use crate::model::SchedulerConfig;
use crate::registry::{GuideId, Registry, SlotWindow, TourId, SLOTS_PER_DAY, WEEK_SLOTS};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourSpec {
    pub id: TourId,
    pub guide_count: u32,
    pub priority: i64,
    pub window: SlotWindow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_slot: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideSpec {
    pub id: GuideId,
    pub rating: i64,
    /// 28 entries, one per slot of the canonical week
    pub weekly_availability: Vec<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixed_tours: Vec<TourId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub day_count: usize,
    pub weekly_workload: u32,
    pub max_slot_load: u32,
    pub tours: Vec<TourSpec>,
    pub guides: Vec<GuideSpec>,
}

impl Scenario {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Register every tour, then every guide, so fixed references resolve.
    pub fn registry(&self) -> Result<Registry, ModelError> {
        let mut registry = Registry::new(self.day_count)?;
        for tour in &self.tours {
            registry.add_tour(
                tour.id,
                tour.guide_count,
                tour.priority,
                tour.window,
                tour.fixed_slot,
            )?;
        }
        for guide in &self.guides {
            let fixed = (!guide.fixed_tours.is_empty()).then_some(guide.fixed_tours.as_slice());
            registry.add_guide(guide.id, guide.rating, &guide.weekly_availability, fixed)?;
        }
        Ok(registry)
    }

    /// Model configuration carrying this scenario's caps.
    pub fn config(&self) -> SchedulerConfig {
        SchedulerConfig {
            weekly_workload: self.weekly_workload,
            max_slot_load: self.max_slot_load,
            ..Default::default()
        }
    }
}

/// Seeded random scenario generator
#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    pub seed: u64,
    pub day_count: usize,
    pub tour_count: usize,
    pub guide_count: usize,
    pub weekly_workload: u32,
    pub max_slot_load: u32,
    /// Tour windows span between these many days
    pub min_window_days: usize,
    pub max_window_days: usize,
    /// Minimum available slots in a weekly pattern
    pub min_available: usize,
}

impl Default for ScenarioGenerator {
    fn default() -> Self {
        ScenarioGenerator {
            seed: 42,
            day_count: 14,
            tour_count: 10,
            guide_count: 6,
            weekly_workload: 2,
            max_slot_load: 2,
            min_window_days: 10,
            max_window_days: 20,
            min_available: 10,
        }
    }
}

// Weighted towards 5, symmetric down to 1 and up to 10.
const WEIGHT_VALUES: [i64; 10] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
const WEIGHT_ODDS: [u32; 10] = [2, 4, 8, 16, 64, 16, 8, 4, 2, 1];
const GROUP_SIZES: [u32; 3] = [1, 2, 3];
const GROUP_ODDS: [u32; 3] = [6, 3, 1];

impl ScenarioGenerator {
    pub fn new(seed: u64) -> Self {
        ScenarioGenerator {
            seed,
            ..Default::default()
        }
    }

    pub fn generate(&self) -> Result<Scenario, ModelError> {
        if self.day_count == 0 {
            return Err(ModelError::EmptyHorizon);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        // Constant non-empty weight tables never fail to build.
        let weights = WeightedIndex::new(WEIGHT_ODDS).expect("valid weight table");
        let groups = WeightedIndex::new(GROUP_ODDS).expect("valid group table");

        let tours = (0..self.tour_count)
            .map(|i| TourSpec {
                id: TourId(i as u32),
                guide_count: GROUP_SIZES[groups.sample(&mut rng)],
                priority: WEIGHT_VALUES[weights.sample(&mut rng)],
                window: self.random_window(&mut rng),
                fixed_slot: None,
            })
            .collect();

        let guides = (0..self.guide_count)
            .map(|i| GuideSpec {
                id: GuideId(i as u32),
                rating: WEIGHT_VALUES[weights.sample(&mut rng)],
                weekly_availability: self.random_availability(&mut rng),
                fixed_tours: Vec::new(),
            })
            .collect();

        Ok(Scenario {
            name: format!("generated-{}", self.seed),
            day_count: self.day_count,
            weekly_workload: self.weekly_workload,
            max_slot_load: self.max_slot_load,
            tours,
            guides,
        })
    }

    fn random_window(&self, rng: &mut ChaCha8Rng) -> SlotWindow {
        let max_width = self.max_window_days.min(self.day_count).max(1);
        let min_width = self.min_window_days.clamp(1, max_width);
        let width = rng.gen_range(min_width..=max_width);
        let start_day = rng.gen_range(0..=self.day_count - width);
        SlotWindow::days(start_day, start_day + width)
    }

    fn random_availability(&self, rng: &mut ChaCha8Rng) -> Vec<bool> {
        let min_available = self.min_available.min(WEEK_SLOTS);
        loop {
            let pattern: Vec<bool> = (0..WEEK_SLOTS).map(|_| rng.gen_bool(0.5)).collect();
            if pattern.iter().filter(|&&a| a).count() >= min_available {
                return pattern;
            }
        }
    }
}

/// Day and quarter-day period of a slot.
pub fn slot_label(slot: usize) -> String {
    format!("day {} / period {}", slot / SLOTS_PER_DAY, slot % SLOTS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_is_deterministic() {
        let a = ScenarioGenerator::new(7).generate().unwrap();
        let b = ScenarioGenerator::new(7).generate().unwrap();
        let c = ScenarioGenerator::new(8).generate().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_generated_scenario_registers() {
        let generator = ScenarioGenerator {
            day_count: 21,
            tour_count: 30,
            guide_count: 12,
            ..ScenarioGenerator::new(3)
        };
        let scenario = generator.generate().unwrap();
        let registry = scenario.registry().unwrap();
        assert_eq!(registry.tours().len(), 30);
        assert_eq!(registry.guides().len(), 12);

        for tour in registry.tours() {
            assert!((1..=3).contains(&tour.guide_count));
            assert!((1..=10).contains(&tour.priority));
            assert!(tour.window.high < registry.slot_count());
            let days = (tour.window.high + 1 - tour.window.low) / SLOTS_PER_DAY;
            assert!((10..=20).contains(&days));
        }
        for guide in &scenario.guides {
            assert!(guide.weekly_availability.iter().filter(|&&a| a).count() >= 10);
        }
    }

    #[test]
    fn test_short_horizon_clamps_windows() {
        let generator = ScenarioGenerator {
            day_count: 3,
            ..ScenarioGenerator::new(1)
        };
        let registry = generator.generate().unwrap().registry().unwrap();
        assert!(registry.tours().iter().all(|t| t.window == SlotWindow::new(0, 11)));
    }

    #[test]
    fn test_empty_horizon_rejected_before_drawing() {
        let generator = ScenarioGenerator {
            day_count: 0,
            ..ScenarioGenerator::new(1)
        };
        assert!(matches!(generator.generate(), Err(ModelError::EmptyHorizon)));

        let generator = ScenarioGenerator {
            day_count: 1,
            ..ScenarioGenerator::new(1)
        };
        let registry = generator.generate().unwrap().registry().unwrap();
        assert!(registry.tours().iter().all(|t| t.window == SlotWindow::new(0, 3)));
    }

    #[test]
    fn test_json_round_trip_preserves_fixed_entries() {
        let scenario = Scenario {
            name: "pinned".into(),
            day_count: 7,
            weekly_workload: 3,
            max_slot_load: 1,
            tours: vec![TourSpec {
                id: TourId(4),
                guide_count: 1,
                priority: 2,
                window: SlotWindow::new(0, 20),
                fixed_slot: Some(6),
            }],
            guides: vec![GuideSpec {
                id: GuideId(1),
                rating: 5,
                weekly_availability: vec![false; WEEK_SLOTS],
                fixed_tours: vec![TourId(4)],
            }],
        };
        let json = serde_json::to_string(&scenario).unwrap();
        let back: Scenario = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scenario);

        let registry = back.registry().unwrap();
        assert!(registry.guide(0).is_available(6));
        assert_eq!(back.config().max_slot_load, 1);
    }

    #[test]
    fn test_bad_scenario_fails_at_registration() {
        let json = r#"{
            "day_count": 7, "weekly_workload": 3, "max_slot_load": 1,
            "tours": [],
            "guides": [{"id": 0, "rating": 1, "weekly_availability": [true, false],
                        "fixed_tours": []}]
        }"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert!(matches!(
            scenario.registry(),
            Err(ModelError::AvailabilityLength { found: 2, .. })
        ));
    }

    #[test]
    fn test_slot_label() {
        assert_eq!(slot_label(9), "day 2 / period 1");
    }
}
