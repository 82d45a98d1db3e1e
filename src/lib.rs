//! Tour Roster Library
//!
//! Assigns a roster of guides to tours over a multi-day horizon by building a
//! mixed-integer model and handing it to an external solver.
//!
//! # Features
//!
//! - Entity registry with weekly availability tiling and pre-commitments
//! - Dense boolean variable space over (guide, tour, slot) and (tour, slot)
//! - Nine independent, individually switchable constraint families
//! - Weighted preference objective (guide rating x tour priority)
//! - Pure-Rust MILP backend, optional Gurobi backend (`gurobi` feature)
//! - Deterministic result extraction and independent rule checking
//! - Scenario files, seeded scenario generation and benchmarking
//!
//! # Example
//!
//! ```no_run
//! use tour_roster::model::{ScheduleModel, SchedulerConfig};
//! use tour_roster::registry::{GuideId, Registry, SlotWindow, TourId, WEEK_SLOTS};
//! use tour_roster::solver::MilpSolver;
//!
//! let mut registry = Registry::new(10).unwrap();
//! registry.add_tour(TourId(0), 2, 5, SlotWindow::new(0, 39), None).unwrap();
//! registry.add_guide(GuideId(0), 5, &[true; WEEK_SLOTS], None).unwrap();
//! registry.add_guide(GuideId(1), 5, &[true; WEEK_SLOTS], None).unwrap();
//!
//! let config = SchedulerConfig { weekly_workload: 7, max_slot_load: 1, ..Default::default() };
//! let model = ScheduleModel::build(&registry, &config);
//! let schedule = model.solve(&MilpSolver::default()).unwrap();
//!
//! println!("{}", schedule);
//! println!("{:?}", schedule.guide_assignments);
//! ```

pub mod benchmark;
pub mod error;
pub mod model;
pub mod registry;
pub mod scenario;
pub mod schedule;
pub mod solver;

pub use error::ModelError;
pub use model::{ScheduleModel, SchedulerConfig};
pub use registry::Registry;
pub use schedule::Schedule;
