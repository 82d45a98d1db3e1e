//! Error type shared by the registry, the model builder and the solver backends.
//!
//! Solve-time outcomes (infeasible, timed out) are not errors: they are
//! reported through [`crate::solver::SolveStatus`].

use crate::registry::{GuideId, TourId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("horizon must span at least one day")]
    EmptyHorizon,

    #[error("tour {0} is already registered")]
    DuplicateTour(TourId),

    #[error("guide {0} is already registered")]
    DuplicateGuide(GuideId),

    #[error("tour {0} must require at least one guide")]
    ZeroGuideCount(TourId),

    #[error("tour {tour} priority {priority} is outside [-{max}, {max}]")]
    PriorityOutOfRange { tour: TourId, priority: i64, max: i64 },

    #[error("guide {guide} rating {rating} is outside [-{max}, {max}]")]
    RatingOutOfRange { guide: GuideId, rating: i64, max: i64 },

    #[error("tour {tour} has an inverted slot window [{low}, {high}]")]
    InvertedWindow { tour: TourId, low: usize, high: usize },

    #[error("tour {tour} window starts at slot {low}, past the horizon of {slot_count} slots")]
    WindowOutsideHorizon {
        tour: TourId,
        low: usize,
        slot_count: usize,
    },

    #[error("tour {tour} is fixed at slot {slot}, outside its window [{low}, {high}]")]
    FixedSlotOutsideWindow {
        tour: TourId,
        slot: usize,
        low: usize,
        high: usize,
    },

    #[error("tour {tour} is fixed at slot {slot}, past the horizon of {slot_count} slots")]
    FixedSlotOutsideHorizon {
        tour: TourId,
        slot: usize,
        slot_count: usize,
    },

    #[error("guide {guide} weekly availability has {found} entries, expected {expected}")]
    AvailabilityLength {
        guide: GuideId,
        expected: usize,
        found: usize,
    },

    #[error("guide {guide} references unregistered tour {tour}")]
    UnknownTour { guide: GuideId, tour: TourId },

    #[error("solver backend `{0}` is not compiled into this build")]
    BackendUnavailable(&'static str),

    #[error("solver backend failure: {0}")]
    Backend(String),

    #[error("scenario I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scenario format error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),
}
