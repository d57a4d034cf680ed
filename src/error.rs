//! Error types for the instance-loading boundary.
//!
//! Internal planner inconsistencies (cycle attempts, capacity overflow,
//! unterminated visits) are programmer errors and are raised with
//! `assert!`/`debug_assert!`, not this type. This enum only covers
//! malformed input, rejected before planning starts.

use std::fmt;

#[derive(Debug)]
pub enum PlanError {
    Io(std::io::Error),
    Parse(String),
    NegativeDemand { from: usize, to: usize, amount: i64 },
    NonZeroDiagonal { city: usize },
    PlaneOutOfRange { plane: usize, city: usize, n_cities: usize },
    NonPositiveCapacity(i64),
    NoPlanesWithDemand,
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::Io(e) => write!(f, "cannot read instance: {}", e),
            PlanError::Parse(msg) => write!(f, "malformed instance: {}", msg),
            PlanError::NegativeDemand { from, to, amount } => write!(
                f,
                "negative crate count {} for ({} -> {})",
                amount, from, to
            ),
            PlanError::NonZeroDiagonal { city } => {
                write!(f, "non-zero demand on the diagonal at city {}", city)
            }
            PlanError::PlaneOutOfRange { plane, city, n_cities } => write!(
                f,
                "plane {} starts at city {}, outside [0, {})",
                plane, city, n_cities
            ),
            PlanError::NonPositiveCapacity(cap) => {
                write!(f, "capacity must be positive, got {}", cap)
            }
            PlanError::NoPlanesWithDemand => write!(
                f,
                "instance has demand but no planes to carry it"
            ),
        }
    }
}

impl std::error::Error for PlanError {}

impl From<std::io::Error> for PlanError {
    fn from(e: std::io::Error) -> Self {
        PlanError::Io(e)
    }
}
