//! Crate flight planner.
//!
//! Plans the movement of unit crates between cities using a fleet of
//! capacity-limited planes. Given an origin-destination demand matrix and
//! each plane's starting city, produces a sequence of plane flights that
//! delivers every crate without exceeding plane capacity, while keeping
//! the total flight count close to a trivial lower bound.
//!
//! # Example
//!
//! ```no_run
//! use crate_flight_planner::instance::Instance;
//! use crate_flight_planner::plan::plan;
//!
//! let instance = Instance::from_file("instance.txt").unwrap();
//! let result = plan(&instance, 42);
//! println!("{} flights", result.flights.len());
//! ```

pub mod benchmark;
pub mod constraints;
pub mod demand;
pub mod edge_planner;
pub mod edges;
pub mod error;
pub mod instance;
pub mod plan;
pub mod plane_planner;

pub use error::PlanError;
pub use instance::Instance;
pub use plan::{plan as run_planner, Plan};
