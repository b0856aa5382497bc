//! Domain model types for vehicle routing problems.
//!
//! Provides the problem instance, the index manager translating between
//! physical nodes and route indices, routes as ordered sequences of visits,
//! and the solution returned by a solve.

mod index_manager;
mod model;
mod route;
mod solution;

pub use index_manager::IndexManager;
pub use model::{Disjunction, PickupDelivery, RoutingModel};
pub use route::{Route, Visit};
pub use solution::{SearchStatistics, Solution, Violation, ViolationType};
