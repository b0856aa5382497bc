//! Route feasibility checking and objective evaluation.

mod assignment;
mod evaluator;

pub use assignment::{Assignment, Request};
pub use evaluator::{RouteEvaluator, RouteMetrics};
