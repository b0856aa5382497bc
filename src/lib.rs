//! # u-vrp
//!
//! Vehicle routing engine: an index space over vehicles and nodes, cumulative
//! dimensions with capacities and span costs, pickup-delivery coupling, and a
//! two-phase search (constructive first solution, then metaheuristic local
//! search) bounded by a time limit.
//!
//! ## Modules
//!
//! - [`models`] — Problem instance, index manager, routes and solutions
//! - [`distance`] — Distance matrix
//! - [`constraints`] — Transit callbacks, dimensions and the constraint graph
//! - [`evaluation`] — Cumul propagation, feasibility and the objective
//! - [`constructive`] — First-solution strategies
//! - [`local_search`] — Neighbourhood moves and incremental search state
//! - [`metaheuristic`] — Greedy descent, guided local search, annealing, tabu search
//! - [`search`] — Parameters, termination, solve session and the staged builder
//! - [`report`] — Text and JSON rendering of solutions
//!
//! ## Example
//!
//! ```
//! use u_vrp::search::RoutingBuilder;
//!
//! let xs = [0.0, 10.0, 20.0, 0.0, 0.0];
//! let ys = [0.0, 0.0, 0.0, 10.0, 20.0];
//! let mut b = RoutingBuilder::new();
//! b.init_model_from_coordinates(&xs, &ys, 2, 0)?;
//! b.create_index_manager()?;
//! let distance = b.register_transit_callback()?;
//! b.set_arc_cost_evaluator_of_all_vehicles(distance)?;
//! b.add_dimension(distance, 0, 3000, true, "Distance")?;
//! b.set_global_span_cost_coefficient("Distance", 100)?;
//! b.create_default_search_parameters()?;
//! b.set_local_search_metaheuristic("GUIDED_LOCAL_SEARCH")?;
//!
//! let solution = b.solve()?;
//! assert_eq!(solution.num_served(), 4);
//! // Balanced: each vehicle takes one axis.
//! assert_eq!(solution.num_used_vehicles(), 2);
//! # Ok::<(), u_vrp::RoutingError>(())
//! ```

pub mod constraints;
pub mod constructive;
pub mod distance;
pub mod error;
pub mod evaluation;
pub mod local_search;
pub mod metaheuristic;
pub mod models;
pub mod report;
pub mod search;

pub use error::{Result, RoutingError};
