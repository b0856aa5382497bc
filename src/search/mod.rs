//! Search configuration and the two-phase solve.
//!
//! - [`SearchParameters`]: strategy, metaheuristic and budget, loadable from TOML
//! - [`Termination`]: deadline, step limits and cancellation
//! - [`SearchSession`]: an immutable configured problem that can be solved
//! - [`RoutingBuilder`]: staged façade producing a session

mod builder;
mod parameters;
mod session;
mod termination;

pub use builder::{RoutingBuilder, Stage};
pub use parameters::SearchParameters;
pub use session::SearchSession;
pub use termination::{Termination, DEFAULT_UNIMPROVED_STEP_LIMIT};
