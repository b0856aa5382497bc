//! Error taxonomy for model configuration and solving.

use thiserror::Error;

use crate::search::Stage;

/// Errors raised while configuring or solving a routing problem.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Malformed model data or search configuration. Raised before search starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A configuration call was made before its prerequisite stage.
    #[error("`{operation}` cannot be called in stage {stage:?}")]
    Sequence {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Stage the session was in when the call was made.
        stage: Stage,
    },

    /// A dimension with the same name is already registered.
    #[error("dimension `{0}` is already registered")]
    DuplicateDimension(String),

    /// No dimension with this name is registered.
    #[error("unknown dimension `{0}`")]
    UnknownDimension(String),

    /// The callback handle was not issued by this constraint graph.
    #[error("unknown transit callback handle {0}")]
    UnknownCallback(usize),

    /// A unary callback was supplied where an arc (binary) evaluator is required.
    #[error("transit callback {0} is unary and cannot evaluate arc costs")]
    CallbackArity(usize),

    /// The first-solution phase could not satisfy the hard constraints.
    #[error("no feasible solution found")]
    Infeasible,

    /// Reading a parameter file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing a TOML parameter file failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Rendering a solution as JSON failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RoutingError>;

impl RoutingError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns `true` for errors raised by a solve that found no feasible routes.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, Self::Infeasible)
    }
}
