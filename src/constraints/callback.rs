//! Transit callbacks evaluated lazily over route indices.

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, RoutingError};
use crate::models::{IndexManager, RoutingModel};

/// Cost or quantity of travelling from one route index to another.
///
/// Implemented for any `Fn(usize, usize) -> i64` closure.
pub trait TransitCallback: Send + Sync {
    /// Transit value of the arc `from -> to`.
    fn transit(&self, from: usize, to: usize) -> i64;
}

impl<F> TransitCallback for F
where
    F: Fn(usize, usize) -> i64 + Send + Sync,
{
    fn transit(&self, from: usize, to: usize) -> i64 {
        self(from, to)
    }
}

/// Quantity picked up when leaving a route index, independent of the destination.
///
/// Implemented for any `Fn(usize) -> i64` closure.
pub trait UnaryTransitCallback: Send + Sync {
    /// Transit value when departing `from`.
    fn transit(&self, from: usize) -> i64;
}

impl<F> UnaryTransitCallback for F
where
    F: Fn(usize) -> i64 + Send + Sync,
{
    fn transit(&self, from: usize) -> i64 {
        self(from)
    }
}

/// Opaque handle to a registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackHandle(pub(crate) usize);

impl CallbackHandle {
    /// Registration number of the callback.
    pub fn value(self) -> usize {
        self.0
    }
}

/// Arc cost read from the model's distance matrix.
///
/// Distances are truncated to whole units.
#[derive(Debug, Clone)]
pub struct MatrixTransit {
    model: Arc<RoutingModel>,
    manager: Arc<IndexManager>,
}

impl MatrixTransit {
    /// Creates a callback over the model's distance matrix.
    pub fn new(model: Arc<RoutingModel>, manager: Arc<IndexManager>) -> Self {
        Self { model, manager }
    }
}

impl TransitCallback for MatrixTransit {
    fn transit(&self, from: usize, to: usize) -> i64 {
        let from_node = self.manager.index_to_node(from);
        let to_node = self.manager.index_to_node(to);
        self.model.matrix().get(from_node, to_node) as i64
    }
}

/// Per-node demand, charged when leaving a node.
#[derive(Debug, Clone)]
pub struct DemandTransit {
    demands: Vec<i64>,
    manager: Arc<IndexManager>,
}

impl DemandTransit {
    /// Creates a demand callback. `demands` is indexed by node.
    pub fn new(demands: Vec<i64>, manager: Arc<IndexManager>) -> Result<Self> {
        if demands.len() != manager.num_nodes() {
            return Err(RoutingError::config(format!(
                "{} demands given for {} nodes",
                demands.len(),
                manager.num_nodes()
            )));
        }
        Ok(Self { demands, manager })
    }
}

impl UnaryTransitCallback for DemandTransit {
    fn transit(&self, from: usize) -> i64 {
        self.demands[self.manager.index_to_node(from)]
    }
}

/// A registered callback of either arity.
#[derive(Clone)]
pub(crate) enum Transit {
    Binary(Arc<dyn TransitCallback>),
    Unary(Arc<dyn UnaryTransitCallback>),
}

impl Transit {
    pub(crate) fn evaluate(&self, from: usize, to: usize) -> i64 {
        match self {
            Self::Binary(cb) => cb.transit(from, to),
            Self::Unary(cb) => cb.transit(from),
        }
    }

    pub(crate) fn is_unary(&self) -> bool {
        matches!(self, Self::Unary(_))
    }
}

impl fmt::Debug for Transit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(_) => f.write_str("Transit::Binary"),
            Self::Unary(_) => f.write_str("Transit::Unary"),
        }
    }
}
