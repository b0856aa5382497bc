//! Transit callbacks, cumulative dimensions and pairing constraints.
//!
//! - [`TransitCallback`] / [`UnaryTransitCallback`] — lazily evaluated arc and node functions
//! - [`Dimension`] — cumulative quantity with slack, capacity and span costs
//! - [`ConstraintGraph`] — registry tying callbacks, dimensions and pairs together

mod callback;
mod dimension;
mod graph;

pub use callback::{
    CallbackHandle, DemandTransit, MatrixTransit, TransitCallback, UnaryTransitCallback,
};
pub use dimension::{Capacity, Dimension};
pub use graph::{ConstraintGraph, PairingConstraint};
