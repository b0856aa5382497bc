//! Distance matrices.
//!
//! Provides a dense, validated distance matrix for routing problems.

mod matrix;

pub use matrix::DistanceMatrix;
