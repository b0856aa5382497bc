//! Routing problem instance data.

use serde::{Deserialize, Serialize};

use crate::distance::DistanceMatrix;
use crate::error::{Result, RoutingError};

/// A pickup node that must be served before its delivery node, on the same vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PickupDelivery {
    /// Node where the goods are collected.
    pub pickup: usize,
    /// Node where the goods are dropped off.
    pub delivery: usize,
}

impl PickupDelivery {
    /// Creates a pickup-delivery pair.
    pub fn new(pickup: usize, delivery: usize) -> Self {
        Self { pickup, delivery }
    }
}

/// A node that may be left unperformed at the cost of `penalty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disjunction {
    /// Optional node.
    pub node: usize,
    /// Cost added to the objective when the node is not visited.
    pub penalty: i64,
}

/// The data of a vehicle routing problem.
///
/// Node 0..N-1 index the rows of the distance matrix. Every vehicle starts and
/// ends its route at the depot. The model is read-only once an
/// [`IndexManager`](super::IndexManager) has been built from it.
///
/// # Examples
///
/// ```
/// use u_vrp::distance::DistanceMatrix;
/// use u_vrp::models::RoutingModel;
///
/// let matrix = DistanceMatrix::from_rows(&[
///     vec![0.0, 4.0, 6.0],
///     vec![4.0, 0.0, 3.0],
///     vec![6.0, 3.0, 0.0],
/// ]).unwrap();
/// let mut model = RoutingModel::new(matrix, 2, 0).unwrap();
/// model.set_vehicle_capacities(vec![10, 10]);
/// model.add_pickup_delivery(1, 2);
/// assert!(model.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct RoutingModel {
    matrix: DistanceMatrix,
    num_vehicles: usize,
    depot: usize,
    vehicle_capacities: Option<Vec<i64>>,
    pickup_deliveries: Vec<PickupDelivery>,
    disjunctions: Vec<Disjunction>,
    coordinates: Option<Vec<(f64, f64)>>,
}

impl RoutingModel {
    /// Creates a model over `matrix` with `num_vehicles` vehicles based at `depot`.
    pub fn new(matrix: DistanceMatrix, num_vehicles: usize, depot: usize) -> Result<Self> {
        if num_vehicles == 0 {
            return Err(RoutingError::config("at least one vehicle is required"));
        }
        if depot >= matrix.size() {
            return Err(RoutingError::config(format!(
                "depot {depot} is outside the {}-node matrix",
                matrix.size()
            )));
        }
        Ok(Self {
            matrix,
            num_vehicles,
            depot,
            vehicle_capacities: None,
            pickup_deliveries: Vec::new(),
            disjunctions: Vec::new(),
            coordinates: None,
        })
    }

    /// Creates a model whose distances are the Euclidean distances between points.
    ///
    /// The coordinates are kept so that angle-based strategies can use them.
    pub fn from_coordinates(
        xs: &[f64],
        ys: &[f64],
        num_vehicles: usize,
        depot: usize,
    ) -> Result<Self> {
        let matrix = DistanceMatrix::from_coordinates(xs, ys)?;
        let mut model = Self::new(matrix, num_vehicles, depot)?;
        model.coordinates = Some(xs.iter().copied().zip(ys.iter().copied()).collect());
        Ok(model)
    }

    /// Sets per-vehicle capacities, aligned with vehicle indices.
    pub fn set_vehicle_capacities(&mut self, capacities: Vec<i64>) {
        self.vehicle_capacities = Some(capacities);
    }

    /// Adds a pickup-delivery pair.
    pub fn add_pickup_delivery(&mut self, pickup: usize, delivery: usize) {
        self.pickup_deliveries.push(PickupDelivery::new(pickup, delivery));
    }

    /// Replaces all pickup-delivery pairs.
    pub fn set_pickup_deliveries(&mut self, pairs: Vec<PickupDelivery>) {
        self.pickup_deliveries = pairs;
    }

    /// Makes `node` optional: it may be dropped at the cost of `penalty`.
    pub fn add_disjunction(&mut self, node: usize, penalty: i64) {
        self.disjunctions.push(Disjunction { node, penalty });
    }

    /// Distance matrix.
    pub fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }

    /// Number of nodes, depot included.
    pub fn num_nodes(&self) -> usize {
        self.matrix.size()
    }

    /// Number of vehicles.
    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    /// Depot node.
    pub fn depot(&self) -> usize {
        self.depot
    }

    /// Per-vehicle capacities, if set.
    pub fn vehicle_capacities(&self) -> Option<&[i64]> {
        self.vehicle_capacities.as_deref()
    }

    /// Pickup-delivery pairs.
    pub fn pickup_deliveries(&self) -> &[PickupDelivery] {
        &self.pickup_deliveries
    }

    /// Optional nodes and their drop penalties.
    pub fn disjunctions(&self) -> &[Disjunction] {
        &self.disjunctions
    }

    /// Node coordinates, when the model was built from points.
    pub fn coordinates(&self) -> Option<&[(f64, f64)]> {
        self.coordinates.as_deref()
    }

    /// Checks the model invariants.
    ///
    /// Capacities must match the vehicle count and be non-negative. Pairs must
    /// reference distinct, in-range, non-depot nodes and no node may belong to
    /// more than one pair. Disjunctions may not target the depot or pair nodes.
    pub fn validate(&self) -> Result<()> {
        let n = self.num_nodes();
        if let Some(caps) = &self.vehicle_capacities {
            if caps.len() != self.num_vehicles {
                return Err(RoutingError::config(format!(
                    "{} vehicle capacities given for {} vehicles",
                    caps.len(),
                    self.num_vehicles
                )));
            }
            if let Some(v) = caps.iter().position(|&c| c < 0) {
                return Err(RoutingError::config(format!(
                    "vehicle {v} has a negative capacity"
                )));
            }
        }

        let mut paired = vec![false; n];
        for pair in &self.pickup_deliveries {
            for node in [pair.pickup, pair.delivery] {
                if node >= n {
                    return Err(RoutingError::config(format!(
                        "pickup-delivery node {node} is outside the {n}-node matrix"
                    )));
                }
                if node == self.depot {
                    return Err(RoutingError::config(format!(
                        "pickup-delivery pair ({}, {}) references the depot",
                        pair.pickup, pair.delivery
                    )));
                }
            }
            if pair.pickup == pair.delivery {
                return Err(RoutingError::config(format!(
                    "pickup and delivery are the same node {}",
                    pair.pickup
                )));
            }
            for node in [pair.pickup, pair.delivery] {
                if paired[node] {
                    return Err(RoutingError::config(format!(
                        "node {node} belongs to more than one pickup-delivery pair"
                    )));
                }
                paired[node] = true;
            }
        }

        let mut optional = vec![false; n];
        for d in &self.disjunctions {
            if d.node >= n || d.node == self.depot {
                return Err(RoutingError::config(format!(
                    "disjunction node {} is the depot or out of range",
                    d.node
                )));
            }
            if paired[d.node] {
                return Err(RoutingError::config(format!(
                    "disjunctions on pickup-delivery node {} are not supported",
                    d.node
                )));
            }
            if d.penalty < 0 {
                return Err(RoutingError::config(format!(
                    "disjunction on node {} has a negative penalty",
                    d.node
                )));
            }
            if optional[d.node] {
                return Err(RoutingError::config(format!(
                    "node {} has more than one disjunction",
                    d.node
                )));
            }
            optional[d.node] = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(n: usize, vehicles: usize) -> RoutingModel {
        RoutingModel::new(DistanceMatrix::new(n), vehicles, 0).expect("valid")
    }

    #[test]
    fn test_new_rejects_bad_depot_and_fleet() {
        assert!(RoutingModel::new(DistanceMatrix::new(3), 0, 0).is_err());
        assert!(RoutingModel::new(DistanceMatrix::new(3), 1, 3).is_err());
    }

    #[test]
    fn test_from_coordinates_keeps_points() {
        let m = RoutingModel::from_coordinates(&[0.0, 3.0], &[0.0, 4.0], 1, 0).expect("valid");
        assert_eq!(m.coordinates(), Some(&[(0.0, 0.0), (3.0, 4.0)][..]));
        assert!((m.matrix().get(0, 1) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_capacity_length_mismatch() {
        let mut m = model(4, 2);
        m.set_vehicle_capacities(vec![10]);
        assert!(matches!(m.validate(), Err(RoutingError::Configuration(_))));
        m.set_vehicle_capacities(vec![10, -1]);
        assert!(m.validate().is_err());
        m.set_vehicle_capacities(vec![10, 10]);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_pair_validation() {
        let mut m = model(4, 1);
        m.add_pickup_delivery(1, 9);
        assert!(m.validate().is_err());

        let mut m = model(4, 1);
        m.add_pickup_delivery(0, 2);
        assert!(m.validate().is_err());

        let mut m = model(4, 1);
        m.add_pickup_delivery(2, 2);
        assert!(m.validate().is_err());

        let mut m = model(4, 1);
        m.add_pickup_delivery(1, 2);
        m.add_pickup_delivery(2, 3);
        assert!(m.validate().is_err());

        let mut m = model(4, 1);
        m.set_pickup_deliveries(vec![PickupDelivery::new(1, 2)]);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_disjunction_validation() {
        let mut m = model(4, 1);
        m.add_disjunction(0, 10);
        assert!(m.validate().is_err());

        let mut m = model(4, 1);
        m.add_pickup_delivery(1, 2);
        m.add_disjunction(2, 10);
        assert!(m.validate().is_err());

        let mut m = model(4, 1);
        m.add_disjunction(3, -5);
        assert!(m.validate().is_err());

        let mut m = model(4, 1);
        m.add_disjunction(3, 5);
        assert!(m.validate().is_ok());
        assert_eq!(m.disjunctions()[0].penalty, 5);
    }
}
