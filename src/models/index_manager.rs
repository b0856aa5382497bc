//! Bijection between route indices and physical nodes.

use super::RoutingModel;
use crate::error::Result;

/// Maps the flattened route-index space used by the search to physical nodes.
///
/// Every node keeps its own number as index, the depot doubling as the start of
/// vehicle 0. The starts of vehicles 1..V follow, then the ends of all
/// vehicles, so there are `N + 2V - 1` indices in total. Start and end indices
/// all map back to the depot.
///
/// # Examples
///
/// ```
/// use u_vrp::distance::DistanceMatrix;
/// use u_vrp::models::{IndexManager, RoutingModel};
///
/// let model = RoutingModel::new(DistanceMatrix::new(4), 2, 0).unwrap();
/// let manager = IndexManager::new(&model).unwrap();
/// assert_eq!(manager.num_indices(), 7);
/// assert_eq!(manager.vehicle_start(0), 0);
/// assert_eq!(manager.vehicle_start(1), 4);
/// assert_eq!(manager.vehicle_end(1), 6);
/// assert_eq!(manager.index_to_node(6), 0);
/// assert_eq!(manager.node_to_index(3), 3);
/// ```
#[derive(Debug, Clone)]
pub struct IndexManager {
    num_nodes: usize,
    num_vehicles: usize,
    depot: usize,
    index_to_node: Vec<usize>,
    starts: Vec<usize>,
    ends: Vec<usize>,
    /// Vehicle owning each start or end index.
    sentinel_vehicle: Vec<Option<usize>>,
}

impl IndexManager {
    /// Builds the index space for `model` after validating it.
    pub fn new(model: &RoutingModel) -> Result<Self> {
        model.validate()?;

        let num_nodes = model.num_nodes();
        let num_vehicles = model.num_vehicles();
        let depot = model.depot();
        let num_indices = num_nodes + 2 * num_vehicles - 1;

        let mut index_to_node: Vec<usize> = (0..num_nodes).collect();
        index_to_node.resize(num_indices, depot);

        let mut starts = Vec::with_capacity(num_vehicles);
        starts.push(depot);
        starts.extend(num_nodes..num_nodes + num_vehicles - 1);
        let ends: Vec<usize> = (num_nodes + num_vehicles - 1..num_indices).collect();

        let mut sentinel_vehicle = vec![None; num_indices];
        for (v, (&s, &e)) in starts.iter().zip(&ends).enumerate() {
            sentinel_vehicle[s] = Some(v);
            sentinel_vehicle[e] = Some(v);
        }

        Ok(Self {
            num_nodes,
            num_vehicles,
            depot,
            index_to_node,
            starts,
            ends,
            sentinel_vehicle,
        })
    }

    /// Number of physical nodes.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of vehicles.
    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    /// Size of the route-index space.
    pub fn num_indices(&self) -> usize {
        self.index_to_node.len()
    }

    /// Physical node behind a route index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= num_indices()`.
    pub fn index_to_node(&self, index: usize) -> usize {
        self.index_to_node[index]
    }

    /// Route index of a node. The depot resolves to the start of vehicle 0.
    ///
    /// # Panics
    ///
    /// Panics if `node >= num_nodes()`.
    pub fn node_to_index(&self, node: usize) -> usize {
        assert!(node < self.num_nodes, "node {node} out of range");
        node
    }

    /// Route index of a node as seen by `vehicle`: the depot resolves to that
    /// vehicle's start index.
    pub fn node_to_index_for_vehicle(&self, node: usize, vehicle: usize) -> usize {
        if node == self.depot {
            self.starts[vehicle]
        } else {
            self.node_to_index(node)
        }
    }

    /// Start index of `vehicle`.
    pub fn vehicle_start(&self, vehicle: usize) -> usize {
        self.starts[vehicle]
    }

    /// End index of `vehicle`.
    pub fn vehicle_end(&self, vehicle: usize) -> usize {
        self.ends[vehicle]
    }

    /// Returns `true` if `index` is some vehicle's start.
    pub fn is_start(&self, index: usize) -> bool {
        self.sentinel_vehicle[index].is_some_and(|v| self.starts[v] == index)
    }

    /// Returns `true` if `index` is some vehicle's end.
    pub fn is_end(&self, index: usize) -> bool {
        self.sentinel_vehicle[index].is_some_and(|v| self.ends[v] == index)
    }

    /// Vehicle owning a start or end index.
    pub fn sentinel_vehicle(&self, index: usize) -> Option<usize> {
        self.sentinel_vehicle.get(index).copied().flatten()
    }

    /// Full index path of a route: start sentinel, visited nodes, end sentinel.
    pub fn route_indices(&self, vehicle: usize, nodes: &[usize]) -> Vec<usize> {
        let mut path = Vec::with_capacity(nodes.len() + 2);
        path.push(self.starts[vehicle]);
        path.extend(nodes.iter().map(|&n| self.node_to_index(n)));
        path.push(self.ends[vehicle]);
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMatrix;
    use crate::error::RoutingError;

    fn manager(n: usize, vehicles: usize, depot: usize) -> IndexManager {
        let model = RoutingModel::new(DistanceMatrix::new(n), vehicles, depot).expect("valid");
        IndexManager::new(&model).expect("valid")
    }

    #[test]
    fn test_layout_single_vehicle() {
        let m = manager(5, 1, 0);
        assert_eq!(m.num_indices(), 6);
        assert_eq!(m.vehicle_start(0), 0);
        assert_eq!(m.vehicle_end(0), 5);
        assert!(m.is_start(0));
        assert!(m.is_end(5));
        assert!(!m.is_start(5));
        assert_eq!(m.index_to_node(5), 0);
    }

    #[test]
    fn test_bijection_for_customer_nodes() {
        let m = manager(6, 3, 0);
        for node in 1..6 {
            let index = m.node_to_index(node);
            assert_eq!(m.index_to_node(index), node);
            assert_eq!(m.sentinel_vehicle(index), None);
        }
        for v in 0..3 {
            assert_eq!(m.index_to_node(m.vehicle_start(v)), 0);
            assert_eq!(m.index_to_node(m.vehicle_end(v)), 0);
            assert_eq!(m.sentinel_vehicle(m.vehicle_start(v)), Some(v));
            assert_eq!(m.node_to_index_for_vehicle(0, v), m.vehicle_start(v));
        }
    }

    #[test]
    fn test_depot_not_zero() {
        let m = manager(4, 2, 2);
        assert_eq!(m.vehicle_start(0), 2);
        assert_eq!(m.vehicle_start(1), 4);
        assert_eq!(m.vehicle_end(0), 5);
        assert_eq!(m.index_to_node(4), 2);
        assert_eq!(m.node_to_index(3), 3);
    }

    #[test]
    fn test_route_indices() {
        let m = manager(4, 2, 0);
        assert_eq!(m.route_indices(1, &[3, 1]), vec![4, 3, 1, 6]);
        assert_eq!(m.route_indices(0, &[]), vec![0, 5]);
    }

    #[test]
    fn test_new_validates_model() {
        let mut model = RoutingModel::new(DistanceMatrix::new(3), 2, 0).expect("valid");
        model.set_vehicle_capacities(vec![1, 2, 3]);
        assert!(matches!(
            IndexManager::new(&model),
            Err(RoutingError::Configuration(_))
        ));
    }
}
