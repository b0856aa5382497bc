//! Cumulative quantities tracked along routes.

use rustc_hash::FxHashMap;

use super::CallbackHandle;

/// Upper bound on a dimension's cumulative value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capacity {
    /// Same bound for every vehicle.
    Uniform(i64),
    /// One bound per vehicle, aligned with vehicle indices.
    PerVehicle(Vec<i64>),
}

impl Capacity {
    /// Bound applying to `vehicle`.
    pub fn for_vehicle(&self, vehicle: usize) -> i64 {
        match self {
            Self::Uniform(cap) => *cap,
            Self::PerVehicle(caps) => caps[vehicle],
        }
    }
}

/// A named cumulative quantity such as distance or load.
///
/// Along every route, for each arc `i -> j`:
/// `cumul(i) + transit(i, j) <= cumul(j) <= cumul(i) + transit(i, j) + slack_max`,
/// and `0 <= cumul <= capacity` at every index.
#[derive(Debug, Clone)]
pub struct Dimension {
    name: String,
    callback: CallbackHandle,
    slack_max: i64,
    capacity: Capacity,
    fix_start_cumul_to_zero: bool,
    global_span_cost_coefficient: i64,
    span_cost_coefficient: i64,
    cumul_ranges: FxHashMap<usize, (i64, i64)>,
}

impl Dimension {
    pub(crate) fn new(
        name: String,
        callback: CallbackHandle,
        slack_max: i64,
        capacity: Capacity,
        fix_start_cumul_to_zero: bool,
    ) -> Self {
        Self {
            name,
            callback,
            slack_max,
            capacity,
            fix_start_cumul_to_zero,
            global_span_cost_coefficient: 0,
            span_cost_coefficient: 0,
            cumul_ranges: FxHashMap::default(),
        }
    }

    /// Dimension name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transit callback driving this dimension.
    pub fn callback(&self) -> CallbackHandle {
        self.callback
    }

    /// Maximum slack absorbed per arc.
    pub fn slack_max(&self) -> i64 {
        self.slack_max
    }

    /// Capacity specification.
    pub fn capacity(&self) -> &Capacity {
        &self.capacity
    }

    /// Whether the cumul is forced to zero at every vehicle start.
    pub fn fix_start_cumul_to_zero(&self) -> bool {
        self.fix_start_cumul_to_zero
    }

    /// Coefficient applied to `max(end cumul) - min(end cumul)` across vehicles.
    pub fn global_span_cost_coefficient(&self) -> i64 {
        self.global_span_cost_coefficient
    }

    pub(crate) fn set_global_span_cost_coefficient(&mut self, coefficient: i64) {
        self.global_span_cost_coefficient = coefficient;
    }

    /// Coefficient applied to each route's `end cumul - start cumul`.
    pub fn span_cost_coefficient(&self) -> i64 {
        self.span_cost_coefficient
    }

    pub(crate) fn set_span_cost_coefficient(&mut self, coefficient: i64) {
        self.span_cost_coefficient = coefficient;
    }

    /// Restricts the cumul at route index `index` to `[min, max]`.
    pub(crate) fn set_cumul_range(&mut self, index: usize, min: i64, max: i64) {
        self.cumul_ranges.insert(index, (min, max));
    }

    /// Admissible cumul interval at `index` for `vehicle`, capacity and start rule included.
    pub fn cumul_bounds(&self, vehicle: usize, index: usize, is_start: bool) -> (i64, i64) {
        let cap = self.capacity.for_vehicle(vehicle);
        let (lo, hi) = self
            .cumul_ranges
            .get(&index)
            .copied()
            .unwrap_or((0, i64::MAX));
        let lo = lo.max(0);
        let hi = hi.min(cap);
        if is_start && self.fix_start_cumul_to_zero {
            (lo.max(0), hi.min(0))
        } else {
            (lo, hi)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_for_vehicle() {
        assert_eq!(Capacity::Uniform(30).for_vehicle(4), 30);
        assert_eq!(Capacity::PerVehicle(vec![5, 8]).for_vehicle(1), 8);
    }

    #[test]
    fn test_cumul_bounds() {
        let mut d = Dimension::new(
            "Time".into(),
            CallbackHandle(0),
            10,
            Capacity::Uniform(100),
            true,
        );
        assert_eq!(d.cumul_bounds(0, 0, true), (0, 0));
        assert_eq!(d.cumul_bounds(0, 3, false), (0, 100));
        d.set_cumul_range(3, 20, 400);
        assert_eq!(d.cumul_bounds(0, 3, false), (20, 100));
        d.set_cumul_range(3, -5, 50);
        assert_eq!(d.cumul_bounds(0, 3, false), (0, 50));
    }

    #[test]
    fn test_start_not_fixed() {
        let d = Dimension::new(
            "Load".into(),
            CallbackHandle(1),
            0,
            Capacity::PerVehicle(vec![15, 25]),
            false,
        );
        assert_eq!(d.cumul_bounds(1, 0, true), (0, 25));
    }
}
