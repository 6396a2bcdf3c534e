//! Capacity partitioning (first-fit-decreasing bin packing)

use tracing::debug;

use super::error::VrpError;
use super::problem::VrpStop;

/// Relative slack for rounding in accumulated demand sums, in units of
/// machine epsilon
const LOAD_TOLERANCE_ULPS: f64 = 4.0;

/// Stops assigned to one vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleBin {
    pub vehicle_index: usize,
    /// Stop ids in ascending input order
    pub stop_ids: Vec<usize>,
    /// Sum of assigned demand
    pub load: f64,
}

impl VehicleBin {
    fn fits(&self, demand: f64, capacity: f64) -> bool {
        self.load + demand <= capacity + capacity * LOAD_TOLERANCE_ULPS * f64::EPSILON
    }
}

/// Split stops across equal-capacity vehicles.
///
/// Stops are placed largest demand first (ties keep input order) into the
/// first open vehicle with room; a new vehicle is opened when none fits.
pub fn partition(stops: &[VrpStop], capacity: f64) -> Result<Vec<VehicleBin>, VrpError> {
    if !capacity.is_finite() || capacity <= 0.0 {
        return Err(VrpError::InvalidCapacity(capacity));
    }

    if let Some(stop) = stops.iter().find(|s| s.demand > capacity) {
        return Err(VrpError::CapacityExceeded {
            stop_id: stop.id,
            demand: stop.demand,
            capacity,
        });
    }

    let mut order: Vec<&VrpStop> = stops.iter().collect();
    // Stable sort keeps input order among equal demands
    order.sort_by(|a, b| b.demand.total_cmp(&a.demand));

    let mut bins: Vec<VehicleBin> = Vec::new();
    for stop in order {
        match bins.iter_mut().find(|bin| bin.fits(stop.demand, capacity)) {
            Some(bin) => {
                bin.stop_ids.push(stop.id);
                bin.load += stop.demand;
            }
            None => bins.push(VehicleBin {
                vehicle_index: bins.len(),
                stop_ids: vec![stop.id],
                load: stop.demand,
            }),
        }
    }

    for bin in &mut bins {
        bin.stop_ids.sort_unstable();
    }

    debug!(
        "Partitioned {} stops into {} vehicles (capacity {})",
        stops.len(),
        bins.len(),
        capacity
    );

    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coordinates;

    fn stops(demands: &[f64]) -> Vec<VrpStop> {
        demands
            .iter()
            .enumerate()
            .map(|(i, &demand)| VrpStop {
                id: i + 1,
                coordinates: Coordinates { lat: 50.0, lng: 14.0 },
                demand,
            })
            .collect()
    }

    #[test]
    fn test_everything_fits_one_vehicle() {
        let bins = partition(&stops(&[5.0, 3.0]), 1000.0).unwrap();

        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].stop_ids, vec![1, 2]);
        assert_eq!(bins[0].load, 8.0);
    }

    #[test]
    fn test_first_fit_decreasing_assignment() {
        // Placement order by id: 1(7), 3(5), 2(4), 5(3), 4(2)
        let bins = partition(&stops(&[7.0, 4.0, 5.0, 2.0, 3.0]), 10.0).unwrap();

        assert_eq!(bins.len(), 3);
        assert_eq!(bins[0].stop_ids, vec![1, 5]);
        assert_eq!(bins[1].stop_ids, vec![2, 3]);
        assert_eq!(bins[2].stop_ids, vec![4]);
    }

    #[test]
    fn test_capacity_invariant_holds() {
        let demands = [3.0, 9.0, 1.0, 4.0, 4.0, 6.0, 2.0, 8.0, 5.0, 7.0];
        let capacity = 10.0;
        let input = stops(&demands);

        let bins = partition(&input, capacity).unwrap();

        let mut seen: Vec<usize> = Vec::new();
        for bin in &bins {
            let load: f64 = bin.stop_ids.iter().map(|id| demands[id - 1]).sum();
            assert!(load <= capacity);
            assert_eq!(load, bin.load);
            seen.extend(&bin.stop_ids);
        }
        seen.sort_unstable();
        assert_eq!(seen, (1..=demands.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_ties_break_by_input_order() {
        let bins = partition(&stops(&[6.0, 6.0, 6.0]), 10.0).unwrap();

        let order: Vec<Vec<usize>> = bins.iter().map(|b| b.stop_ids.clone()).collect();
        assert_eq!(order, vec![vec![1], vec![2], vec![3]]);
        assert_eq!(
            bins.iter().map(|b| b.vehicle_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_zero_demand_stops_share_first_vehicle() {
        let bins = partition(&stops(&[0.0, 10.0, 0.0]), 10.0).unwrap();

        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].stop_ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_fractional_demands_fill_exactly() {
        let bins = partition(&stops(&[0.1, 0.2, 0.7]), 1.0).unwrap();
        assert_eq!(bins.len(), 1);
    }

    #[test]
    fn test_tiny_capacity_is_not_overfilled() {
        let bins = partition(&stops(&[1e-10; 5]), 1e-10).unwrap();

        assert_eq!(bins.len(), 5);
        assert!(bins.iter().all(|b| b.load <= 1e-10));
    }

    #[test]
    fn test_near_capacity_demands_open_second_vehicle() {
        let bins = partition(&stops(&[6.0, 4.0000000005]), 10.0).unwrap();

        assert_eq!(bins.len(), 2);
        assert!(bins.iter().all(|b| b.load <= 10.0));
    }

    #[test]
    fn test_oversized_stop_is_reported() {
        let result = partition(&stops(&[5.0, 1001.0]), 1000.0);

        assert_eq!(
            result.unwrap_err(),
            VrpError::CapacityExceeded { stop_id: 2, demand: 1001.0, capacity: 1000.0 }
        );
    }

    #[test]
    fn test_invalid_capacity() {
        assert_eq!(
            partition(&stops(&[1.0]), 0.0).unwrap_err(),
            VrpError::InvalidCapacity(0.0)
        );
        assert!(matches!(
            partition(&stops(&[1.0]), f64::NAN),
            Err(VrpError::InvalidCapacity(_))
        ));
    }
}
