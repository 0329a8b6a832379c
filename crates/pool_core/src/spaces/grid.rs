//! Integer lattice under the Manhattan metric.
//!
//! Locations are `(i64, i64)` lattice nodes. Interpolation is discrete: the
//! vehicle moves along the axis-aligned path (x first, then y) and is always
//! reported on the next unreached node, with the jump residual carrying the
//! distance left to that node.

use super::{finite_or_inf, TransportSpace};

#[derive(Debug, Clone, Copy)]
pub struct IntegerGrid {
    velocity: f64,
}

impl IntegerGrid {
    pub fn new(velocity: f64) -> Self {
        assert!(
            velocity > 0.0 && velocity.is_finite(),
            "velocity must be positive and finite"
        );
        Self { velocity }
    }
}

impl Default for IntegerGrid {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Node reached after `k` unit steps along the x-first path from `u` to `v`.
fn step_node(u: (i64, i64), v: (i64, i64), k: i64) -> (i64, i64) {
    let dx = v.0 - u.0;
    if k <= dx.abs() {
        (u.0 + dx.signum() * k, u.1)
    } else {
        let rest = k - dx.abs();
        (v.0, u.1 + (v.1 - u.1).signum() * rest)
    }
}

impl TransportSpace for IntegerGrid {
    type Loc = (i64, i64);

    fn d(&self, u: (i64, i64), v: (i64, i64)) -> f64 {
        ((u.0 - v.0).abs() + (u.1 - v.1).abs()) as f64
    }

    fn t(&self, u: (i64, i64), v: (i64, i64)) -> f64 {
        self.d(u, v) / self.velocity
    }

    fn interp_dist(&self, u: (i64, i64), v: (i64, i64), dist_to_dest: f64) -> ((i64, i64), f64) {
        let dist_to_dest = finite_or_inf(dist_to_dest);
        let total = self.d(u, v);
        if dist_to_dest <= 0.0 {
            return (v, 0.0);
        }
        if dist_to_dest >= total {
            return (u, dist_to_dest - total);
        }
        let travelled = total - dist_to_dest;
        // Next unreached node; when exactly on a node the residual is zero.
        let steps = travelled.ceil() as i64;
        let jump = steps as f64 - travelled;
        (step_node(u, v, steps), jump)
    }

    fn interp_time(&self, u: (i64, i64), v: (i64, i64), time_to_dest: f64) -> ((i64, i64), f64) {
        let (loc, jump_dist) = self.interp_dist(u, v, time_to_dest * self.velocity);
        (loc, jump_dist / self.velocity)
    }

    fn velocity(&self) -> f64 {
        self.velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_distance_is_manhattan() {
        let space = IntegerGrid::new(1.0);
        assert_eq!(space.d((0, 0), (3, -4)), 7.0);
        assert_eq!(space.d((2, 2), (2, 2)), 0.0);
    }

    #[test]
    fn interpolation_snaps_to_next_node() {
        let space = IntegerGrid::new(1.0);
        // Path (0,0) -> (2,0) -> (2,2): 4 units in total.
        // 1.5 units from destination means 2.5 travelled; next node is (2,1).
        let (loc, jump) = space.interp_dist((0, 0), (2, 2), 1.5);
        assert_eq!(loc, (2, 1));
        assert!((jump - 0.5).abs() < 1e-9);
    }

    #[test]
    fn interpolation_on_a_node_has_zero_residual() {
        let space = IntegerGrid::new(1.0);
        let (loc, jump) = space.interp_dist((0, 0), (2, 2), 2.0);
        assert_eq!(loc, (2, 0));
        assert_eq!(jump, 0.0);
    }

    #[test]
    fn interpolation_before_departure_stays_at_origin() {
        let space = IntegerGrid::new(2.0);
        let (loc, jump) = space.interp_time((0, 0), (2, 0), 1.5);
        // Full traversal takes 1 time unit; half a unit of waiting remains.
        assert_eq!(loc, (0, 0));
        assert!((jump - 0.5).abs() < 1e-9);
    }
}
