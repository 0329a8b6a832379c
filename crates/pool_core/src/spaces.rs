//! Transport spaces: distances, travel times, and on-route interpolation.
//!
//! A [`TransportSpace`] answers three questions for a vehicle plan:
//!
//! - **How far** is it from `u` to `v` ([`TransportSpace::d`])?
//! - **How long** does driving that take ([`TransportSpace::t`])?
//! - **Where is the vehicle** when part of the way there
//!   ([`TransportSpace::interp_dist`] / [`TransportSpace::interp_time`])?
//!
//! Continuous planar spaces ([`Euclidean2D`], [`Manhattan2D`]) interpolate to
//! an exact point on the segment. Discrete spaces ([`grid::IntegerGrid`],
//! [`graph::WeightedGraph`]) cannot place a vehicle between nodes, so they
//! return the next unreached node together with a *jump residual*: the
//! distance (or time) still to be travelled before that node is reached.
//! Callers park the vehicle on the returned node with an arrival time in the
//! near future instead of teleporting it onto an edge.
//!
//! Unreachable pairs and NaN coordinates are reported as `+∞`, which the
//! dispatchers treat as infeasibility.

pub mod graph;
pub mod grid;

use std::fmt::Debug;

/// Bound for location types usable in stoplists and spaces.
pub trait Loc: Copy + PartialEq + Debug + Send + Sync + 'static {}

impl<T: Copy + PartialEq + Debug + Send + Sync + 'static> Loc for T {}

/// Continuous planar location.
pub type R2loc = (f64, f64);

/// Graph node id.
pub type Iloc = u64;

pub trait TransportSpace: Send + Sync {
    type Loc: Loc;

    /// Distance from `u` to `v`. Non-negative; `+∞` when unreachable.
    fn d(&self, u: Self::Loc, v: Self::Loc) -> f64;

    /// Travel time from `u` to `v`. `+∞` when unreachable.
    fn t(&self, u: Self::Loc, v: Self::Loc) -> f64;

    /// The location reached when, travelling from `u` toward `v`, the
    /// remaining distance to `v` equals `dist_to_dest`, plus the jump
    /// residual still to be travelled before that location is reached.
    ///
    /// Continuous spaces return an exact point and a zero residual. Discrete
    /// spaces return the next unreached node and the distance left to it.
    /// When `dist_to_dest` exceeds the full distance (the vehicle has not
    /// departed yet), `u` is returned with the excess as residual.
    fn interp_dist(&self, u: Self::Loc, v: Self::Loc, dist_to_dest: f64) -> (Self::Loc, f64);

    /// Time-unit analogue of [`TransportSpace::interp_dist`].
    fn interp_time(&self, u: Self::Loc, v: Self::Loc, time_to_dest: f64) -> (Self::Loc, f64);

    /// Constant cruise velocity relating distance and time.
    fn velocity(&self) -> f64;
}

/// Map NaN distances (e.g. from NaN coordinates) to `+∞` so that they read
/// as unreachable instead of silently passing feasibility comparisons.
fn finite_or_inf(x: f64) -> f64 {
    if x.is_nan() {
        f64::INFINITY
    } else {
        x
    }
}

/// Straight-segment interpolation shared by the continuous planar spaces.
///
/// Works for any metric that decreases linearly along the segment, which
/// holds for both the Euclidean and the Manhattan metric.
fn interp_segment(u: R2loc, v: R2loc, total: f64, dist_to_dest: f64) -> (R2loc, f64) {
    if dist_to_dest <= 0.0 {
        return (v, 0.0);
    }
    if dist_to_dest >= total {
        // Not yet departed from u; the residual carries the remaining wait.
        return (u, dist_to_dest - total);
    }
    let frac = 1.0 - dist_to_dest / total;
    (
        (u.0 + frac * (v.0 - u.0), u.1 + frac * (v.1 - u.1)),
        0.0,
    )
}

/// Continuous plane under the Euclidean metric, constant velocity.
#[derive(Debug, Clone, Copy)]
pub struct Euclidean2D {
    velocity: f64,
}

impl Euclidean2D {
    pub fn new(velocity: f64) -> Self {
        assert!(
            velocity > 0.0 && velocity.is_finite(),
            "velocity must be positive and finite"
        );
        Self { velocity }
    }
}

impl Default for Euclidean2D {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl TransportSpace for Euclidean2D {
    type Loc = R2loc;

    fn d(&self, u: R2loc, v: R2loc) -> f64 {
        finite_or_inf(((u.0 - v.0).powi(2) + (u.1 - v.1).powi(2)).sqrt())
    }

    fn t(&self, u: R2loc, v: R2loc) -> f64 {
        self.d(u, v) / self.velocity
    }

    fn interp_dist(&self, u: R2loc, v: R2loc, dist_to_dest: f64) -> (R2loc, f64) {
        interp_segment(u, v, self.d(u, v), dist_to_dest)
    }

    fn interp_time(&self, u: R2loc, v: R2loc, time_to_dest: f64) -> (R2loc, f64) {
        let (loc, jump_dist) = self.interp_dist(u, v, time_to_dest * self.velocity);
        (loc, jump_dist / self.velocity)
    }

    fn velocity(&self) -> f64 {
        self.velocity
    }
}

/// Continuous plane under the Manhattan (L1) metric, constant velocity.
#[derive(Debug, Clone, Copy)]
pub struct Manhattan2D {
    velocity: f64,
}

impl Manhattan2D {
    pub fn new(velocity: f64) -> Self {
        assert!(
            velocity > 0.0 && velocity.is_finite(),
            "velocity must be positive and finite"
        );
        Self { velocity }
    }
}

impl Default for Manhattan2D {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl TransportSpace for Manhattan2D {
    type Loc = R2loc;

    fn d(&self, u: R2loc, v: R2loc) -> f64 {
        finite_or_inf((u.0 - v.0).abs() + (u.1 - v.1).abs())
    }

    fn t(&self, u: R2loc, v: R2loc) -> f64 {
        self.d(u, v) / self.velocity
    }

    fn interp_dist(&self, u: R2loc, v: R2loc, dist_to_dest: f64) -> (R2loc, f64) {
        interp_segment(u, v, self.d(u, v), dist_to_dest)
    }

    fn interp_time(&self, u: R2loc, v: R2loc, time_to_dest: f64) -> (R2loc, f64) {
        let (loc, jump_dist) = self.interp_dist(u, v, time_to_dest * self.velocity);
        (loc, jump_dist / self.velocity)
    }

    fn velocity(&self) -> f64 {
        self.velocity
    }
}
