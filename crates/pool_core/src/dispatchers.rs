//! Dispatchers: pluggable insertion strategies for single requests.
//!
//! A dispatcher is a pure function from `(request, stoplist, space, seat
//! capacity)` to an [`InsertionResult`]: the minimum-cost placement of the
//! request's pickup and dropoff into the vehicle's plan, or an infeasible
//! result when no placement honours the time windows and the capacity.
//!
//! ## Implementations
//!
//! - [`BruteForceDispatcher`]: exhaustive search over all insertion pairs
//! - [`EllipseDispatcher`]: prunes detour-heavy insertion points first
//! - [`StopMergeDispatcher`]: snaps service onto nearby existing stops
//!   (experimental)
//! - [`FleetOptimizer`]: interface for global re-planning across all
//!   stoplists at once
//!
//! Tuning knobs live in each variant's construction-time struct; the hot
//! call carries none.

pub mod brute_force;
pub mod ellipse;
pub mod insertion;
pub mod optimizer;
pub mod stop_merge;

pub use brute_force::{BruteForceDispatcher, CostKind};
pub use ellipse::EllipseDispatcher;
pub use optimizer::FleetOptimizer;
pub use stop_merge::StopMergeDispatcher;

use std::sync::Arc;

use crate::requests::TransportationRequest;
use crate::spaces::TransportSpace;
use crate::stops::Stoplist;

/// A proposed insertion: the stoplist to commit plus the service-window
/// bounds announced to the requester. Infeasibility is encoded as
/// `min_cost = +∞` with an empty stoplist, never as an error.
#[derive(Debug, Clone)]
pub struct InsertionResult<L> {
    pub new_stoplist: Stoplist<L>,
    pub min_cost: f64,
    pub earliest_pickup_time: f64,
    pub latest_pickup_time: f64,
    pub earliest_dropoff_time: f64,
    pub latest_dropoff_time: f64,
}

impl<L> InsertionResult<L> {
    pub fn infeasible() -> Self {
        Self {
            new_stoplist: Vec::new(),
            min_cost: f64::INFINITY,
            earliest_pickup_time: f64::NAN,
            latest_pickup_time: f64::NAN,
            earliest_dropoff_time: f64::NAN,
            latest_dropoff_time: f64::NAN,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.min_cost.is_finite()
    }
}

pub trait Dispatcher<S: TransportSpace>: Send + Sync {
    /// Propose the minimum-cost insertion of `request` into `stoplist`.
    /// Pure: the input stoplist is never mutated.
    fn insert_request(
        &self,
        request: &Arc<TransportationRequest<S::Loc>>,
        stoplist: &[crate::stops::Stop<S::Loc>],
        space: &S,
        seat_capacity: i32,
    ) -> InsertionResult<S::Loc>;
}
