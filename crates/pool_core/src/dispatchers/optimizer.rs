//! Global re-optimisation interface.
//!
//! A [`FleetOptimizer`] re-plans every stoplist at once (a pickup-and-
//! delivery problem with time windows and capacities) instead of inserting
//! one request into one vehicle. Only the interface lives here; solvers plug
//! in from outside the core.

use crate::spaces::TransportSpace;
use crate::stops::Stoplist;

pub trait FleetOptimizer<S: TransportSpace>: Send + Sync {
    /// Return re-planned stoplists, one per input stoplist, preserving every
    /// pending pickup/dropoff and all stoplist invariants.
    fn reoptimize(
        &self,
        stoplists: &[Stoplist<S::Loc>],
        space: &S,
        seat_capacities: &[i32],
    ) -> Vec<Stoplist<S::Loc>>;
}
