//! Exhaustive minimum-cost insertion over all pickup/dropoff pairs.

use std::sync::Arc;

use crate::requests::TransportationRequest;
use crate::spaces::TransportSpace;
use crate::stops::Stop;

use super::insertion::minimum_cost_insertion;
use super::{Dispatcher, InsertionResult};

/// What an insertion costs: added travel time (canonical) or added distance.
/// Identical for unit velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostKind {
    TotalTravelTime,
    AbsoluteDetour,
}

/// Considers every `(i, j)` pickup/dropoff placement and returns the one
/// with the least added cost, subject to the time windows of the request and
/// of every stop already planned, and to the seat capacity. O(n²) in the
/// stoplist length.
#[derive(Debug, Clone, Copy)]
pub struct BruteForceDispatcher {
    pub cost: CostKind,
    /// Print improving candidates to stderr while searching.
    pub debug: bool,
}

impl BruteForceDispatcher {
    pub fn new(cost: CostKind) -> Self {
        Self { cost, debug: false }
    }
}

impl Default for BruteForceDispatcher {
    fn default() -> Self {
        Self::new(CostKind::TotalTravelTime)
    }
}

impl<S: TransportSpace> Dispatcher<S> for BruteForceDispatcher {
    fn insert_request(
        &self,
        request: &Arc<TransportationRequest<S::Loc>>,
        stoplist: &[Stop<S::Loc>],
        space: &S,
        seat_capacity: i32,
    ) -> InsertionResult<S::Loc> {
        minimum_cost_insertion(
            request,
            stoplist,
            space,
            seat_capacity,
            self.cost,
            None,
            self.debug,
        )
    }
}
