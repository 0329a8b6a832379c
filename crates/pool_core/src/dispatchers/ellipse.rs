//! Detour-ellipse pruning ahead of the exhaustive search.
//!
//! An insertion point only survives if routing the new location between two
//! consecutive stops stays within `(1 + max_relative_detour)` times the
//! direct leg, i.e. the location lies inside the ellipse with the two stops
//! as foci. Tail positions are never pruned. Among the survivors the search
//! minimises total travel time exactly like [`super::BruteForceDispatcher`].

use std::sync::Arc;

use crate::requests::TransportationRequest;
use crate::spaces::TransportSpace;
use crate::stops::Stop;

use super::brute_force::CostKind;
use super::insertion::minimum_cost_insertion;
use super::{Dispatcher, InsertionResult};

#[derive(Debug, Clone, Copy)]
pub struct EllipseDispatcher {
    /// Allowed relative leg detour; 0 keeps only on-the-way insertions.
    pub max_relative_detour: f64,
}

impl EllipseDispatcher {
    pub fn new(max_relative_detour: f64) -> Self {
        assert!(
            max_relative_detour >= 0.0,
            "max_relative_detour must be non-negative"
        );
        Self {
            max_relative_detour,
        }
    }
}

impl<S: TransportSpace> Dispatcher<S> for EllipseDispatcher {
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
            CostKind::TotalTravelTime,
            Some(self.max_relative_detour),
            false,
        )
    }
}
