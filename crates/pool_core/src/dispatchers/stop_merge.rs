//! Stop-merging dispatcher (experimental).
//!
//! Before searching, the request's pickup and dropoff locations are snapped
//! onto the nearest already-planned stop within `merge_radius`. The ride is
//! then served at the existing node with a zero-length approach leg, which
//! merges service geographically while keeping one stop per request (so
//! per-request events and windows stay intact). Behaviour under
//! heterogeneous windows at a merged node is intentionally conservative:
//! each request keeps its own window.

use std::sync::Arc;

use crate::requests::TransportationRequest;
use crate::spaces::TransportSpace;
use crate::stops::Stop;

use super::brute_force::CostKind;
use super::insertion::minimum_cost_insertion;
use super::{Dispatcher, InsertionResult};

#[derive(Debug, Clone, Copy)]
pub struct StopMergeDispatcher {
    /// Service locations within this distance of a planned stop are snapped
    /// onto it; 0 disables merging.
    pub merge_radius: f64,
}

impl StopMergeDispatcher {
    pub fn new(merge_radius: f64) -> Self {
        assert!(merge_radius >= 0.0, "merge_radius must be non-negative");
        Self { merge_radius }
    }

    /// Nearest planned stop location within the merge radius, or the
    /// location itself.
    fn snap<S: TransportSpace>(&self, stoplist: &[Stop<S::Loc>], location: S::Loc, space: &S) -> S::Loc {
        stoplist
            .iter()
            .map(|stop| (space.d(stop.location, location), stop.location))
            .filter(|(dist, _)| *dist <= self.merge_radius)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, snapped)| snapped)
            .unwrap_or(location)
    }
}

impl<S: TransportSpace> Dispatcher<S> for StopMergeDispatcher {
    fn insert_request(
        &self,
        request: &Arc<TransportationRequest<S::Loc>>,
        stoplist: &[Stop<S::Loc>],
        space: &S,
        seat_capacity: i32,
    ) -> InsertionResult<S::Loc> {
        let origin = self.snap(stoplist, request.origin, space);
        let destination = self.snap(stoplist, request.destination, space);
        let effective = if origin == request.origin && destination == request.destination {
            Arc::clone(request)
        } else {
            Arc::new(TransportationRequest {
                origin,
                destination,
                ..(**request).clone()
            })
        };
        minimum_cost_insertion(
            &effective,
            stoplist,
            space,
            seat_capacity,
            CostKind::TotalTravelTime,
            None,
            false,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::{InternalRequest, Request};
    use crate::spaces::{Manhattan2D, R2loc};
    use crate::stops::StopAction;

    fn stoplist_with_stop_at(location: R2loc) -> Vec<Stop<R2loc>> {
        let planned = Arc::new(TransportationRequest::new(1, 0.0, location, (9.0, 9.0)));
        vec![
            Stop {
                location: (0.0, 0.0),
                request: Request::Internal(Arc::new(InternalRequest::new(0, 0.0, (0.0, 0.0)))),
                action: StopAction::Internal,
                estimated_arrival_time: 0.0,
                occupancy_after_servicing: 0,
                time_window_min: 0.0,
                time_window_max: f64::INFINITY,
            },
            Stop {
                location,
                request: Request::Transportation(planned),
                action: StopAction::Pickup,
                estimated_arrival_time: 2.0,
                occupancy_after_servicing: 1,
                time_window_min: 0.0,
                time_window_max: f64::INFINITY,
            },
        ]
    }

    #[test]
    fn nearby_pickup_is_snapped_onto_the_planned_stop() {
        let space = Manhattan2D::new(1.0);
        let stoplist = stoplist_with_stop_at((2.0, 0.0));
        let request = Arc::new(TransportationRequest::new(
            2,
            0.0,
            (2.05, 0.0),
            (5.0, 0.0),
        ));
        let result =
            StopMergeDispatcher::new(0.1).insert_request(&request, &stoplist, &space, 4);

        assert!(result.is_feasible());
        let pickup = result
            .new_stoplist
            .iter()
            .find(|s| s.action == StopAction::Pickup && s.request_id() == 2)
            .expect("pickup present");
        assert_eq!(pickup.location, (2.0, 0.0));
        // The merged pickup adds no approach leg.
        assert_eq!(pickup.estimated_arrival_time, 2.0);
    }

    #[test]
    fn distant_locations_are_left_alone() {
        let space = Manhattan2D::new(1.0);
        let stoplist = stoplist_with_stop_at((2.0, 0.0));
        let request = Arc::new(TransportationRequest::new(2, 0.0, (4.0, 0.0), (6.0, 0.0)));
        let result =
            StopMergeDispatcher::new(0.1).insert_request(&request, &stoplist, &space, 4);

        assert!(result.is_feasible());
        let pickup = result
            .new_stoplist
            .iter()
            .find(|s| s.action == StopAction::Pickup && s.request_id() == 2)
            .expect("pickup present");
        assert_eq!(pickup.location, (4.0, 0.0));
    }

    #[test]
    fn zero_radius_never_merges() {
        let space = Manhattan2D::new(1.0);
        let stoplist = stoplist_with_stop_at((2.0, 0.0));
        let request = Arc::new(TransportationRequest::new(
            2,
            0.0,
            (2.05, 0.0),
            (5.0, 0.0),
        ));
        let result =
            StopMergeDispatcher::new(0.0).insert_request(&request, &stoplist, &space, 4);
        let pickup = result
            .new_stoplist
            .iter()
            .find(|s| s.action == StopAction::Pickup && s.request_id() == 2)
            .expect("pickup present");
        assert_eq!(pickup.location, (2.05, 0.0));
    }
}
