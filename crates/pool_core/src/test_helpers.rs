//! Test helpers shared across test modules.

use std::sync::Arc;

use crate::requests::{InternalRequest, Request};
use crate::spaces::{R2loc, TransportSpace};
use crate::stops::{Stop, StopAction};

/// A fresh current position element at `location`.
pub fn cpe_at(location: R2loc) -> Stop<R2loc> {
    Stop {
        location,
        request: Request::Internal(Arc::new(InternalRequest::new(0, 0.0, location))),
        action: StopAction::Internal,
        estimated_arrival_time: 0.0,
        occupancy_after_servicing: 0,
        time_window_min: 0.0,
        time_window_max: f64::INFINITY,
    }
}

/// Full consistency check of a stoplist against its space: the structural
/// invariants plus the travel-time inequality between consecutive stops.
pub fn assert_stoplist_consistent<S: TransportSpace>(
    stoplist: &[Stop<S::Loc>],
    space: &S,
    seat_capacity: i32,
) {
    crate::stops::assert_stoplist_invariants(stoplist, seat_capacity);
    for pair in stoplist.windows(2) {
        let lower_bound =
            pair[0].estimated_departure_time() + space.t(pair[0].location, pair[1].location);
        assert!(
            pair[1].estimated_arrival_time >= lower_bound - 1e-9,
            "arrival {} at {:?} undercuts departure-plus-travel {}",
            pair[1].estimated_arrival_time,
            pair[1].location,
            lower_bound
        );
    }
}
