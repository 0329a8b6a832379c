//! Stops and stoplists: the ordered service plan of one vehicle.
//!
//! A stoplist always begins with the current position element (CPE), an
//! internal-action stop marking where the vehicle is right now. Every later
//! stop carries a cached predicted arrival time, the occupancy after it is
//! serviced, and its service-time window. Under the drive-first policy the
//! vehicle departs a stop at `max(arrival, window_min)`: it drives as fast
//! as possible and waits only when early.

use crate::requests::{Request, RequestId};
use crate::spaces::Loc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAction {
    Pickup,
    Dropoff,
    Internal,
}

impl StopAction {
    /// Occupancy change when a stop with this action is serviced.
    pub fn delta_occupancy(self) -> i32 {
        match self {
            StopAction::Pickup => 1,
            StopAction::Dropoff => -1,
            StopAction::Internal => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stop<L> {
    pub location: L,
    pub request: Request<L>,
    pub action: StopAction,
    pub estimated_arrival_time: f64,
    pub occupancy_after_servicing: i32,
    pub time_window_min: f64,
    pub time_window_max: f64,
}

impl<L: Loc> Stop<L> {
    /// Drive-first departure: wait only when arriving before the window opens.
    pub fn estimated_departure_time(&self) -> f64 {
        self.estimated_arrival_time.max(self.time_window_min)
    }

    pub fn request_id(&self) -> RequestId {
        self.request.id()
    }
}

pub type Stoplist<L> = Vec<Stop<L>>;

/// Panic unless the structural stoplist invariants hold. Called when a fleet
/// commits a stoplist; a breach is an implementation bug, not bad input.
///
/// Checked here: CPE at index 0, monotone arrival times, the occupancy
/// recurrence and bounds, and pickup-before-dropoff per request. Travel-time
/// consistency additionally needs a space and is asserted in tests.
pub fn assert_stoplist_invariants<L: Loc>(stoplist: &[Stop<L>], seat_capacity: i32) {
    assert!(!stoplist.is_empty(), "stoplist must contain the CPE");
    assert!(
        stoplist[0].action == StopAction::Internal,
        "stoplist must start with the current position element"
    );

    let mut previous_arrival = stoplist[0].estimated_arrival_time;
    let mut occupancy = stoplist[0].occupancy_after_servicing;
    assert!(
        (0..=seat_capacity).contains(&occupancy),
        "CPE occupancy {occupancy} out of [0, {seat_capacity}]"
    );

    let mut pickup_index: std::collections::HashMap<RequestId, usize> =
        std::collections::HashMap::new();
    let mut dropoff_index: std::collections::HashMap<RequestId, usize> =
        std::collections::HashMap::new();

    for (i, stop) in stoplist.iter().enumerate().skip(1) {
        assert!(
            stop.estimated_arrival_time >= previous_arrival,
            "arrival times must be non-decreasing (stop {i})"
        );
        previous_arrival = stop.estimated_arrival_time;

        occupancy += stop.action.delta_occupancy();
        assert!(
            stop.occupancy_after_servicing == occupancy,
            "occupancy after stop {i} is {} but the recurrence gives {occupancy}",
            stop.occupancy_after_servicing
        );
        assert!(
            (0..=seat_capacity).contains(&occupancy),
            "occupancy {occupancy} out of [0, {seat_capacity}] at stop {i}"
        );

        match stop.action {
            StopAction::Pickup => {
                let previous = pickup_index.insert(stop.request_id(), i);
                assert!(
                    previous.is_none(),
                    "request {} has more than one pickup",
                    stop.request_id()
                );
            }
            StopAction::Dropoff => {
                let previous = dropoff_index.insert(stop.request_id(), i);
                assert!(
                    previous.is_none(),
                    "request {} has more than one dropoff",
                    stop.request_id()
                );
            }
            StopAction::Internal => {}
        }
    }

    for (request_id, dropoff) in &dropoff_index {
        if let Some(pickup) = pickup_index.get(request_id) {
            assert!(
                pickup < dropoff,
                "request {request_id} is dropped off before being picked up"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::{InternalRequest, TransportationRequest};
    use std::sync::Arc;

    fn cpe(location: (f64, f64)) -> Stop<(f64, f64)> {
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

    fn ride(id: RequestId) -> Request<(f64, f64)> {
        Request::Transportation(Arc::new(TransportationRequest::new(
            id,
            0.0,
            (0.0, 0.0),
            (1.0, 0.0),
        )))
    }

    fn stop(
        request: &Request<(f64, f64)>,
        action: StopAction,
        arrival: f64,
        occupancy: i32,
    ) -> Stop<(f64, f64)> {
        Stop {
            location: (arrival, 0.0),
            request: request.clone(),
            action,
            estimated_arrival_time: arrival,
            occupancy_after_servicing: occupancy,
            time_window_min: 0.0,
            time_window_max: f64::INFINITY,
        }
    }

    #[test]
    fn departure_waits_for_window_opening() {
        let mut s = cpe((0.0, 0.0));
        s.estimated_arrival_time = 3.0;
        s.time_window_min = 5.0;
        assert_eq!(s.estimated_departure_time(), 5.0);
        s.time_window_min = 1.0;
        assert_eq!(s.estimated_departure_time(), 3.0);
    }

    #[test]
    fn valid_stoplist_passes() {
        let ride = ride(1);
        let stoplist = vec![
            cpe((0.0, 0.0)),
            stop(&ride, StopAction::Pickup, 1.0, 1),
            stop(&ride, StopAction::Dropoff, 2.0, 0),
        ];
        assert_stoplist_invariants(&stoplist, 4);
    }

    #[test]
    #[should_panic(expected = "current position element")]
    fn missing_cpe_is_a_bug() {
        let ride = ride(1);
        let stoplist = vec![stop(&ride, StopAction::Pickup, 1.0, 1)];
        assert_stoplist_invariants(&stoplist, 4);
    }

    #[test]
    #[should_panic(expected = "non-decreasing")]
    fn decreasing_arrivals_are_a_bug() {
        let ride = ride(1);
        let stoplist = vec![
            cpe((0.0, 0.0)),
            stop(&ride, StopAction::Pickup, 2.0, 1),
            stop(&ride, StopAction::Dropoff, 1.0, 0),
        ];
        assert_stoplist_invariants(&stoplist, 4);
    }

    #[test]
    #[should_panic(expected = "out of [0, 1]")]
    fn capacity_overflow_is_a_bug() {
        let first = ride(1);
        let second = ride(2);
        let stoplist = vec![
            cpe((0.0, 0.0)),
            stop(&first, StopAction::Pickup, 1.0, 1),
            stop(&second, StopAction::Pickup, 2.0, 2),
            stop(&first, StopAction::Dropoff, 3.0, 1),
            stop(&second, StopAction::Dropoff, 4.0, 0),
        ];
        assert_stoplist_invariants(&stoplist, 1);
    }

    #[test]
    #[should_panic(expected = "dropped off before")]
    fn dropoff_before_pickup_is_a_bug() {
        let ride = ride(1);
        let mut head = cpe((0.0, 0.0));
        head.occupancy_after_servicing = 1;
        let stoplist = vec![
            head,
            stop(&ride, StopAction::Dropoff, 1.0, 0),
            stop(&ride, StopAction::Pickup, 2.0, 1),
        ];
        assert_stoplist_invariants(&stoplist, 4);
    }

    #[test]
    fn dropoff_of_onboard_passenger_is_allowed() {
        // Pickup already serviced: only the dropoff remains, starting from
        // occupancy 1 at the CPE.
        let ride = ride(9);
        let mut head = cpe((0.0, 0.0));
        head.occupancy_after_servicing = 1;
        let stoplist = vec![head, stop(&ride, StopAction::Dropoff, 1.0, 0)];
        assert_stoplist_invariants(&stoplist, 1);
    }
}
