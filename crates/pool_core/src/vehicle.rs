//! Vehicle state: one stoplist, advanced by fast-forward, queried for offers.
//!
//! The stoplist is mutated in exactly two places: [`VehicleState::fast_forward`]
//! services matured stops and moves the current position element, and
//! [`VehicleState::apply_insertion`] swaps in a dispatcher-built stoplist when
//! the fleet commits an offer. [`VehicleState::handle_request`] is a pure
//! query and is what the fleet fans out in parallel.

use std::fmt;
use std::sync::Arc;

use crate::dispatchers::{Dispatcher, InsertionResult};
use crate::events::Event;
use crate::requests::{InternalRequest, Request, TransportationRequest, VehicleId};
use crate::spaces::TransportSpace;
use crate::stops::{assert_stoplist_invariants, Stop, StopAction, Stoplist};

/// One vehicle's reply to a request: its id plus the proposed insertion.
#[derive(Debug, Clone)]
pub struct Offer<L> {
    pub vehicle_id: VehicleId,
    pub insertion: InsertionResult<L>,
}

impl<L> Offer<L> {
    pub fn cost(&self) -> f64 {
        self.insertion.min_cost
    }
}

pub struct VehicleState<S: TransportSpace> {
    vehicle_id: VehicleId,
    stoplist: Stoplist<S::Loc>,
    space: Arc<S>,
    dispatcher: Arc<dyn Dispatcher<S>>,
    seat_capacity: i32,
}

impl<S: TransportSpace> fmt::Debug for VehicleState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VehicleState")
            .field("vehicle_id", &self.vehicle_id)
            .field("stoplist", &self.stoplist)
            .field("seat_capacity", &self.seat_capacity)
            .finish_non_exhaustive()
    }
}

impl<S: TransportSpace> VehicleState<S> {
    pub fn new(
        vehicle_id: VehicleId,
        initial_location: S::Loc,
        space: Arc<S>,
        dispatcher: Arc<dyn Dispatcher<S>>,
        seat_capacity: i32,
    ) -> Self {
        let cpe_request = Arc::new(InternalRequest::new(vehicle_id, 0.0, initial_location));
        let cpe = Stop {
            location: initial_location,
            request: Request::Internal(cpe_request),
            action: StopAction::Internal,
            estimated_arrival_time: 0.0,
            occupancy_after_servicing: 0,
            time_window_min: 0.0,
            time_window_max: f64::INFINITY,
        };
        Self {
            vehicle_id,
            stoplist: vec![cpe],
            space,
            dispatcher,
            seat_capacity,
        }
    }

    pub fn vehicle_id(&self) -> VehicleId {
        self.vehicle_id
    }

    pub fn seat_capacity(&self) -> i32 {
        self.seat_capacity
    }

    pub fn stoplist(&self) -> &[Stop<S::Loc>] {
        &self.stoplist
    }

    /// Advance to simulation time `t`: service every stop whose arrival has
    /// matured, then move the current position element onto the route toward
    /// the next stop. Returns the service events in chronological order.
    /// Calling twice with the same `t` returns nothing the second time.
    pub fn fast_forward(&mut self, t: f64) -> Vec<Event> {
        let mut events = Vec::new();
        let mut last_serviced: Option<Stop<S::Loc>> = None;

        // Tail-first walk so removals do not shift pending indices; the
        // first serviced stop encountered is the latest one.
        for i in (1..self.stoplist.len()).rev() {
            if self.stoplist[i].estimated_arrival_time <= t {
                let stop = self.stoplist.remove(i);
                let timestamp = stop.estimated_departure_time();
                events.push(match stop.action {
                    StopAction::Pickup => Event::Pickup {
                        vehicle_id: self.vehicle_id,
                        request_id: stop.request_id(),
                        timestamp,
                    },
                    StopAction::Dropoff => Event::Delivery {
                        vehicle_id: self.vehicle_id,
                        request_id: stop.request_id(),
                        timestamp,
                    },
                    StopAction::Internal => Event::Internal {
                        vehicle_id: self.vehicle_id,
                        request_id: stop.request_id(),
                        timestamp,
                    },
                });
                if last_serviced.is_none() {
                    last_serviced = Some(stop);
                }
            }
        }
        events.reverse();

        let (last_location, last_arrival, last_occupancy) = match &last_serviced {
            Some(stop) => (
                stop.location,
                stop.estimated_arrival_time,
                stop.occupancy_after_servicing,
            ),
            None => {
                let cpe = &self.stoplist[0];
                (
                    cpe.location,
                    cpe.estimated_arrival_time,
                    cpe.occupancy_after_servicing,
                )
            }
        };

        self.stoplist[0].occupancy_after_servicing = last_occupancy;
        if self.stoplist.len() > 1 {
            if last_arrival > t {
                // Mid-jump from an earlier discrete interpolation: the CPE
                // already sits on a node it reaches in the future.
            } else {
                let time_to_next = self.stoplist[1].estimated_arrival_time - t;
                let (location, jump_time) = self.space.interp_time(
                    last_location,
                    self.stoplist[1].location,
                    time_to_next,
                );
                self.stoplist[0].location = location;
                self.stoplist[0].estimated_arrival_time = t + jump_time;
            }
        } else {
            self.stoplist[0].estimated_arrival_time = t;
            if let Some(stop) = &last_serviced {
                self.stoplist[0].location = stop.location;
            }
        }

        #[cfg(debug_assertions)]
        assert_stoplist_invariants(&self.stoplist, self.seat_capacity);
        events
    }

    /// Ask the dispatcher for this vehicle's offer. Pure: no state changes.
    pub fn handle_request(
        &self,
        request: &Arc<TransportationRequest<S::Loc>>,
    ) -> Offer<S::Loc> {
        let insertion = self.dispatcher.insert_request(
            request,
            &self.stoplist,
            self.space.as_ref(),
            self.seat_capacity,
        );
        Offer {
            vehicle_id: self.vehicle_id,
            insertion,
        }
    }

    /// Commit a dispatcher-built stoplist. Panics when the replacement
    /// violates the stoplist invariants; that is a dispatcher bug.
    pub fn apply_insertion(&mut self, new_stoplist: Stoplist<S::Loc>) {
        assert_stoplist_invariants(&new_stoplist, self.seat_capacity);
        self.stoplist = new_stoplist;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatchers::BruteForceDispatcher;
    use crate::spaces::grid::IntegerGrid;
    use crate::spaces::{Euclidean2D, Manhattan2D};

    fn test_vehicle(space: Manhattan2D) -> VehicleState<Manhattan2D> {
        VehicleState::new(
            1,
            (0.0, 0.0),
            Arc::new(space),
            Arc::new(BruteForceDispatcher::default()),
            4,
        )
    }

    fn vehicle_with_line_plan() -> VehicleState<Manhattan2D> {
        // Four future stops at arrival times 1, 2, 3, 4 along the x axis.
        let mut vehicle = test_vehicle(Manhattan2D::new(1.0));
        let first = Arc::new(TransportationRequest::new(10, 0.0, (1.0, 0.0), (2.0, 0.0)));
        let second = Arc::new(TransportationRequest::new(11, 0.0, (3.0, 0.0), (4.0, 0.0)));
        for request in [&first, &second] {
            let offer = vehicle.handle_request(request);
            assert!(offer.insertion.is_feasible());
            vehicle.apply_insertion(offer.insertion.new_stoplist);
        }
        let arrivals: Vec<f64> = vehicle.stoplist()[1..]
            .iter()
            .map(|s| s.estimated_arrival_time)
            .collect();
        assert_eq!(arrivals, vec![1.0, 2.0, 3.0, 4.0]);
        vehicle
    }

    #[test]
    fn fast_forward_services_matured_stops_and_interpolates() {
        let mut vehicle = vehicle_with_line_plan();
        let events = vehicle.fast_forward(2.5);

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::Pickup { request_id: 10, .. }));
        assert!(matches!(events[1], Event::Delivery { request_id: 10, .. }));
        assert!(events[0].timestamp() <= events[1].timestamp());

        // CPE moved onto the segment toward the next stop at (3, 0).
        let cpe = &vehicle.stoplist()[0];
        assert_eq!(cpe.location, (2.5, 0.0));
        assert!(cpe.estimated_arrival_time <= 2.5);
        assert_eq!(vehicle.stoplist().len(), 3);
        crate::test_helpers::assert_stoplist_consistent(
            vehicle.stoplist(),
            &Manhattan2D::new(1.0),
            4,
        );
    }

    #[test]
    fn fast_forward_is_idempotent() {
        let mut vehicle = vehicle_with_line_plan();
        let first = vehicle.fast_forward(2.5);
        assert_eq!(first.len(), 2);
        let second = vehicle.fast_forward(2.5);
        assert!(second.is_empty());
    }

    #[test]
    fn split_fast_forward_emits_the_same_events() {
        let mut direct = vehicle_with_line_plan();
        let mut split = vehicle_with_line_plan();

        let all_at_once = direct.fast_forward(3.5);
        let mut stepwise = split.fast_forward(1.5);
        stepwise.extend(split.fast_forward(3.5));

        assert_eq!(all_at_once, stepwise);
        assert_eq!(
            direct.stoplist()[0].location,
            split.stoplist()[0].location
        );
    }

    #[test]
    fn fast_forward_past_everything_parks_at_the_last_stop() {
        let mut vehicle = vehicle_with_line_plan();
        let events = vehicle.fast_forward(10.0);
        assert_eq!(events.len(), 4);
        assert_eq!(vehicle.stoplist().len(), 1);
        let cpe = &vehicle.stoplist()[0];
        assert_eq!(cpe.location, (4.0, 0.0));
        assert_eq!(cpe.estimated_arrival_time, 10.0);
        assert_eq!(cpe.occupancy_after_servicing, 0);
    }

    #[test]
    fn occupancy_carries_over_to_the_cpe() {
        let mut vehicle = vehicle_with_line_plan();
        // Stop at t=3 is the pickup of the second ride.
        vehicle.fast_forward(3.0);
        assert_eq!(vehicle.stoplist()[0].occupancy_after_servicing, 1);
    }

    #[test]
    fn discrete_interpolation_parks_on_the_next_node() {
        let mut vehicle: VehicleState<IntegerGrid> = VehicleState::new(
            7,
            (0, 0),
            Arc::new(IntegerGrid::new(1.0)),
            Arc::new(BruteForceDispatcher::default()),
            4,
        );
        let request = Arc::new(TransportationRequest::new(1, 0.0, (2, 0), (4, 0)));
        let offer = vehicle.handle_request(&request);
        vehicle.apply_insertion(offer.insertion.new_stoplist);

        // Half-way along the first edge: the CPE jumps forward to (1, 0)
        // and arrives there half a time unit later.
        let events = vehicle.fast_forward(0.5);
        assert!(events.is_empty());
        let cpe = &vehicle.stoplist()[0];
        assert_eq!(cpe.location, (1, 0));
        assert!((cpe.estimated_arrival_time - 1.0).abs() < 1e-9);

        // Before that node is reached the CPE must not move again.
        let events = vehicle.fast_forward(0.75);
        assert!(events.is_empty());
        assert_eq!(vehicle.stoplist()[0].location, (1, 0));
    }

    #[test]
    fn handle_request_does_not_mutate() {
        let vehicle = test_vehicle(Manhattan2D::new(1.0));
        let request = Arc::new(TransportationRequest::new(1, 0.0, (0.0, 1.0), (0.0, 2.0)));
        let before = vehicle.stoplist().len();
        let offer = vehicle.handle_request(&request);
        assert!(offer.insertion.is_feasible());
        assert_eq!(vehicle.stoplist().len(), before);
    }

    #[test]
    fn fast_forward_with_empty_plan_tracks_time_only() {
        let mut vehicle = test_vehicle(Manhattan2D::new(1.0));
        let events = vehicle.fast_forward(5.0);
        assert!(events.is_empty());
        assert_eq!(vehicle.stoplist()[0].estimated_arrival_time, 5.0);
        assert_eq!(vehicle.stoplist()[0].location, (0.0, 0.0));
    }

    #[test]
    fn euclidean_vehicle_round_trip() {
        let mut vehicle: VehicleState<Euclidean2D> = VehicleState::new(
            2,
            (0.0, 0.0),
            Arc::new(Euclidean2D::new(2.0)),
            Arc::new(BruteForceDispatcher::default()),
            1,
        );
        let request = Arc::new(TransportationRequest::new(1, 0.0, (0.0, 4.0), (0.0, 8.0)));
        let offer = vehicle.handle_request(&request);
        assert!(offer.insertion.is_feasible());
        vehicle.apply_insertion(offer.insertion.new_stoplist);
        // Velocity 2: pickup at t=2, dropoff at t=4.
        let events = vehicle.fast_forward(4.0);
        let timestamps: Vec<f64> = events.iter().map(|e| e.timestamp()).collect();
        assert_eq!(timestamps, vec![2.0, 4.0]);
        assert_eq!(vehicle.stoplist()[0].location, (0.0, 8.0));
    }
}
