//! Fleet state: drives the clock, arbitrates offers, owns the event log.
//!
//! One logical simulation thread runs the loop; the only parallel section is
//! the per-request offer fan-out, which is embarrassingly parallel because
//! [`VehicleState::handle_request`] is pure. A dispatcher panic is caught
//! per vehicle and demoted to an infeasible offer with a stderr warning; the
//! simulation continues.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use rayon::prelude::*;

use crate::dispatchers::{Dispatcher, InsertionResult};
use crate::events::{Event, OfferPayload};
use crate::requests::{TransportationRequest, VehicleId};
use crate::spaces::TransportSpace;
use crate::stops::Stoplist;
use crate::vehicle::{Offer, VehicleState};

/// Rejected fleet configurations. Raised at construction, never mid-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetConfigError {
    NonPositiveSeatCapacity(i32),
    EmptyFleet,
    DuplicateVehicleId(VehicleId),
}

impl fmt::Display for FleetConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FleetConfigError::NonPositiveSeatCapacity(capacity) => {
                write!(f, "seat capacity must be positive, got {capacity}")
            }
            FleetConfigError::EmptyFleet => write!(f, "fleet must contain at least one vehicle"),
            FleetConfigError::DuplicateVehicleId(id) => {
                write!(f, "duplicate vehicle id {id}")
            }
        }
    }
}

impl Error for FleetConfigError {}

pub struct FleetState<S: TransportSpace> {
    vehicles: BTreeMap<VehicleId, VehicleState<S>>,
    events: Vec<Event>,
    now: f64,
}

impl<S: TransportSpace> fmt::Debug for FleetState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FleetState")
            .field("vehicles", &self.vehicles)
            .field("events", &self.events)
            .field("now", &self.now)
            .finish()
    }
}

impl<S: TransportSpace> FleetState<S> {
    /// Build a fleet from initial vehicle positions. All vehicles share the
    /// space, the dispatcher, and the seat capacity.
    pub fn new(
        space: Arc<S>,
        dispatcher: Arc<dyn Dispatcher<S>>,
        initial_locations: impl IntoIterator<Item = (VehicleId, S::Loc)>,
        seat_capacity: i32,
    ) -> Result<Self, FleetConfigError> {
        if seat_capacity <= 0 {
            return Err(FleetConfigError::NonPositiveSeatCapacity(seat_capacity));
        }
        let mut vehicles = BTreeMap::new();
        for (vehicle_id, location) in initial_locations {
            let vehicle = VehicleState::new(
                vehicle_id,
                location,
                Arc::clone(&space),
                Arc::clone(&dispatcher),
                seat_capacity,
            );
            if vehicles.insert(vehicle_id, vehicle).is_some() {
                return Err(FleetConfigError::DuplicateVehicleId(vehicle_id));
            }
        }
        if vehicles.is_empty() {
            return Err(FleetConfigError::EmptyFleet);
        }
        Ok(Self {
            vehicles,
            events: Vec::new(),
            now: 0.0,
        })
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn num_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    pub fn vehicle(&self, vehicle_id: VehicleId) -> Option<&VehicleState<S>> {
        self.vehicles.get(&vehicle_id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &VehicleState<S>> {
        self.vehicles.values()
    }

    pub fn stoplists(&self) -> Vec<Stoplist<S::Loc>> {
        self.vehicles
            .values()
            .map(|v| v.stoplist().to_vec())
            .collect()
    }

    /// The event log in chronological order. Within one timestamp, events
    /// order by kind, then vehicle id, then request id.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// Process one request: submit, advance every vehicle to its creation
    /// time, fan out offers in parallel, and commit the cheapest one (ties
    /// go to the lowest vehicle id). Infeasibility everywhere rejects the
    /// request. Requests must arrive in creation-time order.
    pub fn submit_request(&mut self, request: &Arc<TransportationRequest<S::Loc>>) {
        debug_assert!(
            request.creation_timestamp >= self.now,
            "requests must be submitted in creation-time order"
        );
        let t = request.creation_timestamp.max(self.now);

        self.push_event(Event::RequestSubmitted {
            request_id: request.id,
            timestamp: t,
        });
        self.fast_forward_all(t);

        let offers: Vec<Offer<S::Loc>> = self
            .vehicles
            .par_iter()
            .map(|(&vehicle_id, vehicle)| {
                catch_unwind(AssertUnwindSafe(|| vehicle.handle_request(request)))
                    .unwrap_or_else(|_| {
                        eprintln!(
                            "WARNING: dispatcher panicked for vehicle {vehicle_id} on request {}; \
                             counting an infeasible offer",
                            request.id
                        );
                        Offer {
                            vehicle_id,
                            insertion: InsertionResult::infeasible(),
                        }
                    })
            })
            .collect();

        let best = offers
            .into_iter()
            .filter(|offer| offer.insertion.is_feasible())
            .min_by(|a, b| {
                a.cost()
                    .total_cmp(&b.cost())
                    .then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
            });

        match best {
            None => self.push_event(Event::RequestRejected {
                request_id: request.id,
                timestamp: t,
            }),
            Some(offer) => {
                self.push_event(Event::RequestOffered {
                    request_id: request.id,
                    vehicle_id: offer.vehicle_id,
                    timestamp: t,
                    payload: OfferPayload {
                        east_pu: offer.insertion.earliest_pickup_time,
                        last_pu: offer.insertion.latest_pickup_time,
                        east_do: offer.insertion.earliest_dropoff_time,
                        last_do: offer.insertion.latest_dropoff_time,
                    },
                });
                self.push_event(Event::RequestAccepted {
                    request_id: request.id,
                    vehicle_id: offer.vehicle_id,
                    timestamp: t,
                });
                self.vehicles
                    .get_mut(&offer.vehicle_id)
                    .expect("winning offer from unknown vehicle")
                    .apply_insertion(offer.insertion.new_stoplist);
            }
        }
    }

    /// Advance every vehicle to `t` and log their service events.
    pub fn fast_forward_all(&mut self, t: f64) {
        let t = t.max(self.now);
        let mut batch: Vec<Event> = Vec::new();
        for vehicle in self.vehicles.values_mut() {
            batch.extend(vehicle.fast_forward(t));
        }
        batch.sort_by(Event::chronological_cmp);
        self.events.extend(batch);
        self.now = t;
    }

    /// Drain a request stream, then fast-forward to `horizon` so remaining
    /// service events materialise. The log is re-sorted at the end because
    /// a stop serviced while waiting for its window opening carries a
    /// timestamp later than the clock position that emitted it.
    pub fn run(
        &mut self,
        requests: impl IntoIterator<Item = TransportationRequest<S::Loc>>,
        horizon: f64,
    ) {
        for request in requests {
            if request.creation_timestamp > horizon {
                break;
            }
            self.submit_request(&Arc::new(request));
        }
        self.fast_forward_all(horizon);
        self.events.sort_by(Event::chronological_cmp);
    }

    fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }
}
