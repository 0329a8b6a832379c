use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float64Array, UInt64Array};

use crate::events::Event;
use crate::requests::{RequestId, TransportationRequest, VehicleId};
use crate::spaces::TransportSpace;

use super::utils::{write_columns, Column};

#[derive(Default, Clone, Copy)]
pub(super) struct RequestLifecycle {
    pub(super) submitted: Option<f64>,
    pub(super) accepted: Option<f64>,
    pub(super) rejected: Option<f64>,
    pub(super) picked_up: Option<f64>,
    pub(super) delivered: Option<f64>,
    pub(super) vehicle_id: Option<VehicleId>,
}

pub(super) fn request_lifecycles(events: &[Event]) -> HashMap<RequestId, RequestLifecycle> {
    let mut lifecycles: HashMap<RequestId, RequestLifecycle> = HashMap::new();
    for event in events {
        match event {
            Event::RequestSubmitted {
                request_id,
                timestamp,
            } => lifecycles.entry(*request_id).or_default().submitted = Some(*timestamp),
            Event::RequestAccepted {
                request_id,
                vehicle_id,
                timestamp,
            } => {
                let entry = lifecycles.entry(*request_id).or_default();
                entry.accepted = Some(*timestamp);
                entry.vehicle_id = Some(*vehicle_id);
            }
            Event::RequestRejected {
                request_id,
                timestamp,
            } => lifecycles.entry(*request_id).or_default().rejected = Some(*timestamp),
            Event::Pickup {
                request_id,
                timestamp,
                ..
            } => lifecycles.entry(*request_id).or_default().picked_up = Some(*timestamp),
            Event::Delivery {
                request_id,
                timestamp,
                ..
            } => lifecycles.entry(*request_id).or_default().delivered = Some(*timestamp),
            Event::RequestOffered { .. } | Event::Internal { .. } => {}
        }
    }
    lifecycles
}

/// Write the requests table: lifecycle timestamps plus the direct
/// origin-to-destination distance and travel time of each ride.
pub fn write_requests_parquet<P: AsRef<Path>, S: TransportSpace>(
    path: P,
    events: &[Event],
    requests: &[Arc<TransportationRequest<S::Loc>>],
    space: &S,
) -> Result<(), Box<dyn Error>> {
    let lifecycles = request_lifecycles(events);

    let mut request_ids = Vec::with_capacity(requests.len());
    let mut submitted = Vec::with_capacity(requests.len());
    let mut accepted: Vec<Option<f64>> = Vec::with_capacity(requests.len());
    let mut rejected: Vec<Option<f64>> = Vec::with_capacity(requests.len());
    let mut picked_up: Vec<Option<f64>> = Vec::with_capacity(requests.len());
    let mut delivered: Vec<Option<f64>> = Vec::with_capacity(requests.len());
    let mut vehicle_ids: Vec<Option<u64>> = Vec::with_capacity(requests.len());
    let mut direct_distances = Vec::with_capacity(requests.len());
    let mut direct_times = Vec::with_capacity(requests.len());
    let mut waiting_times: Vec<Option<f64>> = Vec::with_capacity(requests.len());
    let mut ride_times: Vec<Option<f64>> = Vec::with_capacity(requests.len());

    for request in requests {
        let lifecycle = lifecycles.get(&request.id).copied().unwrap_or_default();
        request_ids.push(request.id);
        submitted.push(lifecycle.submitted.unwrap_or(request.creation_timestamp));
        accepted.push(lifecycle.accepted);
        rejected.push(lifecycle.rejected);
        picked_up.push(lifecycle.picked_up);
        delivered.push(lifecycle.delivered);
        vehicle_ids.push(lifecycle.vehicle_id);
        direct_distances.push(space.d(request.origin, request.destination));
        direct_times.push(space.t(request.origin, request.destination));
        waiting_times.push(match (lifecycle.picked_up, lifecycle.submitted) {
            (Some(pickup), Some(submission)) => Some(pickup - submission),
            _ => None,
        });
        ride_times.push(match (lifecycle.delivered, lifecycle.picked_up) {
            (Some(delivery), Some(pickup)) => Some(delivery - pickup),
            _ => None,
        });
    }

    write_columns(
        path,
        vec![
            Column::new("request_id", UInt64Array::from(request_ids)),
            Column::new("timestamp_submitted", Float64Array::from(submitted)),
            Column::nullable("timestamp_accepted", Float64Array::from(accepted)),
            Column::nullable("timestamp_rejected", Float64Array::from(rejected)),
            Column::nullable("timestamp_pickup", Float64Array::from(picked_up)),
            Column::nullable("timestamp_dropoff", Float64Array::from(delivered)),
            Column::nullable("vehicle_id", UInt64Array::from(vehicle_ids)),
            Column::new(
                "direct_travel_distance",
                Float64Array::from(direct_distances),
            ),
            Column::new("direct_travel_time", Float64Array::from(direct_times)),
            Column::nullable("waiting_time", Float64Array::from(waiting_times)),
            Column::nullable("ride_time", Float64Array::from(ride_times)),
        ],
    )
}
