use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float64Array, Int32Array, UInt64Array};

use crate::events::Event;
use crate::requests::{RequestId, TransportationRequest, VehicleId};
use crate::spaces::TransportSpace;

use super::utils::{write_columns, Column};

/// One serviced stop, reconstructed from the event log.
pub(super) struct StopRow<L> {
    vehicle_id: VehicleId,
    stop_id: u64,
    timestamp: f64,
    delta_occupancy: i32,
    request_id: RequestId,
    state_duration: f64,
    occupancy: i32,
    location: Option<L>,
    timestamp_submitted: Option<f64>,
}

/// Group the service events per vehicle and derive per-stop occupancy and
/// dwell durations. Assumes the log is chronologically sorted.
pub(super) fn stop_rows<L: crate::spaces::Loc>(
    events: &[Event],
    requests: &HashMap<RequestId, Arc<TransportationRequest<L>>>,
) -> Vec<StopRow<L>> {
    let submitted: HashMap<RequestId, f64> = events
        .iter()
        .filter_map(|event| match event {
            Event::RequestSubmitted {
                request_id,
                timestamp,
            } => Some((*request_id, *timestamp)),
            _ => None,
        })
        .collect();

    let mut per_vehicle: HashMap<VehicleId, Vec<StopRow<L>>> = HashMap::new();
    for event in events {
        let (vehicle_id, request_id, timestamp, delta, location) = match event {
            Event::Pickup {
                vehicle_id,
                request_id,
                timestamp,
            } => (
                *vehicle_id,
                *request_id,
                *timestamp,
                1,
                requests.get(request_id).map(|r| r.origin),
            ),
            Event::Delivery {
                vehicle_id,
                request_id,
                timestamp,
            } => (
                *vehicle_id,
                *request_id,
                *timestamp,
                -1,
                requests.get(request_id).map(|r| r.destination),
            ),
            Event::Internal {
                vehicle_id,
                request_id,
                timestamp,
            } => (*vehicle_id, *request_id, *timestamp, 0, None),
            _ => continue,
        };
        let rows = per_vehicle.entry(vehicle_id).or_default();
        let occupancy = rows.last().map_or(0, |row| row.occupancy) + delta;
        rows.push(StopRow {
            vehicle_id,
            stop_id: rows.len() as u64,
            timestamp,
            delta_occupancy: delta,
            request_id,
            state_duration: 0.0,
            occupancy,
            location,
            timestamp_submitted: submitted.get(&request_id).copied(),
        });
    }

    let mut vehicle_ids: Vec<VehicleId> = per_vehicle.keys().copied().collect();
    vehicle_ids.sort_unstable();

    let mut rows = Vec::new();
    for vehicle_id in vehicle_ids {
        let mut vehicle_rows = per_vehicle.remove(&vehicle_id).expect("grouped rows");
        for i in 0..vehicle_rows.len().saturating_sub(1) {
            vehicle_rows[i].state_duration =
                vehicle_rows[i + 1].timestamp - vehicle_rows[i].timestamp;
        }
        rows.extend(vehicle_rows);
    }
    rows
}

/// Write the stops table. `requests` supplies the stop locations used for
/// the `dist_to_next` / `time_to_next` columns; legs around stops with
/// unknown locations (internal stops) come out null.
pub fn write_stops_parquet<P: AsRef<Path>, S: TransportSpace>(
    path: P,
    events: &[Event],
    requests: &HashMap<RequestId, Arc<TransportationRequest<S::Loc>>>,
    space: &S,
) -> Result<(), Box<dyn Error>> {
    let rows = stop_rows(events, requests);

    let mut vehicle_ids = Vec::with_capacity(rows.len());
    let mut stop_ids = Vec::with_capacity(rows.len());
    let mut timestamps = Vec::with_capacity(rows.len());
    let mut delta_occupancies = Vec::with_capacity(rows.len());
    let mut request_ids = Vec::with_capacity(rows.len());
    let mut state_durations = Vec::with_capacity(rows.len());
    let mut occupancies = Vec::with_capacity(rows.len());
    let mut dist_to_next: Vec<Option<f64>> = Vec::with_capacity(rows.len());
    let mut time_to_next: Vec<Option<f64>> = Vec::with_capacity(rows.len());
    let mut timestamps_submitted: Vec<Option<f64>> = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        vehicle_ids.push(row.vehicle_id);
        stop_ids.push(row.stop_id);
        timestamps.push(row.timestamp);
        delta_occupancies.push(row.delta_occupancy);
        request_ids.push(row.request_id);
        state_durations.push(row.state_duration);
        occupancies.push(row.occupancy);
        timestamps_submitted.push(row.timestamp_submitted);

        let next = rows
            .get(i + 1)
            .filter(|next| next.vehicle_id == row.vehicle_id);
        let leg = match (row.location, next.and_then(|next| next.location)) {
            (Some(from), Some(to)) => Some((space.d(from, to), space.t(from, to))),
            _ => None,
        };
        dist_to_next.push(leg.map(|(d, _)| d));
        time_to_next.push(leg.map(|(_, t)| t));
    }

    write_columns(
        path,
        vec![
            Column::new("vehicle_id", UInt64Array::from(vehicle_ids)),
            Column::new("stop_id", UInt64Array::from(stop_ids)),
            Column::new("timestamp", Float64Array::from(timestamps)),
            Column::new("delta_occupancy", Int32Array::from(delta_occupancies)),
            Column::new("request_id", UInt64Array::from(request_ids)),
            Column::new("state_duration", Float64Array::from(state_durations)),
            Column::new("occupancy", Int32Array::from(occupancies)),
            Column::nullable("dist_to_next", Float64Array::from(dist_to_next)),
            Column::nullable("time_to_next", Float64Array::from(time_to_next)),
            Column::nullable(
                "timestamp_submitted",
                Float64Array::from(timestamps_submitted),
            ),
        ],
    )
}
