//! Service KPIs of one run: acceptance, waiting/ride times, detour factors.
//!
//! Everything comes out of the event log except the detour factor, which
//! needs the request set and the space to recompute each ride's direct
//! origin-to-destination travel time.

use std::collections::HashMap;

use pool_core::events::Event;
use pool_core::requests::{RequestId, TransportationRequest};
use pool_core::spaces::TransportSpace;
use serde::Serialize;

/// Aggregated metrics of one simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics {
    pub experiment_id: String,
    pub run_id: usize,
    pub seed: u64,
    /// Requests submitted during the run.
    pub total_requests: usize,
    /// Requests a vehicle committed to.
    pub accepted: usize,
    /// Requests infeasible on every vehicle.
    pub rejected: usize,
    /// accepted / (accepted + rejected).
    pub acceptance_rate: f64,
    /// Passengers delivered by the horizon.
    pub delivered: usize,
    pub avg_waiting_time: f64,
    pub median_waiting_time: f64,
    pub p90_waiting_time: f64,
    pub avg_ride_time: f64,
    pub median_ride_time: f64,
    pub p90_ride_time: f64,
    /// Ride time over direct travel time; 1.0 means no pooling detour.
    /// Zero-length rides are excluded.
    pub avg_detour_factor: f64,
    pub median_detour_factor: f64,
    pub p90_detour_factor: f64,
}

/// (average, median, 90th percentile) of the values; zeros when empty.
fn stats(values: &mut Vec<f64>) -> (f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    values.sort_by(f64::total_cmp);
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    let median = values[values.len() / 2];
    let p90 = values[(values.len() * 9 / 10).min(values.len() - 1)];
    (avg, median, p90)
}

pub fn extract_metrics<S: TransportSpace>(
    events: &[Event],
    requests: &[TransportationRequest<S::Loc>],
    space: &S,
    experiment_id: &str,
    run_id: usize,
    seed: u64,
) -> RunMetrics {
    let direct_times: HashMap<RequestId, f64> = requests
        .iter()
        .map(|request| (request.id, space.t(request.origin, request.destination)))
        .collect();

    let mut submitted: HashMap<RequestId, f64> = HashMap::new();
    let mut picked_up: HashMap<RequestId, f64> = HashMap::new();
    let mut accepted = 0usize;
    let mut rejected = 0usize;
    let mut waiting_times = Vec::new();
    let mut ride_times = Vec::new();
    let mut detour_factors = Vec::new();

    for event in events {
        match event {
            Event::RequestSubmitted {
                request_id,
                timestamp,
            } => {
                submitted.insert(*request_id, *timestamp);
            }
            Event::RequestAccepted { .. } => accepted += 1,
            Event::RequestRejected { .. } => rejected += 1,
            Event::Pickup {
                request_id,
                timestamp,
                ..
            } => {
                picked_up.insert(*request_id, *timestamp);
                if let Some(submission) = submitted.get(request_id) {
                    waiting_times.push(timestamp - submission);
                }
            }
            Event::Delivery {
                request_id,
                timestamp,
                ..
            } => {
                if let Some(pickup) = picked_up.get(request_id) {
                    let ride_time = timestamp - pickup;
                    ride_times.push(ride_time);
                    if let Some(&direct) = direct_times.get(request_id) {
                        if direct > 0.0 && direct.is_finite() {
                            detour_factors.push(ride_time / direct);
                        }
                    }
                }
            }
            Event::RequestOffered { .. } | Event::Internal { .. } => {}
        }
    }

    let delivered = ride_times.len();
    let resolved = accepted + rejected;
    let acceptance_rate = if resolved == 0 {
        0.0
    } else {
        accepted as f64 / resolved as f64
    };
    let (avg_waiting_time, median_waiting_time, p90_waiting_time) = stats(&mut waiting_times);
    let (avg_ride_time, median_ride_time, p90_ride_time) = stats(&mut ride_times);
    let (avg_detour_factor, median_detour_factor, p90_detour_factor) =
        stats(&mut detour_factors);

    RunMetrics {
        experiment_id: experiment_id.to_string(),
        run_id,
        seed,
        total_requests: submitted.len(),
        accepted,
        rejected,
        acceptance_rate,
        delivered,
        avg_waiting_time,
        median_waiting_time,
        p90_waiting_time,
        avg_ride_time,
        median_ride_time,
        p90_ride_time,
        avg_detour_factor,
        median_detour_factor,
        p90_detour_factor,
    }
}
