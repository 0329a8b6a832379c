//! Simulation events: the append-only record stream a fleet run produces.
//!
//! Events serialise with a `kind` tag plus `timestamp`, `request_id` and
//! `vehicle_id` fields, so the stream can be written as newline-delimited
//! records. The log is totally ordered by `(timestamp, kind, vehicle_id,
//! request_id)`; the kind tiebreak follows the enum declaration order.

use std::cmp::Ordering;

use serde::Serialize;

use crate::requests::{RequestId, VehicleId};

/// Service-window bounds quoted to a requester with an offer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OfferPayload {
    /// Earliest allowed pickup service time.
    pub east_pu: f64,
    /// Latest allowed pickup service time.
    pub last_pu: f64,
    /// Earliest allowed dropoff service time.
    pub east_do: f64,
    /// Latest allowed dropoff service time.
    pub last_do: f64,
}

/// Declaration order doubles as the same-timestamp tiebreak order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Pickup {
        vehicle_id: VehicleId,
        request_id: RequestId,
        timestamp: f64,
    },
    Delivery {
        vehicle_id: VehicleId,
        request_id: RequestId,
        timestamp: f64,
    },
    Internal {
        vehicle_id: VehicleId,
        request_id: RequestId,
        timestamp: f64,
    },
    RequestSubmitted {
        request_id: RequestId,
        timestamp: f64,
    },
    RequestOffered {
        request_id: RequestId,
        vehicle_id: VehicleId,
        timestamp: f64,
        payload: OfferPayload,
    },
    RequestAccepted {
        request_id: RequestId,
        vehicle_id: VehicleId,
        timestamp: f64,
    },
    RequestRejected {
        request_id: RequestId,
        timestamp: f64,
    },
}

impl Event {
    pub fn timestamp(&self) -> f64 {
        match self {
            Event::Pickup { timestamp, .. }
            | Event::Delivery { timestamp, .. }
            | Event::Internal { timestamp, .. }
            | Event::RequestSubmitted { timestamp, .. }
            | Event::RequestOffered { timestamp, .. }
            | Event::RequestAccepted { timestamp, .. }
            | Event::RequestRejected { timestamp, .. } => *timestamp,
        }
    }

    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            Event::Pickup { request_id, .. }
            | Event::Delivery { request_id, .. }
            | Event::Internal { request_id, .. }
            | Event::RequestSubmitted { request_id, .. }
            | Event::RequestOffered { request_id, .. }
            | Event::RequestAccepted { request_id, .. }
            | Event::RequestRejected { request_id, .. } => Some(*request_id),
        }
    }

    pub fn vehicle_id(&self) -> Option<VehicleId> {
        match self {
            Event::Pickup { vehicle_id, .. }
            | Event::Delivery { vehicle_id, .. }
            | Event::Internal { vehicle_id, .. }
            | Event::RequestOffered { vehicle_id, .. }
            | Event::RequestAccepted { vehicle_id, .. } => Some(*vehicle_id),
            Event::RequestSubmitted { .. } | Event::RequestRejected { .. } => None,
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Event::Pickup { .. } => 0,
            Event::Delivery { .. } => 1,
            Event::Internal { .. } => 2,
            Event::RequestSubmitted { .. } => 3,
            Event::RequestOffered { .. } => 4,
            Event::RequestAccepted { .. } => 5,
            Event::RequestRejected { .. } => 6,
        }
    }

    /// Total chronological order of the event log.
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        self.timestamp()
            .total_cmp(&other.timestamp())
            .then_with(|| self.kind_rank().cmp(&other.kind_rank()))
            .then_with(|| self.vehicle_id().cmp(&other.vehicle_id()))
            .then_with(|| self.request_id().cmp(&other.request_id()))
    }
}
