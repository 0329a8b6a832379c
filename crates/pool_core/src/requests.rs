//! Requests: immutable ride orders shared across stops and events.
//!
//! A transportation request is referenced by two stops (pickup and dropoff)
//! and by event records; an internal request anchors a vehicle's current
//! position element. Both are immutable after creation and shared through
//! [`Arc`], so the pickup and dropoff stop of one ride point at the same
//! allocation. Equality is by id, which is all serialisation needs.

use std::sync::Arc;

pub type RequestId = u64;
pub type VehicleId = u64;

/// A ride order: carry one passenger from `origin` to `destination`, with
/// service-time windows on both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportationRequest<L> {
    pub id: RequestId,
    pub creation_timestamp: f64,
    pub origin: L,
    pub destination: L,
    pub pickup_timewindow_min: f64,
    pub pickup_timewindow_max: f64,
    pub delivery_timewindow_min: f64,
    pub delivery_timewindow_max: f64,
}

impl<L> TransportationRequest<L> {
    /// Request with unconstrained service windows `[0, ∞)`.
    pub fn new(id: RequestId, creation_timestamp: f64, origin: L, destination: L) -> Self {
        Self {
            id,
            creation_timestamp,
            origin,
            destination,
            pickup_timewindow_min: 0.0,
            pickup_timewindow_max: f64::INFINITY,
            delivery_timewindow_min: 0.0,
            delivery_timewindow_max: f64::INFINITY,
        }
    }

    pub fn with_pickup_window(mut self, min: f64, max: f64) -> Self {
        self.pickup_timewindow_min = min;
        self.pickup_timewindow_max = max;
        self
    }

    pub fn with_delivery_window(mut self, min: f64, max: f64) -> Self {
        self.delivery_timewindow_min = min;
        self.delivery_timewindow_max = max;
        self
    }
}

/// Synthetic request anchoring a vehicle's current position element; one per
/// vehicle, alive for the whole simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct InternalRequest<L> {
    pub id: RequestId,
    pub creation_timestamp: f64,
    pub location: L,
}

impl<L> InternalRequest<L> {
    pub fn new(id: RequestId, creation_timestamp: f64, location: L) -> Self {
        Self {
            id,
            creation_timestamp,
            location,
        }
    }
}

/// Shared handle to either request kind. Cloning clones the `Arc`, not the
/// payload.
#[derive(Debug, Clone)]
pub enum Request<L> {
    Transportation(Arc<TransportationRequest<L>>),
    Internal(Arc<InternalRequest<L>>),
}

impl<L> Request<L> {
    pub fn id(&self) -> RequestId {
        match self {
            Request::Transportation(r) => r.id,
            Request::Internal(r) => r.id,
        }
    }

    pub fn creation_timestamp(&self) -> f64 {
        match self {
            Request::Transportation(r) => r.creation_timestamp,
            Request::Internal(r) => r.creation_timestamp,
        }
    }

    pub fn as_transportation(&self) -> Option<&Arc<TransportationRequest<L>>> {
        match self {
            Request::Transportation(r) => Some(r),
            Request::Internal(_) => None,
        }
    }
}

impl<L> PartialEq for Request<L> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
