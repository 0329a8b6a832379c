//! # Ridepooling Dispatch Core
//!
//! A simulation core for on-demand ridepooling: a fleet of capacitated
//! vehicles serves a stream of transportation requests by inserting pickup
//! and dropoff stops into per-vehicle itineraries.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Transport spaces**: Euclidean/Manhattan planes, an integer grid, and
//!   a weighted graph with cached Dijkstra, all behind one trait
//! - **Stoplists**: per-vehicle service plans with cached arrival times,
//!   occupancies, and service-time windows
//! - **Dispatchers**: pluggable minimum-cost insertion strategies
//! - **Vehicle and fleet state**: fast-forward semantics, parallel offer
//!   fan-out, deterministic arbitration, and a totally ordered event log
//! - **Export**: Parquet analytics tables derived from the event log
//!
//! ## Key Concepts
//!
//! - **Drive-first**: vehicles drive to each stop as fast as possible and
//!   wait there if they are early
//! - **CPE**: every stoplist starts with the current position element, the
//!   anchor for all time and position updates
//! - **Deterministic**: tie-breaks are fixed (first-discovered insertion,
//!   lowest vehicle id), so runs reproduce exactly
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pool_core::dispatchers::BruteForceDispatcher;
//! use pool_core::fleet::FleetState;
//! use pool_core::requests::TransportationRequest;
//! use pool_core::spaces::Manhattan2D;
//!
//! let space = Arc::new(Manhattan2D::new(1.0));
//! let dispatcher = Arc::new(BruteForceDispatcher::default());
//! let mut fleet = FleetState::new(space, dispatcher, [(0, (0.0, 0.0))], 4)
//!     .expect("valid configuration");
//! let requests = vec![TransportationRequest::new(1, 0.0, (0.0, 1.0), (0.0, 2.0))];
//! fleet.run(requests, 100.0);
//! ```

pub mod dispatchers;
pub mod events;
pub mod export;
pub mod fleet;
pub mod requests;
pub mod spaces;
pub mod stops;
pub mod vehicle;

#[cfg(test)]
pub mod test_helpers;
