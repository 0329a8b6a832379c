//! Parquet export: analytics tables reconstructed from the event log.
//!
//! Two tables cover what downstream analysis needs:
//!
//! - **stops**: one row per serviced stop, with occupancy, inter-stop
//!   distances and times, and the submission timestamp of the ride served
//! - **requests**: one row per submitted request with its lifecycle
//!   timestamps and derived waiting/ride times
//!
//! Both are written in Arrow/Parquet format for direct consumption by
//! Pandas, Polars, and friends.

mod requests;
mod stops;
mod utils;

pub use requests::write_requests_parquet;
pub use stops::write_stops_parquet;
