//! # Ridepooling Experiments
//!
//! Parameter-sweep orchestration on top of `pool_core`:
//!
//! - **Parameter sets**: serialisable run configurations and grid expansion
//! - **Demand**: seeded random request generation
//! - **Runner**: single runs and rayon-parallel sweeps with progress bars
//! - **Metrics**: service KPIs extracted from the event log
//! - **Export**: NDJSON event streams and CSV sweep summaries

pub mod demand;
pub mod export;
pub mod metrics;
pub mod parameters;
pub mod runner;
