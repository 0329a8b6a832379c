//! Run serialisation: NDJSON event streams and CSV sweep summaries.

use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use pool_core::events::Event;

use crate::metrics::RunMetrics;

/// Write the event log as newline-delimited JSON, one record per event,
/// each tagged with its `kind` plus `timestamp` / `request_id` /
/// `vehicle_id` fields.
pub fn write_events_ndjson<P: AsRef<Path>>(
    path: P,
    events: &[Event],
) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for event in events {
        serde_json::to_writer(&mut writer, event)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write sweep metrics as one CSV row per run.
pub fn write_metrics_csv<P: AsRef<Path>>(
    path: P,
    metrics: &[RunMetrics],
) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in metrics {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
