//! Run execution: one parameter set at a time, or a rayon-parallel sweep.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use pool_core::dispatchers::{
    BruteForceDispatcher, Dispatcher, EllipseDispatcher, StopMergeDispatcher,
};
use pool_core::events::Event;
use pool_core::fleet::FleetState;
use pool_core::spaces::Euclidean2D;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::demand::UniformRequestSource;
use crate::metrics::{extract_metrics, RunMetrics};
use crate::parameters::{DispatcherKind, ParameterSet};

/// Everything one run produces: KPIs plus the raw event log.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub metrics: RunMetrics,
    pub events: Vec<Event>,
}

fn build_dispatcher(params: &ParameterSet) -> Arc<dyn Dispatcher<Euclidean2D>> {
    match params.dispatcher {
        DispatcherKind::BruteForce => Arc::new(BruteForceDispatcher::default()),
        DispatcherKind::Ellipse => Arc::new(EllipseDispatcher::new(params.max_relative_detour)),
        DispatcherKind::StopMerge => Arc::new(StopMergeDispatcher::new(params.merge_radius)),
    }
}

/// Run a single parameter set to completion.
///
/// Vehicle positions come from the same seeded RNG stream as the demand, so
/// the whole run is a pure function of the parameter set.
pub fn run_single(params: &ParameterSet) -> Result<RunArtifacts, String> {
    let space = Arc::new(Euclidean2D::new(params.velocity));
    let dispatcher = build_dispatcher(params);

    let mut rng = StdRng::seed_from_u64(params.seed);
    let half_width = params.service_area_half_width;
    let locations: Vec<(u64, (f64, f64))> = (0..params.num_vehicles)
        .map(|i| {
            (
                i as u64,
                (
                    rng.gen_range(-half_width..half_width),
                    rng.gen_range(-half_width..half_width),
                ),
            )
        })
        .collect();

    let mut fleet = FleetState::new(
        Arc::clone(&space),
        dispatcher,
        locations,
        params.seat_capacity,
    )
    .map_err(|error| format!("fleet configuration rejected: {error}"))?;

    let requests: Vec<_> =
        UniformRequestSource::new(params.seed.wrapping_add(1), half_width, params.request_rate)
            .take(params.num_requests)
            .collect();
    fleet.run(requests.clone(), params.horizon);

    let metrics = extract_metrics(
        fleet.events(),
        &requests,
        space.as_ref(),
        &params.experiment_id,
        params.run_id,
        params.seed,
    );
    Ok(RunArtifacts {
        metrics,
        events: fleet.into_events(),
    })
}

/// Run a sweep in parallel, one rayon task per parameter set, with a
/// progress bar. Results come back in input order.
pub fn run_sweep(parameter_sets: &[ParameterSet]) -> Vec<Result<RunArtifacts, String>> {
    let bar = ProgressBar::new(parameter_sets.len() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} runs",
        )
        .expect("valid progress template"),
    );

    let results: Vec<Result<RunArtifacts, String>> = parameter_sets
        .par_iter()
        .map(|params| {
            let result = run_single(params);
            bar.inc(1);
            result
        })
        .collect();

    bar.finish();
    results
}
