//! Run configurations and parameter-space expansion.
//!
//! A [`ParameterSet`] fully determines one simulation run (including its
//! seed, so runs reproduce exactly). A [`ParameterSpace`] lists the values
//! to vary; [`ParameterSpace::expand`] produces the grid of parameter sets
//! for a sweep.

use serde::{Deserialize, Serialize};

/// Which dispatcher a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DispatcherKind {
    #[default]
    BruteForce,
    Ellipse,
    StopMerge,
}

/// Parameters of a single simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSet {
    pub experiment_id: String,
    pub run_id: usize,
    /// RNG seed for vehicle placement and demand (for reproducibility).
    pub seed: u64,
    pub num_vehicles: usize,
    pub seat_capacity: i32,
    pub num_requests: usize,
    /// Mean request arrivals per time unit.
    pub request_rate: f64,
    pub velocity: f64,
    pub dispatcher: DispatcherKind,
    /// Relative leg detour allowed by the ellipse dispatcher.
    pub max_relative_detour: f64,
    /// Snap radius of the stop-merge dispatcher.
    pub merge_radius: f64,
    /// Simulation end time; pending stops are serviced up to here.
    pub horizon: f64,
    /// Half-width of the square service area centred on the origin.
    pub service_area_half_width: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            experiment_id: "default".to_string(),
            run_id: 0,
            seed: 42,
            num_vehicles: 10,
            seat_capacity: 4,
            num_requests: 100,
            request_rate: 1.0,
            velocity: 1.0,
            dispatcher: DispatcherKind::BruteForce,
            max_relative_detour: 0.5,
            merge_radius: 0.0,
            horizon: 1_000.0,
            service_area_half_width: 10.0,
        }
    }
}

impl ParameterSet {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_fleet(mut self, num_vehicles: usize, seat_capacity: i32) -> Self {
        self.num_vehicles = num_vehicles;
        self.seat_capacity = seat_capacity;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: DispatcherKind) -> Self {
        self.dispatcher = dispatcher;
        self
    }
}

/// Values to vary in a sweep. Empty vectors fall back to the base value.
#[derive(Debug, Clone, Default)]
pub struct ParameterSpace {
    pub base: ParameterSet,
    pub num_vehicles: Vec<usize>,
    pub seat_capacities: Vec<i32>,
    pub request_rates: Vec<f64>,
    pub dispatchers: Vec<DispatcherKind>,
    pub seeds: Vec<u64>,
}

impl ParameterSpace {
    /// Full cross product of all variations, with run ids assigned in grid
    /// order.
    pub fn expand(&self) -> Vec<ParameterSet> {
        let num_vehicles = fallback(&self.num_vehicles, self.base.num_vehicles);
        let seat_capacities = fallback(&self.seat_capacities, self.base.seat_capacity);
        let request_rates = fallback(&self.request_rates, self.base.request_rate);
        let dispatchers = fallback(&self.dispatchers, self.base.dispatcher);
        let seeds = fallback(&self.seeds, self.base.seed);

        let mut sets = Vec::new();
        for &vehicles in &num_vehicles {
            for &capacity in &seat_capacities {
                for &rate in &request_rates {
                    for &dispatcher in &dispatchers {
                        for &seed in &seeds {
                            let mut set = self.base.clone();
                            set.run_id = sets.len();
                            set.num_vehicles = vehicles;
                            set.seat_capacity = capacity;
                            set.request_rate = rate;
                            set.dispatcher = dispatcher;
                            set.seed = seed;
                            sets.push(set);
                        }
                    }
                }
            }
        }
        sets
    }
}

fn fallback<T: Copy>(values: &[T], base: T) -> Vec<T> {
    if values.is_empty() {
        vec![base]
    } else {
        values.to_vec()
    }
}
