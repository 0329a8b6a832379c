//! Shared insertion machinery: arrival-time propagation, feasibility checks,
//! the exhaustive minimum-cost search, and the commit path.
//!
//! Everything here assumes the drive-first policy: a vehicle departs a stop
//! at `max(arrival, window_min)`. Waiting therefore absorbs delay, which is
//! what lets both the feasibility walk and the commit propagation stop early
//! once a delay has shrunk to zero.

use std::sync::Arc;

use crate::requests::{Request, TransportationRequest};
use crate::spaces::TransportSpace;
use crate::stops::{Stop, StopAction, Stoplist};

use super::brute_force::CostKind;
use super::InsertionResult;

/// Arrival time at a stop inserted right after `stop_before`.
pub(crate) fn cpat_of_inserted_stop<L: crate::spaces::Loc>(
    stop_before: &Stop<L>,
    travel_time_from_there: f64,
) -> f64 {
    stop_before.estimated_departure_time() + travel_time_from_there
}

/// Travel time from a location inserted after `idx` to the following stop;
/// zero at the tail.
pub(crate) fn time_to_stop_after<S: TransportSpace>(
    stoplist: &[Stop<S::Loc>],
    location: S::Loc,
    idx: usize,
    space: &S,
) -> f64 {
    if idx + 1 < stoplist.len() {
        space.t(location, stoplist[idx + 1].location)
    } else {
        0.0
    }
}

/// Cost of one leg under the configured cost kind.
fn leg_cost<S: TransportSpace>(cost: CostKind, space: &S, u: S::Loc, v: S::Loc) -> f64 {
    match cost {
        CostKind::TotalTravelTime => space.t(u, v),
        CostKind::AbsoluteDetour => space.d(u, v),
    }
}

/// Cost from a location inserted after `idx` to the following stop; zero at
/// the tail.
fn cost_to_stop_after<S: TransportSpace>(
    cost: CostKind,
    stoplist: &[Stop<S::Loc>],
    location: S::Loc,
    idx: usize,
    space: &S,
) -> f64 {
    if idx + 1 < stoplist.len() {
        leg_cost(cost, space, location, stoplist[idx + 1].location)
    } else {
        0.0
    }
}

/// Cost of the existing leg from stop `idx` to its successor; zero at the
/// tail.
fn cost_from_stop_to_next<S: TransportSpace>(
    cost: CostKind,
    stoplist: &[Stop<S::Loc>],
    idx: usize,
    space: &S,
) -> f64 {
    if idx + 1 < stoplist.len() {
        leg_cost(cost, space, stoplist[idx].location, stoplist[idx + 1].location)
    } else {
        0.0
    }
}

/// Would raising the arrival at `stoplist[idx + 1]` to `new_arrival_at_next`
/// push any later stop past its window?
///
/// Walks forward carrying the arrival delay. A stop that was going to wait
/// for its window opening absorbs the delay; once the carried delay reaches
/// zero no later stop can be affected. A stop whose window was already
/// violated does not fail the check unless the insertion worsens it.
pub(crate) fn timewindows_violated_by_insertion<L: crate::spaces::Loc>(
    stoplist: &[Stop<L>],
    idx: usize,
    new_arrival_at_next: f64,
) -> bool {
    if idx + 1 >= stoplist.len() {
        return false;
    }
    let mut delta_cpat = new_arrival_at_next - stoplist[idx + 1].estimated_arrival_time;
    for stop in &stoplist[idx + 1..] {
        let old_leeway = stop.time_window_max - stop.estimated_arrival_time;
        let new_leeway = old_leeway - delta_cpat;
        if new_leeway < 0.0 && new_leeway < old_leeway {
            return true;
        }
        let old_departure = stop.estimated_departure_time();
        let new_departure = stop
            .time_window_min
            .max(stop.estimated_arrival_time + delta_cpat);
        delta_cpat = new_departure - old_departure;
        if delta_cpat <= 0.0 {
            return false;
        }
    }
    false
}

/// Insert `stop` after index `idx` and repropagate the arrival times of all
/// later stops with the drive-first recurrence.
pub(crate) fn insert_stop_into_stoplist<S: TransportSpace>(
    stoplist: &mut Stoplist<S::Loc>,
    mut stop: Stop<S::Loc>,
    idx: usize,
    space: &S,
) {
    let stop_before = &stoplist[idx];
    stop.estimated_arrival_time =
        cpat_of_inserted_stop(stop_before, space.t(stop_before.location, stop.location));
    if idx + 1 < stoplist.len() {
        let arrival_at_next =
            stop.estimated_departure_time() + space.t(stop.location, stoplist[idx + 1].location);
        let mut delta_cpat = arrival_at_next - stoplist[idx + 1].estimated_arrival_time;
        for later in &mut stoplist[idx + 1..] {
            let old_departure = later.estimated_departure_time();
            later.estimated_arrival_time += delta_cpat;
            let new_departure = later.estimated_departure_time();
            delta_cpat = new_departure - old_departure;
            if delta_cpat == 0.0 {
                break;
            }
        }
    }
    stoplist.insert(idx + 1, stop);
}

/// Build the committed stoplist for a `(pickup_idx, dropoff_idx)` insertion:
/// clone, insert the pickup after `pickup_idx`, bump the occupancy of every
/// stop riding between pickup and dropoff, then insert the dropoff after the
/// (now shifted) `dropoff_idx`.
pub fn insert_request_into_stoplist<S: TransportSpace>(
    stoplist: &[Stop<S::Loc>],
    request: &Arc<TransportationRequest<S::Loc>>,
    pickup_idx: usize,
    dropoff_idx: usize,
    space: &S,
) -> Stoplist<S::Loc> {
    let mut new_stoplist = stoplist.to_vec();

    let pickup_stop = Stop {
        location: request.origin,
        request: Request::Transportation(Arc::clone(request)),
        action: StopAction::Pickup,
        estimated_arrival_time: 0.0, // set on insertion
        occupancy_after_servicing: new_stoplist[pickup_idx].occupancy_after_servicing + 1,
        time_window_min: request.pickup_timewindow_min,
        time_window_max: request.pickup_timewindow_max,
    };
    for stop in &mut new_stoplist[pickup_idx + 1..=dropoff_idx] {
        stop.occupancy_after_servicing += 1;
    }
    insert_stop_into_stoplist(&mut new_stoplist, pickup_stop, pickup_idx, space);

    let dropoff_idx_shifted = dropoff_idx + 1;
    let dropoff_stop = Stop {
        location: request.destination,
        request: Request::Transportation(Arc::clone(request)),
        action: StopAction::Dropoff,
        estimated_arrival_time: 0.0, // set on insertion
        occupancy_after_servicing: new_stoplist[dropoff_idx_shifted].occupancy_after_servicing - 1,
        time_window_min: request.delivery_timewindow_min,
        time_window_max: request.delivery_timewindow_max,
    };
    insert_stop_into_stoplist(&mut new_stoplist, dropoff_stop, dropoff_idx_shifted, space);

    new_stoplist
}

/// Exhaustive minimum-cost search over all `(i, j)` insertion pairs.
///
/// `max_relative_detour` enables the ellipse prune: insertion points whose
/// leg detour exceeds `(1 + max_relative_detour)` times the direct leg are
/// skipped before any time-window work. `None` searches everything.
///
/// Iteration is `i` ascending then `j` ascending with strict `<` on cost, so
/// the first-discovered minimum wins ties deterministically.
pub(crate) fn minimum_cost_insertion<S: TransportSpace>(
    request: &Arc<TransportationRequest<S::Loc>>,
    stoplist: &[Stop<S::Loc>],
    space: &S,
    seat_capacity: i32,
    cost: CostKind,
    max_relative_detour: Option<f64>,
    debug: bool,
) -> InsertionResult<S::Loc> {
    let n = stoplist.len();
    let mut min_cost = f64::INFINITY;
    let mut best: Option<(usize, usize)> = None;

    for i in 0..n {
        let stop_before_pickup = &stoplist[i];
        // A full vehicle cannot pick up right after this stop.
        if stop_before_pickup.occupancy_after_servicing >= seat_capacity {
            continue;
        }
        if let Some(mrd) = max_relative_detour {
            if i + 1 < n {
                let direct = space.d(stop_before_pickup.location, stoplist[i + 1].location);
                let via = space.d(stop_before_pickup.location, request.origin)
                    + space.d(request.origin, stoplist[i + 1].location);
                if via > (1.0 + mrd) * direct {
                    continue;
                }
            }
        }

        let time_to_pickup = space.t(stop_before_pickup.location, request.origin);
        let cpat_pu = cpat_of_inserted_stop(stop_before_pickup, time_to_pickup);
        if cpat_pu > request.pickup_timewindow_max {
            continue;
        }
        let departure_pu = cpat_pu.max(request.pickup_timewindow_min);

        // Branch 1: dropoff directly after the pickup.
        let cpat_do = departure_pu + space.t(request.origin, request.destination);
        if cpat_do <= request.delivery_timewindow_max {
            let total_cost = leg_cost(cost, space, stop_before_pickup.location, request.origin)
                + leg_cost(cost, space, request.origin, request.destination)
                + cost_to_stop_after(cost, stoplist, request.destination, i, space)
                - cost_from_stop_to_next(cost, stoplist, i, space);
            if total_cost < min_cost {
                let departure_do = cpat_do.max(request.delivery_timewindow_min);
                let arrival_after_do =
                    departure_do + time_to_stop_after(stoplist, request.destination, i, space);
                if !timewindows_violated_by_insertion(stoplist, i, arrival_after_do) {
                    if debug {
                        eprintln!("insertion ({i}, {i}) improves cost to {total_cost}");
                    }
                    min_cost = total_cost;
                    best = Some((i, i));
                }
            }
        }

        // Branch 2: dropoff after a later stop. The pickup alone must
        // already leave every later window intact.
        let arrival_after_pu =
            departure_pu + time_to_stop_after(stoplist, request.origin, i, space);
        if timewindows_violated_by_insertion(stoplist, i, arrival_after_pu) {
            continue;
        }
        if i + 1 >= n {
            continue;
        }
        let pickup_cost = leg_cost(cost, space, stop_before_pickup.location, request.origin)
            + cost_to_stop_after(cost, stoplist, request.origin, i, space)
            - cost_from_stop_to_next(cost, stoplist, i, space);

        // Arrival delay carried from the pickup insertion, updated stop by
        // stop under drive-first absorption.
        let mut delta_cpat = arrival_after_pu - stoplist[i + 1].estimated_arrival_time;
        for j in i + 1..n {
            let stop_before_dropoff = &stoplist[j];
            // The passenger is on board over [pickup, dropoff]; a full stop
            // here stays full at every later j too.
            if stop_before_dropoff.occupancy_after_servicing >= seat_capacity {
                break;
            }

            let cpat_j = stop_before_dropoff.estimated_arrival_time + delta_cpat;
            let departure_j = cpat_j.max(stop_before_dropoff.time_window_min);
            let cpat_do = departure_j + space.t(stop_before_dropoff.location, request.destination);
            delta_cpat = departure_j - stop_before_dropoff.estimated_departure_time();

            if let Some(mrd) = max_relative_detour {
                if j + 1 < n {
                    let direct = space.d(stop_before_dropoff.location, stoplist[j + 1].location);
                    let via = space.d(stop_before_dropoff.location, request.destination)
                        + space.d(request.destination, stoplist[j + 1].location);
                    if via > (1.0 + mrd) * direct {
                        continue;
                    }
                }
            }
            if cpat_do > request.delivery_timewindow_max {
                continue;
            }

            let total_cost = pickup_cost
                + leg_cost(cost, space, stop_before_dropoff.location, request.destination)
                + cost_to_stop_after(cost, stoplist, request.destination, j, space)
                - cost_from_stop_to_next(cost, stoplist, j, space);
            if total_cost < min_cost {
                let departure_do = cpat_do.max(request.delivery_timewindow_min);
                let arrival_after_do =
                    departure_do + time_to_stop_after(stoplist, request.destination, j, space);
                if !timewindows_violated_by_insertion(stoplist, j, arrival_after_do) {
                    if debug {
                        eprintln!("insertion ({i}, {j}) improves cost to {total_cost}");
                    }
                    min_cost = total_cost;
                    best = Some((i, j));
                }
            }
        }
    }

    match best {
        Some((pickup_idx, dropoff_idx)) => {
            let new_stoplist =
                insert_request_into_stoplist(stoplist, request, pickup_idx, dropoff_idx, space);
            InsertionResult {
                new_stoplist,
                min_cost,
                earliest_pickup_time: request.pickup_timewindow_min,
                latest_pickup_time: request.pickup_timewindow_max,
                earliest_dropoff_time: request.delivery_timewindow_min,
                latest_dropoff_time: request.delivery_timewindow_max,
            }
        }
        None => InsertionResult::infeasible(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::InternalRequest;
    use crate::spaces::{Manhattan2D, R2loc};

    fn cpe(location: R2loc) -> Stop<R2loc> {
        Stop {
            location,
            request: Request::Internal(Arc::new(InternalRequest::new(0, 0.0, location))),
            action: StopAction::Internal,
            estimated_arrival_time: 0.0,
            occupancy_after_servicing: 0,
            time_window_min: 0.0,
            time_window_max: f64::INFINITY,
        }
    }

    fn planned_stop(
        request: &Arc<TransportationRequest<R2loc>>,
        location: R2loc,
        action: StopAction,
        arrival: f64,
        occupancy: i32,
        window: (f64, f64),
    ) -> Stop<R2loc> {
        Stop {
            location,
            request: Request::Transportation(Arc::clone(request)),
            action,
            estimated_arrival_time: arrival,
            occupancy_after_servicing: occupancy,
            time_window_min: window.0,
            time_window_max: window.1,
        }
    }

    #[test]
    fn propagation_passes_when_wait_absorbs_delay() {
        let request = Arc::new(TransportationRequest::new(1, 0.0, (0.0, 0.0), (4.0, 0.0)));
        // Arrival 2.0 but window opens at 5.0: up to 3 units of delay vanish
        // in the wait.
        let stoplist = vec![
            cpe((0.0, 0.0)),
            planned_stop(
                &request,
                (2.0, 0.0),
                StopAction::Pickup,
                2.0,
                1,
                (5.0, 10.0),
            ),
            planned_stop(
                &request,
                (4.0, 0.0),
                StopAction::Dropoff,
                7.0,
                0,
                (0.0, 8.0),
            ),
        ];
        assert!(!timewindows_violated_by_insertion(&stoplist, 0, 4.5));
        assert!(timewindows_violated_by_insertion(&stoplist, 0, 12.0));
    }

    #[test]
    fn propagation_detects_downstream_violation() {
        let request = Arc::new(TransportationRequest::new(1, 0.0, (0.0, 0.0), (4.0, 0.0)));
        let stoplist = vec![
            cpe((0.0, 0.0)),
            planned_stop(
                &request,
                (2.0, 0.0),
                StopAction::Pickup,
                2.0,
                1,
                (0.0, f64::INFINITY),
            ),
            planned_stop(
                &request,
                (4.0, 0.0),
                StopAction::Dropoff,
                4.0,
                0,
                (0.0, 5.0),
            ),
        ];
        // One unit of delay at the pickup flows through to the dropoff,
        // which still fits; two units push it past its window.
        assert!(!timewindows_violated_by_insertion(&stoplist, 0, 3.0));
        assert!(timewindows_violated_by_insertion(&stoplist, 0, 4.5));
    }

    #[test]
    fn inserted_stop_propagates_arrival_times() {
        let space = Manhattan2D::new(1.0);
        let request = Arc::new(TransportationRequest::new(1, 0.0, (1.0, 0.0), (3.0, 0.0)));
        let mut stoplist = vec![
            cpe((0.0, 0.0)),
            planned_stop(
                &request,
                (2.0, 0.0),
                StopAction::Pickup,
                2.0,
                1,
                (0.0, f64::INFINITY),
            ),
        ];
        let detour = Stop {
            location: (1.0, 1.0),
            request: stoplist[0].request.clone(),
            action: StopAction::Internal,
            estimated_arrival_time: 0.0,
            occupancy_after_servicing: 0,
            time_window_min: 0.0,
            time_window_max: f64::INFINITY,
        };
        insert_stop_into_stoplist(&mut stoplist, detour, 0, &space);
        assert_eq!(stoplist.len(), 3);
        assert_eq!(stoplist[1].estimated_arrival_time, 2.0);
        // Old leg was 2.0; the detour via (1, 1) makes it 2 + 2 = 4.
        assert_eq!(stoplist[2].estimated_arrival_time, 4.0);
    }

    #[test]
    fn commit_bumps_occupancy_between_pickup_and_dropoff() {
        let space = Manhattan2D::new(1.0);
        let onboard = Arc::new(TransportationRequest::new(1, 0.0, (0.0, 0.0), (6.0, 0.0)));
        let stoplist = vec![
            cpe((0.0, 0.0)),
            planned_stop(
                &onboard,
                (2.0, 0.0),
                StopAction::Pickup,
                2.0,
                1,
                (0.0, f64::INFINITY),
            ),
            planned_stop(
                &onboard,
                (6.0, 0.0),
                StopAction::Dropoff,
                6.0,
                0,
                (0.0, f64::INFINITY),
            ),
        ];
        let request = Arc::new(TransportationRequest::new(2, 0.0, (3.0, 0.0), (5.0, 0.0)));
        let new_stoplist = insert_request_into_stoplist(&stoplist, &request, 1, 2, &space);

        let actions: Vec<StopAction> = new_stoplist.iter().map(|s| s.action).collect();
        assert_eq!(
            actions,
            vec![
                StopAction::Internal,
                StopAction::Pickup,
                StopAction::Pickup,
                StopAction::Dropoff,
                StopAction::Dropoff,
            ]
        );
        let occupancies: Vec<i32> = new_stoplist
            .iter()
            .map(|s| s.occupancy_after_servicing)
            .collect();
        assert_eq!(occupancies, vec![0, 1, 2, 1, 0]);
        // Both stops of the new ride share one request allocation.
        assert_eq!(new_stoplist[2].request_id(), 2);
        assert_eq!(new_stoplist[4].request_id(), 2);
        crate::stops::assert_stoplist_invariants(&new_stoplist, 2);
    }
}
