//! Choosing between candidate routes.

use safepath_core::RouteCandidate;

/// Report whether `challenger` should replace `incumbent`.
///
/// When safety is preferred and the average scores differ by more than
/// `margin`, the safer route wins. Otherwise the shorter route wins, with
/// ties kept by the incumbent.
#[must_use]
pub fn challenger_wins(
    incumbent: &RouteCandidate,
    challenger: &RouteCandidate,
    margin: f64,
    prefer_safe: bool,
) -> bool {
    let gap = challenger.average_safety_score - incumbent.average_safety_score;
    if prefer_safe && gap.abs() > margin {
        return gap > 0.0;
    }
    challenger.total_distance_m < incumbent.total_distance_m
}

/// Fold `candidates` pairwise with [`challenger_wins`], in order.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use safepath_core::{RouteCandidate, RouteSource};
/// use safepath_planner::select_best;
///
/// let candidate = |safety: f64, distance: f64| RouteCandidate {
///     path: Vec::new(),
///     total_distance_m: distance,
///     total_duration: Duration::ZERO,
///     average_safety_score: safety,
///     danger_zones_avoided: 0,
///     danger_point_count: 0,
///     steps: Vec::new(),
///     source: RouteSource::Direct,
/// };
/// let best = select_best(vec![candidate(80.0, 5000.0), candidate(65.0, 3000.0)], 10.0, true)
///     .expect("non-empty");
/// assert_eq!(best.average_safety_score, 80.0);
/// ```
#[must_use]
pub fn select_best(
    candidates: Vec<RouteCandidate>,
    margin: f64,
    prefer_safe: bool,
) -> Option<RouteCandidate> {
    candidates.into_iter().reduce(|best, next| {
        if challenger_wins(&best, &next, margin, prefer_safe) {
            next
        } else {
            best
        }
    })
}
