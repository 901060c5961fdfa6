//! Checkpoint placement, geometry down-sampling and step annotation.

use std::f64::consts::FRAC_1_SQRT_2;

use geo::Coord;
use safepath_core::{NEUTRAL_SCORE, ProviderStep, StepAnnotation, interpolate, offset_metres};

/// Unit (north, east) directions tried when relocating a checkpoint, in
/// order: N, S, E, W, NE, NW, SE, SW.
pub const RADIAL_DIRECTIONS: [(f64, f64); 8] = [
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    (-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
];

/// `count` evenly spaced interior points on the line from `origin` to
/// `destination`, at fractions `i / (count + 1)`.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use safepath_planner::checkpoint_positions;
///
/// let points = checkpoint_positions(Coord { x: 0.0, y: 0.0 }, Coord { x: 6.0, y: 0.0 }, 5);
/// assert_eq!(points.len(), 5);
/// assert!((points[2].x - 3.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn checkpoint_positions(
    origin: Coord<f64>,
    destination: Coord<f64>,
    count: usize,
) -> Vec<Coord<f64>> {
    let segments = count_f64(count + 1);
    (1..=count)
        .map(|i| interpolate(origin, destination, count_f64(i) / segments))
        .collect()
}

/// The eight radial alternatives around `point` at `radius_m`, in
/// [`RADIAL_DIRECTIONS`] order.
#[must_use]
pub fn radial_alternatives(point: Coord<f64>, radius_m: f64) -> [Coord<f64>; 8] {
    RADIAL_DIRECTIONS.map(|(north, east)| offset_metres(point, north * radius_m, east * radius_m))
}

/// At most `target` points from `path`, evenly spaced by index and always
/// keeping both ends. Paths already within budget are returned unchanged.
#[must_use]
pub fn downsample(path: &[Coord<f64>], target: usize) -> Vec<Coord<f64>> {
    let target = target.max(2);
    if path.len() <= target {
        return path.to_vec();
    }
    let last = path.len() - 1;
    (0..target)
        .filter_map(|i| path.get(i * last / (target - 1)).copied())
        .collect()
}

/// Map sampled scores onto steps by where each step's midpoint falls along
/// the route. Steps without usable distances are spread evenly.
#[must_use]
pub fn annotate_steps(steps: &[ProviderStep], scores: &[f64]) -> Vec<StepAnnotation> {
    let total: f64 = steps.iter().map(step_length).sum();
    let mut travelled = 0.0;
    steps
        .iter()
        .enumerate()
        .map(|(ordinal, step)| {
            let length = step_length(step);
            let fraction = if total > 0.0 {
                (travelled + length / 2.0) / total
            } else {
                (count_f64(ordinal) + 0.5) / count_f64(steps.len())
            };
            travelled += length;
            StepAnnotation {
                instruction: step.instruction.clone(),
                distance_m: step.distance_m,
                duration: step.duration,
                safety_score: score_at(scores, fraction),
            }
        })
        .collect()
}

fn step_length(step: &ProviderStep) -> f64 {
    if step.distance_m.is_finite() {
        step.distance_m.max(0.0)
    } else {
        0.0
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "fraction is clamped to the unit interval before scaling"
)]
fn score_at(scores: &[f64], fraction: f64) -> f64 {
    let last = scores.len().saturating_sub(1);
    let index = ((fraction.clamp(0.0, 1.0) * count_f64(scores.len())).floor() as usize).min(last);
    scores.get(index).copied().unwrap_or(NEUTRAL_SCORE)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "checkpoint and step counts are small"
)]
const fn count_f64(value: usize) -> f64 {
    value as f64
}

/// Arithmetic mean; `None` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / count_f64(values.len()))
}
