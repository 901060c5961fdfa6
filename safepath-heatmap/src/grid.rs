//! Zoom-dependent grid resolution and jittered sampling.

use geo::Coord;
use rand::Rng;
use safepath_core::{Bounds, METRES_PER_DEGREE_LAT, PerformanceTier};

use crate::config::PREVIEW_POINT_CAP;

/// Point budget and minimum spacing for a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Maximum number of points.
    pub points: usize,
    /// Minimum distance between neighbouring cell centres, in metres.
    pub min_spacing_m: f64,
}

impl Resolution {
    /// Resolution for a zoom level.
    ///
    /// | zoom   | points | spacing |
    /// |--------|--------|---------|
    /// | ≥ 18   | 80     | 50 m    |
    /// | ≥ 16   | 60     | 100 m   |
    /// | ≥ 14   | 45     | 200 m   |
    /// | ≥ 12   | 35     | 400 m   |
    /// | below  | 25     | 800 m   |
    #[must_use]
    pub fn for_zoom(zoom: f64) -> Self {
        let (points, min_spacing_m) = if zoom >= 18.0 {
            (80, 50.0)
        } else if zoom >= 16.0 {
            (60, 100.0)
        } else if zoom >= 14.0 {
            (45, 200.0)
        } else if zoom >= 12.0 {
            (35, 400.0)
        } else {
            (25, 800.0)
        };
        Self {
            points,
            min_spacing_m,
        }
    }

    /// Coarser variant for a fast first paint: half the points, never more
    /// than [`PREVIEW_POINT_CAP`], at twice the spacing.
    #[must_use]
    pub fn preview(self) -> Self {
        Self {
            points: (self.points / 2).clamp(1, PREVIEW_POINT_CAP),
            min_spacing_m: self.min_spacing_m * 2.0,
        }
    }

    /// Variant scaled for a device tier.
    #[must_use]
    pub fn adapted(self, tier: PerformanceTier) -> Self {
        Self {
            points: scale_count(self.points, tier.point_multiplier()),
            min_spacing_m: self.min_spacing_m * tier.spacing_multiplier(),
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "point budgets are small positive counts"
)]
fn scale_count(count: usize, factor: f64) -> usize {
    ((count as f64) * factor).round().max(1.0) as usize
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is finite, floored and clamped to at least one"
)]
fn floor_count(value: f64) -> usize {
    if value.is_finite() {
        value.floor().max(1.0) as usize
    } else {
        1
    }
}

/// Rows and columns for a grid over `bounds` that follows the box's aspect
/// ratio, stays within the point budget and respects the minimum spacing.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    reason = "point budgets are small positive counts"
)]
pub fn grid_shape(bounds: &Bounds, resolution: Resolution) -> (usize, usize) {
    let budget = resolution.points.max(1);
    let aspect = bounds.aspect_ratio().max(f64::MIN_POSITIVE);
    let height_m = bounds.height_deg() * METRES_PER_DEGREE_LAT;
    let width_m = height_m * aspect;
    let spacing = resolution.min_spacing_m.max(1.0);

    let max_rows = floor_count(height_m / spacing);
    let max_cols = floor_count(width_m / spacing);

    let rows = floor_count(((budget as f64) / aspect).sqrt())
        .min(budget)
        .min(max_rows);
    let cols = (budget / rows).max(1).min(max_cols);
    (rows, cols)
}

/// Cell centres of a `rows × cols` grid over `bounds`, each displaced by up
/// to `jitter_fraction` of the cell size along each axis.
///
/// With a fraction below one half every point stays inside its cell and so
/// inside `bounds`.
pub fn sample_points<R: Rng>(
    bounds: &Bounds,
    rows: usize,
    cols: usize,
    jitter_fraction: f64,
    rng: &mut R,
) -> Vec<Coord<f64>> {
    let cell_lat = bounds.height_deg() / count_f64(rows);
    let cell_lng = bounds.width_deg() / count_f64(cols);
    let mut jitter = |cell: f64| (rng.r#gen::<f64>() * 2.0 - 1.0) * jitter_fraction * cell;

    let mut points = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let lat = bounds.south() + (count_f64(row) + 0.5) * cell_lat + jitter(cell_lat);
            let lng = bounds.west() + (count_f64(col) + 0.5) * cell_lng + jitter(cell_lng);
            points.push(Coord { x: lng, y: lat });
        }
    }
    points
}

#[expect(
    clippy::cast_precision_loss,
    reason = "grid indices are far below 2^52"
)]
const fn count_f64(value: usize) -> f64 {
    value as f64
}
