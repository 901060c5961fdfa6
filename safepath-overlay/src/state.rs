//! Observable state of an overlay session.

use chrono::{DateTime, FixedOffset};
use safepath_core::{Bounds, HeatmapPoint};

/// What a host UI needs to render the overlay toggle and legend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlaySessionState {
    /// The user has switched the overlay on.
    pub is_enabled: bool,
    /// A generation is in flight.
    pub is_loading: bool,
    /// A layer is attached to the map.
    pub is_active: bool,
    /// Points in the attached layer.
    pub point_count: usize,
    /// Human-readable summary of what the layer covers.
    pub coverage_description: String,
    /// Mean score of the attached points.
    pub average_safety: Option<f64>,
    /// Most recent score time among the attached points.
    pub last_update: Option<DateTime<FixedOffset>>,
}

impl OverlaySessionState {
    /// Copy the summary of `points` over `bounds` into this state.
    pub(crate) fn summarise(&mut self, points: &[HeatmapPoint], bounds: &Bounds) {
        self.point_count = points.len();
        self.coverage_description = coverage_description(points.len(), bounds);
        self.average_safety = (!points.is_empty()).then(|| {
            #[expect(
                clippy::cast_precision_loss,
                reason = "layers hold at most a few hundred points"
            )]
            let count = points.len() as f64;
            points.iter().map(|p| p.safety_score).sum::<f64>() / count
        });
        self.last_update = points.iter().map(|p| p.last_update).max();
    }
}

/// `"42 points across 3.1 km²"`.
#[must_use]
pub fn coverage_description(point_count: usize, bounds: &Bounds) -> String {
    let noun = if point_count == 1 { "point" } else { "points" };
    format!("{point_count} {noun} across {:.1} km²", bounds.area_km2())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use geo::Coord;
    use rstest::rstest;

    fn bounds() -> Bounds {
        Bounds::new(51.52, 51.50, -0.10, -0.14).expect("valid bounds")
    }

    #[rstest]
    fn empty_layers_have_no_average() {
        let mut state = OverlaySessionState::default();
        state.summarise(&[], &bounds());
        assert_eq!(state.point_count, 0);
        assert!(state.average_safety.is_none());
        assert!(state.last_update.is_none());
        assert!(state.coverage_description.starts_with("0 points across"));
    }

    #[rstest]
    fn summary_tracks_mean_and_latest_update() {
        let early = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").expect("timestamp");
        let late = DateTime::parse_from_rfc3339("2024-05-01T10:02:00Z").expect("timestamp");
        let point = Coord { x: -0.12, y: 51.51 };
        let points = [
            HeatmapPoint::new(point, 40.0, 14.0, early),
            HeatmapPoint::new(point, 80.0, 14.0, late),
        ];
        let mut state = OverlaySessionState::default();
        state.summarise(&points, &bounds());
        assert_eq!(state.point_count, 2);
        assert_eq!(state.average_safety, Some(60.0));
        assert_eq!(state.last_update, Some(late));
    }
}
