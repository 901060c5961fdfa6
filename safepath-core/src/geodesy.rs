//! Coordinate validation, viewport bounds and great-circle helpers.
//!
//! Coordinates follow the `geo` convention: `x` is longitude and `y` is
//! latitude, both in decimal degrees.

use geo::{Coord, Rect};

use crate::InputError;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Approximate length of one degree of latitude in metres.
pub const METRES_PER_DEGREE_LAT: f64 = 111_320.0;

/// Reject coordinates that are not finite or fall outside WGS84 ranges.
///
/// # Errors
///
/// Returns [`InputError`] describing the first problem found.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use safepath_core::validate_coord;
///
/// assert!(validate_coord(Coord { x: -0.1276, y: 51.5072 }).is_ok());
/// assert!(validate_coord(Coord { x: 0.0, y: 95.0 }).is_err());
/// ```
pub fn validate_coord(coord: Coord<f64>) -> Result<(), InputError> {
    if !coord.x.is_finite() || !coord.y.is_finite() {
        return Err(InputError::NonFiniteCoordinate {
            x: coord.x,
            y: coord.y,
        });
    }
    if !(-90.0..=90.0).contains(&coord.y) {
        return Err(InputError::LatitudeOutOfRange { lat: coord.y });
    }
    if !(-180.0..=180.0).contains(&coord.x) {
        return Err(InputError::LongitudeOutOfRange { lng: coord.x });
    }
    Ok(())
}

/// Great-circle distance between two coordinates in metres (haversine).
#[must_use]
pub fn great_circle_distance(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let lat1 = from.y.to_radians();
    let lat2 = to.y.to_radians();
    let d_lat = (to.y - from.y).to_radians();
    let d_lng = (to.x - from.x).to_radians();
    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Linear interpolation between two coordinates; `fraction` of `0.0` yields
/// `from` and `1.0` yields `to`.
///
/// Over the distances a single walk or drive covers, the straight line in
/// degree space is close enough to the geodesic for checkpoint sampling.
#[must_use]
pub fn interpolate(from: Coord<f64>, to: Coord<f64>, fraction: f64) -> Coord<f64> {
    Coord {
        x: from.x + (to.x - from.x) * fraction,
        y: from.y + (to.y - from.y) * fraction,
    }
}

/// Move `origin` by `north_m` metres northwards and `east_m` metres
/// eastwards using a local flat-earth approximation.
#[must_use]
pub fn offset_metres(origin: Coord<f64>, north_m: f64, east_m: f64) -> Coord<f64> {
    let d_lat = north_m / METRES_PER_DEGREE_LAT;
    let cos_lat = origin.y.to_radians().cos().max(1.0e-6);
    let d_lng = east_m / (METRES_PER_DEGREE_LAT * cos_lat);
    Coord {
        x: origin.x + d_lng,
        y: (origin.y + d_lat).clamp(-90.0, 90.0),
    }
}

/// A validated map viewport.
///
/// Unlike [`Rect`], which silently normalises its corners, `Bounds` rejects
/// inverted or zero-area boxes so malformed viewports fail fast. Viewports
/// spanning the antimeridian are not supported.
///
/// # Examples
///
/// ```
/// use safepath_core::Bounds;
///
/// let bounds = Bounds::new(51.52, 51.50, -0.10, -0.14)?;
/// assert!(bounds.height_deg() > 0.0);
/// assert!(Bounds::new(51.50, 51.52, -0.10, -0.14).is_err());
/// # Ok::<(), safepath_core::InputError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Bounds {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
}

impl Bounds {
    /// Validate and construct bounds from their four edges.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidBounds`] when the box is inverted or
    /// empty, and a coordinate error when an edge is out of range.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, InputError> {
        validate_coord(Coord { x: west, y: south })?;
        validate_coord(Coord { x: east, y: north })?;
        if north <= south || east <= west {
            return Err(InputError::InvalidBounds {
                north,
                south,
                east,
                west,
            });
        }
        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }

    /// Build bounds from a `geo` rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] when the rectangle is degenerate or out of range.
    pub fn from_rect(rect: Rect<f64>) -> Result<Self, InputError> {
        Self::new(rect.max().y, rect.min().y, rect.max().x, rect.min().x)
    }

    /// Northern edge latitude.
    #[must_use]
    pub const fn north(&self) -> f64 {
        self.north
    }

    /// Southern edge latitude.
    #[must_use]
    pub const fn south(&self) -> f64 {
        self.south
    }

    /// Eastern edge longitude.
    #[must_use]
    pub const fn east(&self) -> f64 {
        self.east
    }

    /// Western edge longitude.
    #[must_use]
    pub const fn west(&self) -> f64 {
        self.west
    }

    /// Latitude span in degrees.
    #[must_use]
    pub fn height_deg(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude span in degrees.
    #[must_use]
    pub fn width_deg(&self) -> f64 {
        self.east - self.west
    }

    /// Geometric centre of the box.
    #[must_use]
    pub fn center(&self) -> Coord<f64> {
        Coord {
            x: (self.east + self.west) / 2.0,
            y: (self.north + self.south) / 2.0,
        }
    }

    /// Width over height measured in metres at the box's centre latitude.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        let width_m = self.width_m();
        let height_m = self.height_deg() * METRES_PER_DEGREE_LAT;
        if height_m <= 0.0 {
            return 1.0;
        }
        width_m / height_m
    }

    /// Approximate covered area in square kilometres.
    #[must_use]
    pub fn area_km2(&self) -> f64 {
        let height_m = self.height_deg() * METRES_PER_DEGREE_LAT;
        self.width_m() * height_m / 1.0e6
    }

    /// Distance from the centre to a corner in metres.
    #[must_use]
    pub fn radius_m(&self) -> f64 {
        great_circle_distance(
            self.center(),
            Coord {
                x: self.east,
                y: self.north,
            },
        )
    }

    /// Report whether `coord` lies inside the box, edges included.
    #[must_use]
    pub fn contains(&self, coord: Coord<f64>) -> bool {
        (self.south..=self.north).contains(&coord.y) && (self.west..=self.east).contains(&coord.x)
    }

    /// Grow the box by `fraction` of its size on every side.
    #[must_use]
    pub fn expanded(&self, fraction: f64) -> Self {
        let d_lat = self.height_deg() * fraction;
        let d_lng = self.width_deg() * fraction;
        Self {
            north: (self.north + d_lat).min(90.0),
            south: (self.south - d_lat).max(-90.0),
            east: (self.east + d_lng).min(180.0),
            west: (self.west - d_lng).max(-180.0),
        }
    }

    /// Convert into a `geo` rectangle.
    #[must_use]
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.west,
                y: self.south,
            },
            Coord {
                x: self.east,
                y: self.north,
            },
        )
    }

    fn width_m(&self) -> f64 {
        let cos_lat = self.center().y.to_radians().cos();
        self.width_deg() * METRES_PER_DEGREE_LAT * cos_lat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        let delta = (actual - expected).abs();
        assert!(
            delta <= tolerance,
            "expected {expected}, got {actual} (|Δ| = {delta})"
        );
    }

    #[rstest]
    #[case(Coord { x: f64::NAN, y: 0.0 })]
    #[case(Coord { x: 0.0, y: f64::INFINITY })]
    #[case(Coord { x: 0.0, y: -90.5 })]
    #[case(Coord { x: 180.5, y: 0.0 })]
    fn rejects_invalid_coordinates(#[case] coord: Coord<f64>) {
        assert!(validate_coord(coord).is_err());
    }

    #[rstest]
    fn one_degree_of_latitude_is_about_111_km() {
        let distance = great_circle_distance(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 1.0 });
        assert_close(distance, 111_195.0, 50.0);
    }

    #[rstest]
    fn distance_is_zero_for_same_point() {
        let point = Coord { x: 2.35, y: 48.85 };
        assert_close(great_circle_distance(point, point), 0.0, 1.0e-9);
    }

    #[rstest]
    fn offset_moves_north_by_requested_metres() {
        let origin = Coord { x: -0.12, y: 51.5 };
        let moved = offset_metres(origin, 200.0, 0.0);
        assert_close(great_circle_distance(origin, moved), 200.0, 1.5);
        assert!(moved.y > origin.y);
    }

    #[rstest]
    fn interpolate_hits_midpoint() {
        let mid = interpolate(Coord { x: 0.0, y: 0.0 }, Coord { x: 2.0, y: 4.0 }, 0.5);
        assert_eq!(mid, Coord { x: 1.0, y: 2.0 });
    }

    #[rstest]
    #[case(51.5, 51.5, 0.1, 0.0)]
    #[case(51.4, 51.5, 0.1, 0.0)]
    #[case(51.5, 51.4, 0.0, 0.1)]
    fn bounds_reject_inverted_or_empty_boxes(
        #[case] north: f64,
        #[case] south: f64,
        #[case] east: f64,
        #[case] west: f64,
    ) {
        let err = Bounds::new(north, south, east, west).expect_err("bounds must be rejected");
        assert!(matches!(err, InputError::InvalidBounds { .. }));
    }

    #[rstest]
    fn bounds_report_geometry() {
        let bounds = Bounds::new(1.0, 0.0, 1.0, 0.0).expect("valid bounds");
        assert_eq!(bounds.center(), Coord { x: 0.5, y: 0.5 });
        assert!(bounds.contains(Coord { x: 1.0, y: 0.0 }));
        assert!(!bounds.contains(Coord { x: 1.1, y: 0.5 }));
        assert_close(bounds.aspect_ratio(), 1.0, 0.01);
        assert!(bounds.area_km2() > 12_000.0);
    }

    #[rstest]
    fn bounds_round_trip_through_rect() {
        let bounds = Bounds::new(51.52, 51.50, -0.10, -0.14).expect("valid bounds");
        let again = Bounds::from_rect(bounds.to_rect()).expect("rect is valid");
        assert_eq!(bounds, again);
    }
}
