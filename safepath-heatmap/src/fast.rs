//! Cheap inline scoring strategy for bulk grid sampling.
//!
//! Unlike the precise scorer this never touches a provider: each score is a
//! pure function of the coordinate and the time bucket it falls into.

use std::f64::consts::PI;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeZone, Timelike};
use geo::Coord;
use safepath_core::{CoordKey, ScoreRange, time_bucket};
use xxhash_rust::xxh3::xxh3_64_with_seed;

const BASE: f64 = 60.0;

/// Score adjustment per zone band, indexed by `hash % 5`.
const ZONE_ADJUSTMENTS: [f64; 5] = [12.0, 6.0, 0.0, -8.0, -15.0];

/// Simulated land use of a sampled point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaType {
    /// Shops, offices and transport hubs.
    Commercial,
    /// Housing.
    Residential,
    /// Parks and open land.
    Green,
    /// Warehouses and yards.
    Industrial,
}

impl AreaType {
    const fn adjustment(self, night: bool) -> f64 {
        match (self, night) {
            (Self::Commercial, false) => 8.0,
            (Self::Commercial, true) => -4.0,
            (Self::Residential, _) => 5.0,
            (Self::Green, false) => 3.0,
            (Self::Green, true) => -12.0,
            (Self::Industrial, false) => -5.0,
            (Self::Industrial, true) => -15.0,
        }
    }
}

/// Deterministic per-point heuristic used by the heatmap generator.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use geo::Coord;
/// use safepath_heatmap::FastHeuristicScore;
///
/// let scorer = FastHeuristicScore::default();
/// let at = DateTime::parse_from_rfc3339("2024-05-01T14:03:00+00:00").unwrap();
/// let later = DateTime::parse_from_rfc3339("2024-05-01T14:07:00+00:00").unwrap();
/// let point = Coord { x: -0.1276, y: 51.5072 };
/// assert_eq!(scorer.score(point, at), scorer.score(point, later));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FastHeuristicScore {
    range: ScoreRange,
    bucket: Duration,
}

impl FastHeuristicScore {
    /// Build a scorer clamping into `range`, stable within `bucket`.
    #[must_use]
    pub const fn new(range: ScoreRange, bucket: Duration) -> Self {
        Self { range, bucket }
    }

    /// Score `point` at `at`.
    #[must_use]
    pub fn score(&self, point: Coord<f64>, at: DateTime<FixedOffset>) -> f64 {
        let bucket = time_bucket(at, self.bucket);
        let start = bucket_start(at, bucket, self.bucket);
        let hour = f64::from(start.hour()) + f64::from(start.minute()) / 60.0;
        let night = !(6.0..21.0).contains(&hour);

        let key = CoordKey::from_coord(point);
        let hash = coord_hash(key);

        let time_of_day = 15.0 * ((hour - 14.0) / 24.0 * 2.0 * PI).cos();
        let zone = zone_adjustment(hash);
        let area = area_type(hash).adjustment(night);
        let lighting = if night { lighting_proxy(hash) } else { 0.0 };
        let drift = slow_drift(hash, bucket);

        self.range
            .clamp(BASE + time_of_day + zone + area + lighting + drift)
    }
}

impl Default for FastHeuristicScore {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_HEATMAP_RANGE,
            crate::config::DEFAULT_TIME_BUCKET,
        )
    }
}

fn bucket_start(at: DateTime<FixedOffset>, bucket: i64, width: Duration) -> DateTime<FixedOffset> {
    let width = i64::try_from(width.as_secs()).unwrap_or(i64::MAX).max(1);
    bucket
        .checked_mul(width)
        .and_then(|secs| at.offset().timestamp_opt(secs, 0).single())
        .unwrap_or(at)
}

fn coord_hash(key: CoordKey) -> u64 {
    xxh3_64_with_seed(&key.lat_e4().to_le_bytes(), key.lng_e4().cast_unsigned())
}

fn zone_adjustment(hash: u64) -> f64 {
    let band = usize::try_from(hash % 5).unwrap_or_default();
    ZONE_ADJUSTMENTS.get(band).copied().unwrap_or_default()
}

/// Classify the area from the higher bits of the coordinate hash.
#[must_use]
pub const fn area_type(hash: u64) -> AreaType {
    match (hash >> 8) % 10 {
        0..=2 => AreaType::Commercial,
        3..=6 => AreaType::Residential,
        7 | 8 => AreaType::Green,
        _ => AreaType::Industrial,
    }
}

/// Night-time street lighting proxy in `-10.0..=0.0`.
fn lighting_proxy(hash: u64) -> f64 {
    -unit(hash, 16) * 10.0
}

/// Gentle oscillation so neighbouring windows do not look frozen.
fn slow_drift(hash: u64, bucket: i64) -> f64 {
    let phase = unit(hash, 32) * 2.0 * PI;
    #[expect(
        clippy::cast_precision_loss,
        reason = "bucket counts stay far below 2^52"
    )]
    let t = bucket as f64;
    3.0 * (t / 12.0 + phase).sin()
}

/// Map sixteen bits of `hash`, starting at `shift`, into `0.0..=1.0`.
fn unit(hash: u64, shift: u32) -> f64 {
    let bits = u16::try_from((hash >> shift) & 0xFFFF).unwrap_or_default();
    f64::from(bits) / f64::from(u16::MAX)
}
