//! Local conditions at a point, from the provider where it reported them and
//! from a deterministic estimate otherwise.

use chrono::{DateTime, FixedOffset, Timelike};
use geo::Coord;
use safepath_core::{AreaFactors, CoordKey, LightingQuality, WeatherCondition};
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Fully resolved conditions used by the factor formulas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalConditions {
    /// Street lighting.
    pub lighting: LightingQuality,
    /// Weather.
    pub weather: WeatherCondition,
    /// Population density percentile.
    pub population_density: f64,
    /// Share of open businesses.
    pub business_activity: f64,
    /// Public transport availability.
    pub transit_access: f64,
    /// Emergency response time in minutes.
    pub emergency_response_minutes: f64,
    /// Historical crime percentile; higher is worse.
    pub crime_rate: f64,
    /// Community engagement level.
    pub community_engagement: f64,
    /// Signed current-events impact; positive is safer.
    pub current_events: f64,
    /// Traffic flow level.
    pub traffic_flow: f64,
    /// Crowd density level.
    pub crowd_density: f64,
}

impl LocalConditions {
    /// Estimate conditions from the coordinate and local time alone.
    ///
    /// The same rounded coordinate at the same hour always yields the same
    /// estimate.
    #[must_use]
    pub fn estimate(point: Coord<f64>, at: DateTime<FixedOffset>) -> Self {
        let key = CoordKey::from_coord(point);
        let seed = xxh3_64_with_seed(
            &key.lat_e4().to_le_bytes(),
            u64::from_le_bytes(key.lng_e4().to_le_bytes()),
        );
        let hour = at.hour();
        let daytime = is_daytime(hour);

        let population_density = 100.0 * unit(seed, 0);
        let opening = if (8..=21).contains(&hour) { 1.0 } else { 0.3 };
        let rush = if matches!(hour, 7..=9 | 16..=19) { 1.4 } else { 0.8 };

        Self {
            lighting: estimate_lighting(unit(seed, 16), daytime),
            weather: WeatherCondition::Clear,
            population_density,
            business_activity: (100.0 * unit(seed, 32) * opening).min(100.0),
            transit_access: 100.0 * unit(seed, 48),
            emergency_response_minutes: 3.0 + 12.0 * unit(seed.rotate_left(8), 0),
            crime_rate: 100.0 * unit(seed.rotate_left(8), 16),
            community_engagement: 100.0 * unit(seed.rotate_left(8), 32),
            current_events: 0.0,
            traffic_flow: (100.0 * unit(seed.rotate_left(8), 48) * rush).min(100.0),
            crowd_density: (population_density * opening * rush).min(100.0),
        }
    }

    /// Replace estimated values with any the provider reported.
    #[must_use]
    pub fn overlay(mut self, reported: &AreaFactors) -> Self {
        if let Some(lighting) = reported.lighting {
            self.lighting = lighting;
        }
        if let Some(weather) = reported.weather {
            self.weather = weather;
        }
        let numeric = [
            (&mut self.population_density, reported.population_density),
            (&mut self.business_activity, reported.business_activity),
            (&mut self.transit_access, reported.transit_access),
            (
                &mut self.emergency_response_minutes,
                reported.emergency_response_minutes,
            ),
            (&mut self.crime_rate, reported.crime_rate),
            (&mut self.community_engagement, reported.community_engagement),
            (&mut self.current_events, reported.current_events),
            (&mut self.traffic_flow, reported.traffic_flow),
            (&mut self.crowd_density, reported.crowd_density),
        ];
        for (slot, value) in numeric {
            if let Some(value) = value.filter(|v| v.is_finite()) {
                *slot = value;
            }
        }
        self
    }
}

/// Hours between 07:00 and 19:59 count as daytime.
#[must_use]
pub const fn is_daytime(hour: u32) -> bool {
    hour >= 7 && hour < 20
}

/// Hours between 22:00 and 05:59 count as night.
#[must_use]
pub const fn is_night(hour: u32) -> bool {
    hour >= 22 || hour < 6
}

fn estimate_lighting(draw: f64, daytime: bool) -> LightingQuality {
    if daytime {
        return if draw < 0.5 {
            LightingQuality::Excellent
        } else {
            LightingQuality::Good
        };
    }
    match draw {
        d if d < 0.25 => LightingQuality::Good,
        d if d < 0.6 => LightingQuality::Moderate,
        d if d < 0.85 => LightingQuality::Poor,
        _ => LightingQuality::VeryPoor,
    }
}

/// Sixteen bits of `seed` starting at `shift`, mapped onto `0.0..=1.0`.
fn unit(seed: u64, shift: u32) -> f64 {
    let bits = u16::try_from((seed >> shift) & 0xFFFF).unwrap_or(u16::MAX);
    f64::from(bits) / f64::from(u16::MAX)
}
