//! OSRM Route and Trip response types.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use std::time::Duration;

use safepath_core::{ProviderError, ProviderRoute, ProviderStep};
use serde::Deserialize;

use super::polyline::decode_polyline;

/// Route or Trip service response.
///
/// The Route service returns `routes`; the Trip service returns `trips`
/// with the same shape.
#[derive(Debug, Deserialize)]
pub(crate) struct RouteResponse {
    /// Status code, `"Ok"` on success.
    pub code: String,
    /// Error message when `code` is not `"Ok"`.
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
    #[serde(default)]
    pub trips: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmRoute {
    /// Polyline5-encoded overview geometry.
    #[serde(default)]
    pub geometry: String,
    /// Metres.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    #[serde(default)]
    pub legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmLeg {
    #[serde(default)]
    pub steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmStep {
    /// Street name, empty when unnamed.
    #[serde(default)]
    pub name: String,
    pub distance: f64,
    pub duration: f64,
    pub maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmManeuver {
    #[serde(rename = "type")]
    pub kind: String,
    pub modifier: Option<String>,
}

impl RouteResponse {
    /// Convert into provider routes, best first.
    pub(crate) fn into_routes(self) -> Result<Vec<ProviderRoute>, ProviderError> {
        if self.code != "Ok" {
            return Err(ProviderError::ServiceError {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }
        self.routes
            .into_iter()
            .chain(self.trips)
            .map(OsrmRoute::into_provider_route)
            .collect()
    }
}

impl OsrmRoute {
    fn into_provider_route(self) -> Result<ProviderRoute, ProviderError> {
        Ok(ProviderRoute {
            geometry: decode_polyline(&self.geometry)?,
            distance_m: non_negative(self.distance),
            duration: seconds(self.duration),
            steps: self
                .legs
                .into_iter()
                .flat_map(|leg| leg.steps)
                .map(OsrmStep::into_provider_step)
                .collect(),
        })
    }
}

impl OsrmStep {
    fn into_provider_step(self) -> ProviderStep {
        ProviderStep {
            instruction: instruction(&self.maneuver, &self.name),
            distance_m: non_negative(self.distance),
            duration: seconds(self.duration),
            maneuver: Some(self.maneuver.kind),
        }
    }
}

/// Human-readable text for a manoeuvre, e.g. `"Turn left onto Fleet Street"`.
fn instruction(maneuver: &OsrmManeuver, street: &str) -> String {
    let action = match (maneuver.kind.as_str(), maneuver.modifier.as_deref()) {
        ("arrive", _) => return "Arrive at your destination".to_owned(),
        ("depart", _) => "Head out".to_owned(),
        ("new name" | "continue", _) => "Continue".to_owned(),
        ("roundabout" | "rotary", _) => "Enter the roundabout".to_owned(),
        (kind, Some(modifier)) => format!("{} {modifier}", capitalise(kind)),
        (kind, None) => capitalise(kind),
    };
    if street.is_empty() {
        action
    } else {
        format!("{action} onto {street}")
    }
}

fn capitalise(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(non_negative(value)).unwrap_or(Duration::MAX)
}
