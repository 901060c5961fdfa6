//! Traits for the external collaborators the engine consults.
//!
//! Every collaborator call may fail with [`crate::ProviderError`]; the
//! services recover from those failures locally.

mod flags;
mod reputation;
mod routing;

pub use flags::{FeatureFlags, StaticFeatureFlags};
pub use reputation::{
    AreaFactors, AreaReport, LightingQuality, ReputationProvider, UnavailableReputationProvider,
    WeatherCondition,
};
pub use routing::{DirectionsRequest, ProviderRoute, ProviderStep, RoutingProvider};
