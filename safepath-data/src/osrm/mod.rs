//! OSRM-backed routing.
//!
//! [`OsrmRoutingProvider`] implements [`safepath_core::RoutingProvider`]
//! with OSRM's Route service for point-to-point requests and its Trip
//! service when waypoints may be reordered.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use geo::Coord;
//! use safepath_core::{DirectionsRequest, RoutingProvider, TravelMode};
//! use safepath_data::{OsrmRoutingProvider, OsrmRoutingProviderConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OsrmRoutingProvider::with_config(
//!     OsrmRoutingProviderConfig::new("http://localhost:5000")
//!         .with_timeout(Duration::from_secs(10)),
//! )?;
//! let request = DirectionsRequest::direct(
//!     Coord { x: -0.1276, y: 51.5072 },
//!     Coord { x: -0.0899, y: 51.5136 },
//!     TravelMode::Walking,
//! );
//! let routes = provider.directions(&request).await?;
//! println!("{} routes", routes.len());
//! # Ok(())
//! # }
//! ```

mod polyline;
mod provider;
mod response;

pub use polyline::decode_polyline;
pub use provider::{OsrmRoutingProvider, OsrmRoutingProviderConfig, profile_for};
