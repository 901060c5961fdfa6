//! HTTP adapters for the SafePath engine's collaborators.
//!
//! Responsibilities:
//! - Implement [`safepath_core::RoutingProvider`] against an OSRM service.
//! - Implement [`safepath_core::ReputationProvider`] against a JSON area
//!   reputation service.
//! - Map transport failures onto [`safepath_core::ProviderError`].
//!
//! Boundaries:
//! - Do not encode scoring or ranking rules (live in the service crates).
//! - Stay async end to end; callers own the runtime.
//!
//! Invariants:
//! - Every request is bounded by the configured timeout.
//! - No global mutable state.

mod error;
mod http;
pub mod osrm;
pub mod reputation;

pub use error::ProviderBuildError;
pub use http::DEFAULT_USER_AGENT;
pub use osrm::{OsrmRoutingProvider, OsrmRoutingProviderConfig};
pub use reputation::{HttpReputationProvider, HttpReputationProviderConfig};
