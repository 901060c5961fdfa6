//! HTTP area reputation service.
//!
//! [`HttpReputationProvider`] implements
//! [`safepath_core::ReputationProvider`] by fetching
//! `GET {base}/v1/area?lat={lat}&lng={lng}` and decoding the body as a
//! [`safepath_core::AreaReport`].

mod provider;

pub use provider::{HttpReputationProvider, HttpReputationProviderConfig};
