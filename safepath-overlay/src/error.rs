//! Errors returned by [`crate::OverlayController`].

use safepath_core::InputError;
use thiserror::Error;

/// Reasons an overlay session cannot start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OverlayError {
    /// The map has not reported a viewport yet.
    #[error("map surface has no viewport yet")]
    NoViewport,
    /// The surface reported a viewport the generator rejects.
    #[error(transparent)]
    InvalidInput(#[from] InputError),
}
