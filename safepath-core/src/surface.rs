//! The map surface a risk overlay is drawn onto.
//!
//! Rendering is out of scope; the engine only needs to read the viewport,
//! hear about viewport changes, and push weighted points into a layer.

use std::sync::Arc;

use geo::Coord;

use crate::Bounds;

/// Visible region of the map.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Viewport {
    /// Visible bounds.
    pub bounds: Bounds,
    /// Map zoom level.
    pub zoom: f64,
}

/// A coordinate with a visualisation weight.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightedPoint {
    /// Location.
    pub point: Coord<f64>,
    /// Weight in `0.1..=1.0`.
    pub weight: f64,
}

/// A weighted-point heat layer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeatmapLayer {
    /// Points to draw.
    pub points: Vec<WeightedPoint>,
    /// Blur radius in screen pixels.
    pub radius_px: u32,
    /// Layer opacity in `0.0..=1.0`.
    pub opacity: f64,
}

/// Identifies an attached layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// Identifies a registered viewport listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Callback invoked after the viewport settles.
pub type ViewportListener = Arc<dyn Fn(&Viewport) + Send + Sync>;

/// A live map the overlay draws onto.
pub trait MapSurface: Send + Sync {
    /// Current viewport, or `None` before the map has laid out.
    fn viewport(&self) -> Option<Viewport>;

    /// Add `layer` and return its identifier.
    fn attach_layer(&self, layer: HeatmapLayer) -> LayerId;

    /// Remove a layer. Unknown identifiers are ignored.
    fn detach_layer(&self, id: LayerId);

    /// Replace the points of an attached layer without re-creating it.
    fn update_layer_data(&self, id: LayerId, points: &[WeightedPoint]);

    /// Register a callback for viewport changes.
    fn add_viewport_listener(&self, listener: ViewportListener) -> ListenerId;

    /// Remove a viewport callback. Unknown identifiers are ignored.
    fn remove_viewport_listener(&self, id: ListenerId);
}

impl<T> MapSurface for Arc<T>
where
    T: MapSurface + ?Sized,
{
    fn viewport(&self) -> Option<Viewport> {
        (**self).viewport()
    }

    fn attach_layer(&self, layer: HeatmapLayer) -> LayerId {
        (**self).attach_layer(layer)
    }

    fn detach_layer(&self, id: LayerId) {
        (**self).detach_layer(id);
    }

    fn update_layer_data(&self, id: LayerId, points: &[WeightedPoint]) {
        (**self).update_layer_data(id, points);
    }

    fn add_viewport_listener(&self, listener: ViewportListener) -> ListenerId {
        (**self).add_viewport_listener(listener)
    }

    fn remove_viewport_listener(&self, id: ListenerId) {
        (**self).remove_viewport_listener(id);
    }
}
