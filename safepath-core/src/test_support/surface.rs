use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{
    HeatmapLayer, LayerId, ListenerId, MapSurface, Viewport, ViewportListener, WeightedPoint,
};

#[derive(Default)]
struct State {
    viewport: Option<Viewport>,
    next_id: u64,
    layers: HashMap<LayerId, HeatmapLayer>,
    listeners: Vec<(ListenerId, ViewportListener)>,
    attached: usize,
    detached: usize,
    updated: usize,
}

/// In-memory [`MapSurface`] that records layer traffic.
#[derive(Default)]
pub struct RecordingSurface {
    state: Mutex<State>,
}

impl std::fmt::Debug for RecordingSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RecordingSurface")
            .field("viewport", &state.viewport)
            .field("layers", &state.layers.len())
            .field("attached", &state.attached)
            .field("detached", &state.detached)
            .finish_non_exhaustive()
    }
}

impl RecordingSurface {
    /// A surface already showing `viewport`.
    #[must_use]
    pub fn with_viewport(viewport: Viewport) -> Self {
        let surface = Self::default();
        surface.lock().viewport = Some(viewport);
        surface
    }

    /// Move the map and notify viewport listeners, as a pan or zoom would.
    pub fn move_to(&self, viewport: Viewport) {
        let listeners: Vec<ViewportListener> = {
            let mut state = self.lock();
            state.viewport = Some(viewport);
            state.listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in listeners {
            listener(&viewport);
        }
    }

    /// Layers currently attached.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.lock().layers.len()
    }

    /// A copy of the attached layer with `id`.
    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<HeatmapLayer> {
        self.lock().layers.get(&id).cloned()
    }

    /// A copy of any one attached layer.
    #[must_use]
    pub fn any_layer(&self) -> Option<HeatmapLayer> {
        self.lock().layers.values().next().cloned()
    }

    /// Total `attach_layer` calls.
    #[must_use]
    pub fn attach_count(&self) -> usize {
        self.lock().attached
    }

    /// Total `detach_layer` calls that removed a layer.
    #[must_use]
    pub fn detach_count(&self) -> usize {
        self.lock().detached
    }

    /// Total `update_layer_data` calls that hit an attached layer.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.lock().updated
    }

    /// Registered viewport listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MapSurface for RecordingSurface {
    fn viewport(&self) -> Option<Viewport> {
        self.lock().viewport
    }

    fn attach_layer(&self, layer: HeatmapLayer) -> LayerId {
        let mut state = self.lock();
        let id = LayerId(state.next_id);
        state.next_id += 1;
        state.attached += 1;
        state.layers.insert(id, layer);
        id
    }

    fn detach_layer(&self, id: LayerId) {
        let mut state = self.lock();
        if state.layers.remove(&id).is_some() {
            state.detached += 1;
        }
    }

    fn update_layer_data(&self, id: LayerId, points: &[WeightedPoint]) {
        let mut state = self.lock();
        let Some(layer) = state.layers.get_mut(&id) else {
            return;
        };
        layer.points = points.to_vec();
        state.updated += 1;
    }

    fn add_viewport_listener(&self, listener: ViewportListener) -> ListenerId {
        let mut state = self.lock();
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.listeners.push((id, listener));
        id
    }

    fn remove_viewport_listener(&self, id: ListenerId) {
        self.lock().listeners.retain(|(existing, _)| *existing != id);
    }
}
