//! `OverlayController`: ties a heatmap generator to a live map.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use safepath_core::{
    HeatmapLayer, HeatmapPoint, LayerId, ListenerId, MapSurface, Scheduler, Subscribers,
    Subscription, TimerHandle, Viewport, WeightedPoint,
};
use safepath_heatmap::{GridHeatmapGenerator, HeatmapUpdate, UpdateKind};

use crate::config::{OverlayConfig, layer_radius_px};
use crate::error::OverlayError;
use crate::state::OverlaySessionState;

#[derive(Default)]
struct Session {
    state: OverlaySessionState,
    // Bumped on every enable and disable; results tagged with an older
    // value are dropped.
    epoch: u64,
    viewport: Option<Viewport>,
    layer: Option<LayerId>,
    listener: Option<ListenerId>,
    generator_subscription: Option<Subscription>,
    debounce: Option<TimerHandle>,
}

struct Inner {
    surface: Arc<dyn MapSurface>,
    generator: GridHeatmapGenerator,
    scheduler: Arc<dyn Scheduler>,
    config: OverlayConfig,
    session: Mutex<Session>,
    subscribers: Subscribers<OverlaySessionState>,
}

/// Drives the risk overlay for one map.
///
/// Enabling generates points for the current viewport, attaches a single
/// heat layer and keeps it current: viewport changes trigger a debounced
/// regeneration and the generator re-scores the visible points
/// periodically. Disabling tears all of that down.
///
/// Clones share the same session.
#[derive(Clone)]
pub struct OverlayController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for OverlayController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayController")
            .field("config", &self.inner.config)
            .field("state", &self.inner.lock().state)
            .finish_non_exhaustive()
    }
}

impl OverlayController {
    /// Create a controller with the default configuration.
    #[must_use]
    pub fn new(
        surface: Arc<dyn MapSurface>,
        generator: GridHeatmapGenerator,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self::with_config(surface, generator, scheduler, OverlayConfig::default())
    }

    /// Create a controller with an explicit configuration.
    #[must_use]
    pub fn with_config(
        surface: Arc<dyn MapSurface>,
        generator: GridHeatmapGenerator,
        scheduler: Arc<dyn Scheduler>,
        config: OverlayConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                surface,
                generator,
                scheduler,
                config,
                session: Mutex::new(Session::default()),
                subscribers: Subscribers::new("overlay"),
            }),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &OverlayConfig {
        &self.inner.config
    }

    /// Snapshot of the session state.
    #[must_use]
    pub fn state(&self) -> OverlaySessionState {
        self.inner.lock().state.clone()
    }

    /// Register `callback` for every state transition.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&OverlaySessionState) + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(callback)
    }

    /// Switch the overlay on for the current viewport.
    ///
    /// Does nothing when already enabled. When the risk overlay flag is off
    /// the session returns to disabled without attaching a layer. If
    /// [`OverlayController::disable`] runs while the first generation is in
    /// flight, its result is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::NoViewport`] before the map has laid out, and
    /// [`OverlayError::InvalidInput`] when the generator rejects the
    /// viewport's zoom.
    pub async fn enable(&self) -> Result<(), OverlayError> {
        let viewport = self.inner.surface.viewport().ok_or(OverlayError::NoViewport)?;
        let epoch = {
            let mut session = self.inner.lock();
            if session.state.is_enabled {
                return Ok(());
            }
            session.epoch += 1;
            session.viewport = Some(viewport);
            session.state.is_enabled = true;
            session.state.is_loading = true;
            session.epoch
        };
        self.inner.broadcast();
        log::info!("risk overlay enabling at zoom {}", viewport.zoom);

        let generated = self
            .inner
            .generator
            .generate_area(viewport.bounds, viewport.zoom)
            .await;
        match generated {
            Ok(points) if points.is_empty() => {
                if self.inner.reset_if_current(epoch) {
                    log::info!("risk overlay unavailable; feature flag is off");
                }
                Ok(())
            }
            Ok(points) => {
                self.inner.attach(epoch, viewport, &points);
                Ok(())
            }
            Err(err) => {
                self.inner.reset_if_current(epoch);
                Err(err.into())
            }
        }
    }

    /// Switch the overlay off and release everything it holds on the map.
    ///
    /// Does nothing when already disabled.
    pub fn disable(&self) {
        let (layer, listener, subscription, debounce) = {
            let mut session = self.inner.lock();
            if !session.state.is_enabled && session.layer.is_none() {
                return;
            }
            session.epoch += 1;
            session.state = OverlaySessionState::default();
            session.viewport = None;
            (
                session.layer.take(),
                session.listener.take(),
                session.generator_subscription.take(),
                session.debounce.take(),
            )
        };
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
        if let Some(handle) = debounce {
            self.inner.scheduler.cancel(handle);
        }
        self.inner.generator.stop_real_time_updates();
        self.inner.generator.clear();
        if let Some(listener) = listener {
            self.inner.surface.remove_viewport_listener(listener);
        }
        if let Some(layer) = layer {
            self.inner.surface.detach_layer(layer);
        }
        self.inner.broadcast();
        log::info!("risk overlay disabled");
    }

    /// Flip between enabled and disabled.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`OverlayController::enable`].
    pub async fn toggle(&self) -> Result<(), OverlayError> {
        if self.inner.lock().state.is_enabled {
            self.disable();
            Ok(())
        } else {
            self.enable().await
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn broadcast(&self) {
        let state = self.lock().state.clone();
        self.subscribers.notify(&state);
    }

    /// Return to the disabled state if `epoch` is still current.
    fn reset_if_current(&self, epoch: u64) -> bool {
        {
            let mut session = self.lock();
            if session.epoch != epoch {
                return false;
            }
            session.state = OverlaySessionState::default();
            session.viewport = None;
        }
        self.broadcast();
        true
    }

    fn attach(self: &Arc<Self>, epoch: u64, viewport: Viewport, points: &[HeatmapPoint]) {
        let stale = {
            let mut session = self.lock();
            if session.epoch != epoch {
                log::debug!("discarding overlay generation from a disabled session");
                return;
            }
            session.layer.take()
        };

        // The surface may call back into the controller, so it is driven
        // without the session lock held.
        if let Some(stale) = stale {
            self.surface.detach_layer(stale);
        }
        let layer = self.surface.attach_layer(HeatmapLayer {
            points: weighted(points),
            radius_px: layer_radius_px(viewport.zoom),
            opacity: self.config.opacity(),
        });
        let listener = self.surface.add_viewport_listener(self.viewport_listener());
        let subscription = self.generator.subscribe(self.layer_patcher(epoch));

        let mut session = self.lock();
        if session.epoch != epoch {
            drop(session);
            log::debug!("overlay disabled while attaching; releasing the new layer");
            subscription.unsubscribe();
            self.surface.remove_viewport_listener(listener);
            self.surface.detach_layer(layer);
            return;
        }
        session.layer = Some(layer);
        session.listener = Some(listener);
        session.generator_subscription = Some(subscription);
        session.state.is_loading = false;
        session.state.is_active = true;
        session.state.summarise(points, &viewport.bounds);
        let point_count = session.state.point_count;
        drop(session);

        self.generator
            .start_real_time_updates(self.config.update_interval());
        self.broadcast();
        log::info!("risk overlay enabled with {point_count} points");
    }

    fn viewport_listener(self: &Arc<Self>) -> Arc<dyn Fn(&Viewport) + Send + Sync> {
        let weak = Arc::downgrade(self);
        Arc::new(move |viewport: &Viewport| {
            if let Some(inner) = weak.upgrade() {
                inner.schedule_regeneration(*viewport);
            }
        })
    }

    fn layer_patcher(self: &Arc<Self>, epoch: u64) -> impl Fn(&HeatmapUpdate) + Send + Sync + 'static {
        let weak = Arc::downgrade(self);
        move |update: &HeatmapUpdate| {
            // Generated points are applied by whoever asked for them, after
            // checking that their session is still current.
            if update.kind != UpdateKind::Refreshed {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                inner.patch(epoch, &update.points);
            }
        }
    }

    fn patch(&self, epoch: u64, points: &[HeatmapPoint]) {
        let layer = {
            let mut session = self.lock();
            let (Some(layer), Some(viewport)) = (session.layer, session.viewport) else {
                return;
            };
            if session.epoch != epoch {
                return;
            }
            session.state.summarise(points, &viewport.bounds);
            layer
        };
        self.surface.update_layer_data(layer, &weighted(points));
        self.broadcast();
    }

    fn schedule_regeneration(self: &Arc<Self>, viewport: Viewport) {
        let mut session = self.lock();
        if !session.state.is_enabled || session.state.is_loading {
            return;
        }
        let epoch = session.epoch;
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = self.scheduler.schedule_once(
            self.config.debounce(),
            Box::new(move || {
                let weak = weak.clone();
                Box::pin(async move {
                    if let Some(inner) = weak.upgrade() {
                        inner.regenerate(epoch, viewport).await;
                    }
                })
            }),
        );
        if let Some(previous) = session.debounce.replace(handle) {
            self.scheduler.cancel(previous);
        }
    }

    async fn regenerate(&self, epoch: u64, viewport: Viewport) {
        {
            let mut session = self.lock();
            session.debounce = None;
            if session.epoch != epoch || !session.state.is_enabled || session.state.is_loading {
                return;
            }
            session.viewport = Some(viewport);
            session.state.is_loading = true;
        }
        self.broadcast();
        log::debug!("regenerating risk overlay at zoom {}", viewport.zoom);

        let result = self
            .generator
            .generate_area(viewport.bounds, viewport.zoom)
            .await;
        let layer = {
            let mut session = self.lock();
            if session.epoch != epoch {
                log::debug!("discarding overlay regeneration from a disabled session");
                return;
            }
            session.state.is_loading = false;
            match &result {
                Ok(points) if !points.is_empty() => {
                    session.state.summarise(points, &viewport.bounds);
                    session.layer
                }
                _ => None,
            }
        };
        match result {
            Ok(points) => {
                if let Some(layer) = layer {
                    self.surface.update_layer_data(layer, &weighted(&points));
                }
            }
            Err(err) => log::warn!("risk overlay regeneration failed: {err}"),
        }
        self.broadcast();
    }
}

fn weighted(points: &[HeatmapPoint]) -> Vec<WeightedPoint> {
    points
        .iter()
        .map(|p| WeightedPoint {
            point: p.point,
            weight: p.weight,
        })
        .collect()
}
