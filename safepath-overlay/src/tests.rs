//! Unit tests for the overlay controller.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rstest::{fixture, rstest};
use safepath_core::test_support::{
    GatedFeatureFlags, ManualClock, ManualScheduler, RecordingSurface,
};
use safepath_core::{
    Bounds, FeatureFlags, HeatmapLayer, InputError, LayerId, ListenerId, MapSurface,
    StaticFeatureFlags, Viewport, ViewportListener, WeightedPoint,
};
use safepath_heatmap::GridHeatmapGenerator;

use crate::{OverlayController, OverlayError, layer_radius_px};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

fn viewport(zoom: f64) -> Viewport {
    Viewport {
        bounds: Bounds::new(51.515, 51.497, -0.110, -0.145).expect("valid bounds"),
        zoom,
    }
}

fn moved(zoom: f64) -> Viewport {
    Viewport {
        bounds: Bounds::new(51.525, 51.507, -0.100, -0.135).expect("valid bounds"),
        zoom,
    }
}

struct Harness {
    surface: Arc<RecordingSurface>,
    scheduler: Arc<ManualScheduler>,
    flags: Arc<StaticFeatureFlags>,
    controller: OverlayController,
}

fn build(
    surface: RecordingSurface,
    flags: Arc<dyn FeatureFlags>,
) -> (Arc<RecordingSurface>, Arc<ManualScheduler>, OverlayController) {
    let scheduler = Arc::new(ManualScheduler::new(ManualClock::at_utc(2024, 5, 1, 12, 0)));
    let generator = GridHeatmapGenerator::new(flags, Arc::clone(&scheduler) as _)
        .with_clock(Arc::new(scheduler.clock()));
    let surface = Arc::new(surface);
    let controller = OverlayController::new(
        Arc::clone(&surface) as _,
        generator,
        Arc::clone(&scheduler) as _,
    );
    (surface, scheduler, controller)
}

#[fixture]
fn harness() -> Harness {
    let flags = Arc::new(StaticFeatureFlags::new(true));
    let (surface, scheduler, controller) = build(
        RecordingSurface::with_viewport(viewport(14.0)),
        Arc::clone(&flags) as _,
    );
    Harness {
        surface,
        scheduler,
        flags,
        controller,
    }
}

/// Surface that reports its viewport to a listener as soon as it is added.
struct EagerSurface(RecordingSurface);

impl MapSurface for EagerSurface {
    fn viewport(&self) -> Option<Viewport> {
        self.0.viewport()
    }

    fn attach_layer(&self, layer: HeatmapLayer) -> LayerId {
        self.0.attach_layer(layer)
    }

    fn detach_layer(&self, id: LayerId) {
        self.0.detach_layer(id);
    }

    fn update_layer_data(&self, id: LayerId, points: &[WeightedPoint]) {
        self.0.update_layer_data(id, points);
    }

    fn add_viewport_listener(&self, listener: ViewportListener) -> ListenerId {
        let id = self.0.add_viewport_listener(Arc::clone(&listener));
        if let Some(viewport) = self.0.viewport() {
            listener(&viewport);
        }
        id
    }

    fn remove_viewport_listener(&self, id: ListenerId) {
        self.0.remove_viewport_listener(id);
    }
}

fn coords(layer: &HeatmapLayer) -> Vec<geo::Coord<f64>> {
    layer.points.iter().map(|p| p.point).collect()
}

#[rstest]
fn enabling_attaches_one_layer_and_starts_refresh(harness: Harness) {
    block_on(harness.controller.enable()).expect("enable");

    let state = harness.controller.state();
    assert!(state.is_enabled && state.is_active && !state.is_loading);
    assert!(state.point_count > 0);
    assert!(state.average_safety.is_some());
    assert_eq!(harness.surface.layer_count(), 1);
    assert_eq!(harness.surface.listener_count(), 1);
    assert_eq!(harness.scheduler.pending_count(), 1, "periodic refresh");

    let layer = harness.surface.any_layer().expect("layer attached");
    assert_eq!(layer.points.len(), state.point_count);
    assert_eq!(layer.radius_px, layer_radius_px(14.0));
}

#[rstest]
fn repeated_enables_never_stack_layers(harness: Harness) {
    harness.controller.disable();
    block_on(harness.controller.enable()).expect("enable");
    block_on(harness.controller.enable()).expect("enable again");
    assert_eq!(harness.surface.layer_count(), 1);
    assert_eq!(harness.surface.attach_count(), 1);

    harness.controller.disable();

    assert_eq!(harness.surface.layer_count(), 0);
    assert_eq!(harness.surface.attach_count(), harness.surface.detach_count());
    assert_eq!(harness.surface.listener_count(), 0);
    assert_eq!(harness.scheduler.pending_count(), 0);
    assert_eq!(harness.controller.state(), crate::OverlaySessionState::default());
}

#[rstest]
fn enabling_before_layout_fails() {
    let (surface, _, controller) = build(
        RecordingSurface::default(),
        Arc::new(StaticFeatureFlags::new(true)),
    );

    let result = block_on(controller.enable());

    assert_eq!(result, Err(OverlayError::NoViewport));
    assert!(!controller.state().is_enabled);
    assert_eq!(surface.attach_count(), 0);
}

#[rstest]
fn invalid_zoom_is_reported_and_leaves_the_overlay_off() {
    let (surface, _, controller) = build(
        RecordingSurface::with_viewport(viewport(-1.0)),
        Arc::new(StaticFeatureFlags::new(true)),
    );

    let result = block_on(controller.enable());

    assert_eq!(
        result,
        Err(OverlayError::InvalidInput(InputError::InvalidZoom { zoom: -1.0 }))
    );
    assert!(!controller.state().is_enabled);
    assert_eq!(surface.attach_count(), 0);
}

#[rstest]
fn disabled_flag_keeps_the_map_untouched(harness: Harness) {
    harness.flags.set_risk_overlay(false);

    block_on(harness.controller.enable()).expect("enable");

    assert!(!harness.controller.state().is_enabled);
    assert_eq!(harness.surface.attach_count(), 0);
    assert_eq!(harness.surface.listener_count(), 0);
}

#[rstest]
fn viewport_changes_are_debounced(harness: Harness) {
    block_on(async {
        harness.controller.enable().await.expect("enable");
        harness.surface.move_to(moved(14.0));
        harness.surface.move_to(moved(15.0));
        harness.surface.move_to(moved(16.0));
        assert_eq!(harness.scheduler.pending_count(), 2, "refresh plus one debounce");

        harness.scheduler.advance(Duration::from_secs(1)).await;
    });

    assert_eq!(harness.surface.update_count(), 1);
    assert_eq!(harness.surface.attach_count(), 1);
    let state = harness.controller.state();
    assert!(!state.is_loading);
    assert_eq!(
        harness.surface.any_layer().map(|l| l.points.len()),
        Some(state.point_count)
    );
}

#[rstest]
fn viewport_changes_after_disable_are_ignored(harness: Harness) {
    block_on(harness.controller.enable()).expect("enable");
    harness.controller.disable();

    harness.surface.move_to(moved(15.0));
    block_on(harness.scheduler.advance(Duration::from_secs(5)));

    assert_eq!(harness.scheduler.pending_count(), 0);
    assert_eq!(harness.surface.update_count(), 0);
}

#[rstest]
fn periodic_refresh_patches_the_layer(harness: Harness) {
    block_on(async {
        harness.controller.enable().await.expect("enable");
        harness.scheduler.advance(Duration::from_secs(2 * 60)).await;
    });

    assert_eq!(harness.surface.update_count(), 1);
    assert_eq!(harness.surface.attach_count(), 1);
}

#[rstest]
fn disabling_mid_generation_discards_the_result() {
    let gate = Arc::new(GatedFeatureFlags::holding_all());
    let (surface, _, controller) = build(
        RecordingSurface::with_viewport(viewport(14.0)),
        Arc::clone(&gate) as _,
    );

    let (enabled, ()) = block_on(async {
        tokio::join!(controller.enable(), async {
            while !controller.state().is_loading {
                tokio::task::yield_now().await;
            }
            controller.disable();
            gate.release();
        })
    });

    enabled.expect("enable");
    assert_eq!(surface.attach_count(), 0);
    assert_eq!(surface.listener_count(), 0);
    assert!(!controller.state().is_enabled);
}

#[rstest]
fn regeneration_from_a_disabled_session_leaves_the_next_one_alone() {
    // The first lookup enables; the second belongs to the debounced
    // regeneration and is held until the overlay has been cycled.
    let gate = Arc::new(GatedFeatureFlags::holding_lookup(2));
    let (surface, scheduler, controller) = build(
        RecordingSurface::with_viewport(viewport(14.0)),
        Arc::clone(&gate) as _,
    );

    let attached = block_on(async {
        controller.enable().await.expect("enable");
        surface.move_to(moved(15.0));
        let ((), attached) = tokio::join!(scheduler.advance(Duration::from_secs(1)), async {
            while !controller.state().is_loading {
                tokio::task::yield_now().await;
            }
            controller.disable();
            surface.move_to(viewport(14.0));
            controller.enable().await.expect("re-enable");
            let attached = surface.any_layer().expect("layer attached");
            gate.release();
            attached
        });
        attached
    });

    assert_eq!(gate.lookups(), 3);
    assert_eq!(surface.update_count(), 0);
    assert_eq!(surface.layer_count(), 1);
    assert_eq!(surface.any_layer().as_ref(), Some(&attached));
    let state = controller.state();
    assert!(state.is_enabled && !state.is_loading);
    assert_eq!(state.point_count, attached.points.len());

    block_on(scheduler.advance(Duration::from_secs(2 * 60)));

    assert_eq!(surface.update_count(), 1);
    let refreshed = surface.any_layer().expect("layer attached");
    assert_eq!(coords(&refreshed), coords(&attached));
}

#[rstest]
fn surfaces_calling_listeners_on_registration_do_not_stall_enable() {
    let scheduler = Arc::new(ManualScheduler::new(ManualClock::at_utc(2024, 5, 1, 12, 0)));
    let generator = GridHeatmapGenerator::new(
        Arc::new(StaticFeatureFlags::new(true)),
        Arc::clone(&scheduler) as _,
    )
    .with_clock(Arc::new(scheduler.clock()));
    let surface = Arc::new(EagerSurface(RecordingSurface::with_viewport(viewport(14.0))));
    let controller = OverlayController::new(
        Arc::clone(&surface) as _,
        generator,
        Arc::clone(&scheduler) as _,
    );

    block_on(controller.enable()).expect("enable");

    let state = controller.state();
    assert!(state.is_enabled && state.is_active && !state.is_loading);
    assert_eq!(surface.0.layer_count(), 1);
    assert_eq!(surface.0.listener_count(), 1);
    assert_eq!(scheduler.pending_count(), 1, "only the periodic refresh");
}

#[rstest]
fn toggle_flips_the_session(harness: Harness) {
    block_on(harness.controller.toggle()).expect("toggle on");
    assert!(harness.controller.state().is_enabled);

    block_on(harness.controller.toggle()).expect("toggle off");
    assert!(!harness.controller.state().is_enabled);
    assert_eq!(harness.surface.layer_count(), 0);
}

#[rstest]
fn subscribers_see_loading_then_loaded(harness: Harness) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = harness.controller.subscribe(move |state| {
        sink.lock()
            .expect("sink")
            .push((state.is_enabled, state.is_loading, state.is_active));
    });

    block_on(harness.controller.enable()).expect("enable");

    let seen = seen.lock().expect("sink").clone();
    assert_eq!(seen, vec![(true, true, false), (true, false, true)]);
}
