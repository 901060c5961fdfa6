//! Tunables for [`crate::OverlayController`].

use std::time::Duration;

/// Default interval between periodic re-scores of the visible points.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(2 * 60);

/// Default quiet period after a viewport change before regenerating.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Default layer opacity.
pub const DEFAULT_OPACITY: f64 = 0.6;

/// Configuration for [`crate::OverlayController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayConfig {
    update_interval: Duration,
    debounce: Duration,
    opacity: f64,
}

impl OverlayConfig {
    /// Override the periodic update interval.
    #[must_use]
    pub const fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Override the viewport debounce.
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Override the layer opacity; clamped to `0.0..=1.0`.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            DEFAULT_OPACITY
        };
        self
    }

    /// Periodic update interval.
    #[must_use]
    pub const fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// Viewport debounce.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Layer opacity.
    #[must_use]
    pub const fn opacity(&self) -> f64 {
        self.opacity
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            debounce: DEFAULT_DEBOUNCE,
            opacity: DEFAULT_OPACITY,
        }
    }
}

/// Blur radius for a zoom level: wider when zoomed in so neighbouring
/// samples still blend, between 12 and 40 pixels.
///
/// # Examples
///
/// ```
/// use safepath_overlay::layer_radius_px;
///
/// assert_eq!(layer_radius_px(3.0), 12);
/// assert_eq!(layer_radius_px(15.0), 30);
/// assert_eq!(layer_radius_px(21.0), 40);
/// ```
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "the value is clamped to 12..=40 before the cast"
)]
#[must_use]
pub fn layer_radius_px(zoom: f64) -> u32 {
    if !zoom.is_finite() {
        return 12;
    }
    (zoom * 2.0).round().clamp(12.0, 40.0) as u32
}
