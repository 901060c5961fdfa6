//! Feature flag lookup.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::ProviderError;

/// Remote configuration switches consulted before expensive work.
#[async_trait]
pub trait FeatureFlags: Send + Sync {
    /// Report whether the live risk overlay may run.
    async fn risk_overlay_enabled(&self) -> Result<bool, ProviderError>;
}

#[async_trait]
impl<T> FeatureFlags for Arc<T>
where
    T: FeatureFlags + ?Sized,
{
    async fn risk_overlay_enabled(&self) -> Result<bool, ProviderError> {
        (**self).risk_overlay_enabled().await
    }
}

/// In-memory flags that can be flipped at runtime.
///
/// # Examples
///
/// ```
/// use safepath_core::StaticFeatureFlags;
///
/// let flags = StaticFeatureFlags::new(true);
/// flags.set_risk_overlay(false);
/// assert!(!flags.is_risk_overlay_enabled());
/// ```
#[derive(Debug)]
pub struct StaticFeatureFlags {
    risk_overlay: AtomicBool,
}

impl StaticFeatureFlags {
    /// Start with the overlay flag set to `enabled`.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self {
            risk_overlay: AtomicBool::new(enabled),
        }
    }

    /// Flip the overlay flag.
    pub fn set_risk_overlay(&self, enabled: bool) {
        self.risk_overlay.store(enabled, Ordering::SeqCst);
    }

    /// Current value of the overlay flag.
    #[must_use]
    pub fn is_risk_overlay_enabled(&self) -> bool {
        self.risk_overlay.load(Ordering::SeqCst)
    }
}

impl Default for StaticFeatureFlags {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl FeatureFlags for StaticFeatureFlags {
    async fn risk_overlay_enabled(&self) -> Result<bool, ProviderError> {
        Ok(self.is_risk_overlay_enabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn reports_current_value() {
        let flags = StaticFeatureFlags::default();
        assert!(flags.risk_overlay_enabled().await.expect("static flags never fail"));
        flags.set_risk_overlay(false);
        assert!(!flags.risk_overlay_enabled().await.expect("static flags never fail"));
    }
}
