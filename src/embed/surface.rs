//! Embed surface trait abstraction.
//!
//! Allocating a dashboard surface is expensive (it stands up a remote
//! embedded view), so the cache creates each surface at most once per URL.
//! The traits here keep surface allocation injectable so tests can run with
//! an inert implementation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::EmbedError;

/// A live embeddable dashboard handle.
pub trait EmbedSurface: Send {
    /// The URL this surface displays.
    fn url(&self) -> &str;

    /// Show or hide the surface.
    fn set_visible(&mut self, visible: bool);

    fn is_visible(&self) -> bool;
}

/// Allocates embed surfaces. Creation is the side-effecting, expensive step.
pub trait SurfaceFactory: Send {
    fn create(&self, url: &str, title: &str) -> Result<Box<dyn EmbedSurface>, EmbedError>;
}

/// Production surface: the dashboard opens in the system browser.
///
/// A terminal client has no in-process frame to render into, so creation
/// launches the URL externally once; visibility afterwards is bookkeeping
/// that drives the in-app active-dashboard indicator.
pub struct BrowserSurface {
    url: String,
    visible: bool,
}

impl EmbedSurface for BrowserSurface {
    fn url(&self) -> &str {
        &self.url
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Factory for [`BrowserSurface`].
pub struct BrowserSurfaceFactory;

impl SurfaceFactory for BrowserSurfaceFactory {
    fn create(&self, url: &str, title: &str) -> Result<Box<dyn EmbedSurface>, EmbedError> {
        tracing::info!(url, title, "opening dashboard surface");
        open::that(url).map_err(|e| EmbedError::SurfaceFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Box::new(BrowserSurface {
            url: url.to_string(),
            visible: false,
        }))
    }
}

/// Inert surface for tests: records visibility, touches nothing external.
pub struct NullSurface {
    url: String,
    visible: bool,
}

impl EmbedSurface for NullSurface {
    fn url(&self) -> &str {
        &self.url
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Factory for [`NullSurface`] that counts how many surfaces it allocated.
#[derive(Default)]
pub struct NullSurfaceFactory {
    created: Arc<AtomicUsize>,
}

impl NullSurfaceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared counter of surfaces created so far.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.created)
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl SurfaceFactory for NullSurfaceFactory {
    fn create(&self, url: &str, _title: &str) -> Result<Box<dyn EmbedSurface>, EmbedError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(NullSurface {
            url: url.to_string(),
            visible: false,
        }))
    }
}
