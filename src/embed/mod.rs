//! Embed cache & display controller for dashboard surfaces.
//!
//! Dashboard embeds are heavyweight, so the cache creates each surface at
//! most once per URL for the lifetime of the session and never evicts.
//! Presentation is single-visible: showing one entry hides every other.
//! The cache is an explicitly constructed object owned by the application
//! root and passed by reference; there is no module-level shared state.
//!
//! # Module structure
//! - `surface` - surface/factory traits plus browser and inert
//!   implementations

mod surface;

pub use surface::{
    BrowserSurface, BrowserSurfaceFactory, EmbedSurface, NullSurface, NullSurfaceFactory,
    SurfaceFactory,
};

use std::collections::HashMap;

use thiserror::Error;
use url::Url;

/// Errors from embed operations.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("invalid embed url: {url}")]
    InvalidUrl { url: String },

    #[error("embed surface failed for {url}: {message}")]
    SurfaceFailed { url: String, message: String },

    #[error("no cached embed for {url}")]
    UnknownEntry { url: String },
}

/// Result of a successful `show` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    /// The entry is now visible (created on this call or reused).
    Opened,
    /// The URL was already the visible entry; nothing was reloaded.
    AlreadyVisible,
}

/// One cached embed.
struct EmbedEntry {
    title: String,
    surface: Box<dyn EmbedSurface>,
    visible: bool,
    load_error: Option<String>,
}

/// Keyed cache of dashboard surfaces with single-visible semantics.
pub struct EmbedCache {
    entries: HashMap<String, EmbedEntry>,
    factory: Box<dyn SurfaceFactory>,
    /// Host application URL; embeds resolving to the same origin and path
    /// are rejected to prevent a recursive frame load.
    app_url: Option<Url>,
}

impl EmbedCache {
    pub fn new(factory: Box<dyn SurfaceFactory>, app_url: Option<Url>) -> Self {
        Self {
            entries: HashMap::new(),
            factory,
            app_url,
        }
    }

    /// Check whether a URL is acceptable for embedding.
    ///
    /// Accepts only absolute http/https URLs, and rejects a URL matching the
    /// host application's own origin and path. Never panics.
    pub fn validate(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return false;
        }
        if parsed.host_str().is_none() {
            return false;
        }
        if let Some(app) = &self.app_url {
            let same_origin = parsed.scheme() == app.scheme()
                && parsed.host_str() == app.host_str()
                && parsed.port_or_known_default() == app.port_or_known_default();
            if same_origin
                && parsed.path().trim_end_matches('/') == app.path().trim_end_matches('/')
            {
                return false;
            }
        }
        true
    }

    /// Show a dashboard, creating its surface on first use.
    ///
    /// Showing the already-visible URL is an idempotent no-op reported as
    /// [`ShowOutcome::AlreadyVisible`]. Any other cached entry is hidden.
    pub fn show(&mut self, url: &str, title: &str) -> Result<ShowOutcome, EmbedError> {
        if !self.validate(url) {
            return Err(EmbedError::InvalidUrl {
                url: url.to_string(),
            });
        }

        if self.entries.get(url).map(|e| e.visible).unwrap_or(false) {
            return Ok(ShowOutcome::AlreadyVisible);
        }

        // Existence check stays independent of creation: the surface is only
        // allocated when the URL has never been shown before.
        if !self.entries.contains_key(url) {
            let surface = self.factory.create(url, title)?;
            self.entries.insert(
                url.to_string(),
                EmbedEntry {
                    title: title.to_string(),
                    surface,
                    visible: false,
                    load_error: None,
                },
            );
        }

        for (key, entry) in self.entries.iter_mut() {
            let visible = key == url;
            entry.visible = visible;
            entry.surface.set_visible(visible);
        }
        Ok(ShowOutcome::Opened)
    }

    /// Hide every entry. Nothing is evicted from the cache.
    pub fn hide(&mut self) {
        for entry in self.entries.values_mut() {
            entry.visible = false;
            entry.surface.set_visible(false);
        }
    }

    /// URL of the currently visible entry, if any.
    pub fn visible_url(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, e)| e.visible)
            .map(|(url, _)| url.as_str())
    }

    /// Title of a cached entry.
    pub fn title(&self, url: &str) -> Option<&str> {
        self.entries.get(url).map(|e| e.title.as_str())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record an asynchronous load failure for one entry.
    ///
    /// Other entries are unaffected; the entry stays cached so the caller
    /// can offer the open-externally fallback.
    pub fn mark_load_failed(&mut self, url: &str, message: impl Into<String>) -> bool {
        match self.entries.get_mut(url) {
            Some(entry) => {
                entry.load_error = Some(message.into());
                true
            }
            None => false,
        }
    }

    /// Load failure recorded for an entry, if any.
    pub fn load_error(&self, url: &str) -> Option<&str> {
        self.entries
            .get(url)
            .and_then(|e| e.load_error.as_deref())
    }

    /// Fallback action: open a cached embed in the default external handler.
    pub fn open_externally(&self, url: &str) -> Result<(), EmbedError> {
        if !self.entries.contains_key(url) {
            return Err(EmbedError::UnknownEntry {
                url: url.to_string(),
            });
        }
        open::that(url).map_err(|e| EmbedError::SurfaceFailed {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
