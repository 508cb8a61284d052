use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Tunables for the overlay engine. Every field has a default so a partial
/// JSON override is enough.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Delay before binding the drawing surface so the canvas has committed layout.
    pub surface_init_delay_ms: u32,
    /// Retries for binding the drawing surface after the delay.
    pub surface_init: RetryPolicy,
    /// Retries for positioning the surface once selection mode is entered.
    pub surface_position: RetryPolicy,
    /// Retries while waiting for a page image to decode.
    pub image_wait: RetryPolicy,
    /// Delay after a page change before the overlay is re-synced.
    pub page_settle_ms: u32,
    pub page_render_timeout_ms: u32,
    pub document_load_timeout_ms: u32,
    /// Rasterisation scale for pages shown in the editor.
    pub editor_render_scale: f64,
    /// Rasterisation scale for pages uploaded from the capture screen.
    pub upload_render_scale: f64,
    /// Drags at or below this size on either axis are treated as clicks.
    pub min_selection_extent: f64,
    pub label_offset: (f64, f64),
    /// Pixel size written for pages whose rendered size is unknown.
    pub default_page_size: (u32, u32),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            surface_init_delay_ms: 50,
            surface_init: RetryPolicy::new(20, 20),
            surface_position: RetryPolicy::new(20, 50),
            image_wait: RetryPolicy::new(100, 30),
            page_settle_ms: 100,
            page_render_timeout_ms: 10_000,
            document_load_timeout_ms: 30_000,
            editor_render_scale: 1.5,
            upload_render_scale: 1.0,
            min_selection_extent: 5.0,
            label_offset: (5.0, 16.0),
            default_page_size: (800, 1131),
        }
    }
}

impl EngineConfig {
    pub fn page_render_timeout(&self) -> Duration {
        Duration::from_millis(self.page_render_timeout_ms as u64)
    }

    pub fn document_load_timeout(&self) -> Duration {
        Duration::from_millis(self.document_load_timeout_ms as u64)
    }

    /// Parse an override, falling back to defaults for anything missing.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let cfg = EngineConfig::from_json(r#"{"minSelectionExtent": 8.0, "surfacePosition": {"intervalMs": 10, "maxAttempts": 150}}"#).unwrap();
        assert_eq!(cfg.min_selection_extent, 8.0);
        assert_eq!(cfg.surface_position, RetryPolicy::new(10, 150));
        assert_eq!(cfg.page_render_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.document_load_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_garbage() {
        assert!(EngineConfig::from_json("not json").is_err());
    }
}
