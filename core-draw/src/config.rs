// core-draw/src/config.rs

//! Compositor configuration.
//!
//! Hosts build a `Config` (or take the default) and hand it to
//! [`crate::Compositor::new`]. There is no file loading and no
//! environment lookup here; embedding hosts own both.

use serde::{Deserialize, Serialize};

/// Display label length on the wire (NUL-padded in the init response).
pub const LABEL_LEN: usize = 128;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Initial display width in pixels.
    pub width: u32,
    /// Initial display height in pixels.
    pub height: u32,
    /// Label reported by the init response, truncated to 128 bytes.
    pub label: String,
    /// Family handed to the fallback text driver.
    pub font_family: String,
    /// Glyph height for fallback drawing when no font metrics exist.
    pub fallback_font_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: 1024,
            height: 768,
            label: "core-draw".to_string(),
            font_family: "monospace".to_string(),
            fallback_font_height: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_display_is_positive() {
        let cfg = Config::default();
        assert!(cfg.width > 0 && cfg.height > 0);
        assert!(cfg.label.len() <= LABEL_LEN);
    }
}
