//! Style and workflow configuration.
//!
//! Configuration is an input supplied by the host (usually derived from the
//! labeling config), never owned by the core. Both structs deserialize from
//! JSON with every field optional.

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::error::ConfigError;
use crate::platform::Parity;

/// Background and text color of unlabeled byte nodes of one parity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub background: Rgba,
    pub foreground: Rgba,
}

/// Colors used when painting byte nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    /// Background of the byte grid canvas. A label color equal to this
    /// restores the parity palette instead of painting a flat color.
    pub canvas_background: Rgba,
    /// Palette of even-offset nodes.
    pub even_palette: Palette,
    /// Palette of odd-offset nodes.
    pub odd_palette: Palette,
    /// Text color on labeled nodes.
    pub label_foreground: Rgba,
    /// Opacity factor applied to label colors of regions that are not the
    /// current selection.
    pub unselected_opacity: f64,
    /// Overrides every label color when set.
    pub highlight_color: Option<Rgba>,
    /// Color of restored regions whose labels the store cannot color.
    pub default_label_color: Rgba,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            canvas_background: Rgba::WHITE,
            even_palette: Palette {
                background: Rgba::WHITE,
                foreground: Rgba::BLACK,
            },
            odd_palette: Palette {
                background: Rgba(0xF2F2F2FF),
                foreground: Rgba::BLACK,
            },
            label_foreground: Rgba::WHITE,
            unselected_opacity: 0.3,
            highlight_color: None,
            default_label_color: Rgba(0x36B37EFF),
        }
    }
}

impl StyleConfig {
    /// Parse from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: StyleConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.unselected_opacity) {
            return Err(ConfigError::Opacity(self.unselected_opacity));
        }
        Ok(())
    }

    pub fn palette(&self, parity: Parity) -> Palette {
        match parity {
            Parity::Even => self.even_palette,
            Parity::Odd => self.odd_palette,
        }
    }

    /// The color a region labeled with `label_color` is painted with.
    pub fn effective_color(&self, label_color: Rgba) -> Rgba {
        self.highlight_color.unwrap_or(label_color)
    }
}

/// Behavior switches of the selection workflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkflowOptions {
    /// When false, drags never create regions.
    pub selection_enabled: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            selection_enabled: true,
        }
    }
}

impl WorkflowOptions {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
