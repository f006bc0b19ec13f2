// captions/style.rs — Caption style presets

use crate::config::AspectMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);
}

/// Rendering parameters for one output orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleVariant {
    pub font_size: u32,
    pub color: Rgb,
    pub outline_color: Rgb,
    pub outline_width: u32,
    /// Vertical placement as a fraction of frame height, from the top
    pub position: f64,
    pub max_words: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionStyle {
    pub name: String,
    pub description: String,
    pub horizontal: StyleVariant,
    pub vertical: StyleVariant,
}

const fn variant(
    font_size: u32,
    color: Rgb,
    outline_color: Rgb,
    outline_width: u32,
    position: f64,
    max_words: usize,
) -> StyleVariant {
    StyleVariant {
        font_size,
        color,
        outline_color,
        outline_width,
        position,
        max_words,
    }
}

const PRESETS: &[(&str, &str, StyleVariant, StyleVariant)] = &[
    (
        "Classic",
        "White text with black outline",
        variant(80, Rgb::WHITE, Rgb::BLACK, 4, 0.85, 3),
        variant(100, Rgb::WHITE, Rgb::BLACK, 5, 0.7, 2),
    ),
    (
        "Bold Yellow",
        "Yellow text with thick black outline",
        variant(85, Rgb(255, 255, 0), Rgb::BLACK, 6, 0.85, 3),
        variant(110, Rgb(255, 255, 0), Rgb::BLACK, 7, 0.7, 2),
    ),
    (
        "Minimal",
        "Small white text with thin outline",
        variant(60, Rgb::WHITE, Rgb::BLACK, 2, 0.9, 4),
        variant(80, Rgb::WHITE, Rgb::BLACK, 3, 0.8, 3),
    ),
    (
        "TikTok Style",
        "Large white text with a pink outline",
        variant(90, Rgb::WHITE, Rgb(255, 0, 100), 4, 0.85, 2),
        variant(120, Rgb::WHITE, Rgb(255, 0, 100), 5, 0.8, 2),
    ),
    (
        "Neon",
        "Cyan text with purple glow",
        variant(85, Rgb(0, 255, 255), Rgb(128, 0, 255), 5, 0.85, 3),
        variant(105, Rgb(0, 255, 255), Rgb(128, 0, 255), 6, 0.7, 2),
    ),
    (
        "Ultra Bold",
        "Extra thick white text with heavy black outline",
        variant(100, Rgb::WHITE, Rgb::BLACK, 10, 0.85, 2),
        variant(140, Rgb::WHITE, Rgb::BLACK, 12, 0.8, 2),
    ),
    (
        "Viral Bold",
        "Massive white text with extreme black outline",
        variant(110, Rgb::WHITE, Rgb::BLACK, 15, 0.85, 1),
        variant(160, Rgb::WHITE, Rgb::BLACK, 18, 0.8, 1),
    ),
];

impl CaptionStyle {
    /// Look up a preset by name, ignoring case
    pub fn preset(name: &str) -> Option<Self> {
        let wanted = name.trim();
        PRESETS
            .iter()
            .find(|(preset, ..)| preset.eq_ignore_ascii_case(wanted))
            .map(|&(name, description, horizontal, vertical)| Self {
                name: name.to_string(),
                description: description.to_string(),
                horizontal,
                vertical,
            })
    }

    /// The named preset, or the default one when the name is unknown
    pub fn preset_or_default(name: &str) -> Self {
        Self::preset(name).unwrap_or_else(|| {
            tracing::warn!("Unknown caption style '{}', using default", name);
            Self::default()
        })
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        PRESETS.iter().map(|(name, ..)| *name)
    }

    pub fn variant(&self, aspect: AspectMode) -> &StyleVariant {
        match aspect {
            AspectMode::Vertical => &self.vertical,
            AspectMode::Original => &self.horizontal,
        }
    }
}

impl Default for CaptionStyle {
    fn default() -> Self {
        let (name, description, horizontal, vertical) = PRESETS[3];
        Self {
            name: name.to_string(),
            description: description.to_string(),
            horizontal,
            vertical,
        }
    }
}
