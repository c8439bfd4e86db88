use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use portfolio_panel::data::model::CellValue;

// ---------------------------------------------------------------------------
// Fixed colours
// ---------------------------------------------------------------------------

pub const PRIMARY: Color32 = Color32::from_rgb(0x58, 0xA6, 0xFF);
pub const SECONDARY: Color32 = Color32::from_rgb(0x6D, 0xCE, 0xAA);
pub const POSITIVE: Color32 = Color32::from_rgb(0x3F, 0xB9, 0x50);
pub const NEGATIVE: Color32 = Color32::from_rgb(0xF8, 0x51, 0x49);
pub const WARNING: Color32 = Color32::from_rgb(0xD2, 0x99, 0x22);

/// Green for gains, red for losses.
pub fn signed(value: f64) -> Color32 {
    if value >= 0.0 { POSITIVE } else { NEGATIVE }
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0 + 210.0;
            let hsl = Hsl::new(hue, 0.65, 0.65);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps the values of the category column to distinct colours, stable for
/// the lifetime of a dataset.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<CellValue, Color32>,
}

impl ColorMap {
    pub fn new(values: &BTreeSet<CellValue>) -> Self {
        let palette = generate_palette(values.len());
        let mapping = values.iter().cloned().zip(palette).collect();
        ColorMap { mapping }
    }

    /// Look up the colour for a given category.
    pub fn color_for(&self, value: &CellValue) -> Color32 {
        self.mapping.get(value).copied().unwrap_or(Color32::GRAY)
    }
}
