use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::MetadataValue;

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
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Colour for line `i` of `n` when no metadata column drives the colouring.
pub fn index_color(i: usize, n: usize) -> Color32 {
    if n == 0 {
        return Color32::GRAY;
    }
    let hue = (i as f32 / n as f32) * 360.0;
    let hsl = Hsl::new(hue, 0.65, 0.5);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Color mapping: metadata value → Color32
// ---------------------------------------------------------------------------

/// Maps unique metadata values of a chosen column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    mapping: BTreeMap<MetadataValue, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for the given column from its unique values.
    pub fn new(column: &str, unique_values: &BTreeSet<MetadataValue>) -> Self {
        let palette = generate_palette(unique_values.len());
        let mapping: BTreeMap<MetadataValue, Color32> = unique_values
            .iter()
            .zip(palette)
            .map(|(v, c)| (v.clone(), c))
            .collect();

        ColorMap {
            column: column.to_string(),
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given metadata value.
    pub fn color_for(&self, value: &MetadataValue) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_hues() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(5);
        assert_eq!(colors.len(), 5);
        assert_ne!(colors[0], colors[2]);
    }

    #[test]
    fn color_map_falls_back_for_unknown_values() {
        let values: BTreeSet<MetadataValue> = [
            MetadataValue::String("basalt".into()),
            MetadataValue::String("andesite".into()),
        ]
        .into_iter()
        .collect();
        let cm = ColorMap::new("rock_type", &values);
        let known = cm.color_for(&MetadataValue::String("basalt".into()));
        let unknown = cm.color_for(&MetadataValue::String("rhyolite".into()));
        assert_ne!(known, unknown);
        assert_eq!(unknown, Color32::GRAY);
    }
}
