use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use wildfire_aq::data::model::Sensor;

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
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

pub fn sensor_color(sensor: Sensor) -> Color32 {
    match sensor {
        Sensor::Modis => Color32::from_rgb(31, 119, 180),
        Sensor::Viirs => Color32::from_rgb(255, 127, 14),
    }
}

// ---------------------------------------------------------------------------
// Diverging scale for correlation coefficients
// ---------------------------------------------------------------------------

/// Blue (-1) → white (0) → red (+1), mixed in linear RGB.
/// Missing or NaN values are grey.
pub fn diverging(value: Option<f64>) -> Color32 {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return Color32::GRAY;
    };
    let t = v.clamp(-1.0, 1.0) as f32;

    let cold: LinSrgb = Srgb::new(0.23, 0.30, 0.75).into_linear();
    let neutral: LinSrgb = Srgb::new(0.87, 0.87, 0.87).into_linear();
    let warm: LinSrgb = Srgb::new(0.71, 0.02, 0.15).into_linear();

    let mixed = if t < 0.0 {
        neutral.mix(cold, -t)
    } else {
        neutral.mix(warm, t)
    };
    to_color32(Srgb::from_linear(mixed))
}

// ---------------------------------------------------------------------------
// Color mapping: region name → Color32
// ---------------------------------------------------------------------------

/// Maps region names to distinct colours, stable for the session.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from the given region names.
    pub fn new<S: AsRef<str>>(regions: &[S]) -> Self {
        let palette = generate_palette(regions.len());
        let mapping: BTreeMap<String, Color32> = regions
            .iter()
            .zip(palette)
            .map(|(r, c)| (r.as_ref().to_string(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a region.
    pub fn color_for(&self, region: &str) -> Color32 {
        self.mapping
            .get(region)
            .copied()
            .unwrap_or(self.default_color)
    }
}
