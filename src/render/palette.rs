//! Colour palettes for the chart renderer.

use crate::config::Palette;
use plotters::style::RGBColor;

const GN_BU: [RGBColor; 6] = [
    RGBColor(204, 235, 197),
    RGBColor(168, 221, 181),
    RGBColor(123, 204, 196),
    RGBColor(78, 179, 211),
    RGBColor(43, 140, 190),
    RGBColor(8, 88, 158),
];

const VIRIDIS: [RGBColor; 6] = [
    RGBColor(68, 1, 84),
    RGBColor(65, 68, 135),
    RGBColor(42, 120, 142),
    RGBColor(34, 168, 132),
    RGBColor(122, 209, 81),
    RGBColor(253, 231, 37),
];

const SET3: [RGBColor; 12] = [
    RGBColor(141, 211, 199),
    RGBColor(255, 255, 179),
    RGBColor(190, 186, 218),
    RGBColor(251, 128, 114),
    RGBColor(128, 177, 211),
    RGBColor(253, 180, 98),
    RGBColor(179, 222, 105),
    RGBColor(252, 205, 229),
    RGBColor(217, 217, 217),
    RGBColor(188, 128, 189),
    RGBColor(204, 235, 197),
    RGBColor(255, 237, 111),
];

const DEEP: [RGBColor; 6] = [
    RGBColor(76, 114, 176),
    RGBColor(221, 132, 82),
    RGBColor(85, 168, 104),
    RGBColor(196, 78, 82),
    RGBColor(129, 114, 179),
    RGBColor(147, 120, 96),
];

const COOLWARM: [RGBColor; 3] = [
    RGBColor(59, 76, 192),
    RGBColor(221, 221, 221),
    RGBColor(180, 4, 38),
];

/// Fill for cells with no value.
pub const MISSING: RGBColor = RGBColor(200, 200, 200);

impl Palette {
    /// The palette's anchor colours, first to last.
    pub fn colors(&self) -> &'static [RGBColor] {
        match self {
            Palette::GnBu => &GN_BU,
            Palette::Viridis => &VIRIDIS,
            Palette::Set3 => &SET3,
            Palette::Deep => &DEEP,
            Palette::Coolwarm => &COOLWARM,
        }
    }

    /// Categorical colour for series `index`, cycling past the end.
    pub fn color(&self, index: usize) -> RGBColor {
        let colors = self.colors();
        colors[index % colors.len()]
    }

    /// Continuous colour for `t` in `[0, 1]`, interpolated between anchors.
    pub fn gradient(&self, t: f64) -> RGBColor {
        let colors = self.colors();
        if colors.len() == 1 || !t.is_finite() {
            return colors[0];
        }

        let scaled = t.clamp(0.0, 1.0) * (colors.len() - 1) as f64;
        let lo = (scaled.floor() as usize).min(colors.len() - 2);
        let frac = scaled - lo as f64;

        lerp(colors[lo], colors[lo + 1], frac)
    }
}

fn lerp(a: RGBColor, b: RGBColor, t: f64) -> RGBColor {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Returns true when dark text would be hard to read on `background`.
pub fn is_dark(background: RGBColor) -> bool {
    let luma = 0.299 * background.0 as f64
        + 0.587 * background.1 as f64
        + 0.114 * background.2 as f64;
    luma < 128.0
}
