//! Border style shared by the registry and render targets

/// Straight-alpha RGBA color, each channel 0.0-1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque red, the color used when a command names none
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
}

impl Default for Rgba {
    fn default() -> Self {
        Self::RED
    }
}

/// How a border is stroked
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderStyle {
    pub color: Rgba,
    /// Stroke width in pixels
    pub width: f64,
    /// Corner radius in pixels
    pub radius: f64,
}

impl BorderStyle {
    pub const fn new(color: Rgba, width: f64, radius: f64) -> Self {
        Self { color, width, radius }
    }
}
