//! RGBA colour type used by materials, lights and clear values.
//!
//! Stored as four `f32` values in linear light (0.0 – 1.0).  Hex helpers take
//! sRGB-encoded values, which is how colours are usually written down
//! (`0x00ff88`), and convert them to linear on the way in.
//!
//! # Example
//! ```rust,ignore
//! use arview_core::Color;
//!
//! let mint  = Color::from_rgb_hex(0x00ff88).with_alpha(0.8);
//! let clear = Color::TRANSPARENT;
//! let [r, g, b, a] = mint.to_array();
//! ```

/// Linear-space RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    // ── Constructors ────────────────────────────────────────────────────────

    /// Opaque colour from linear red, green, blue components.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Colour from all four linear components.
    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour from a packed sRGB `0xRRGGBB` value.
    ///
    /// ```rust,ignore
    /// let mint = Color::from_rgb_hex(0x00ff88);
    /// ```
    pub fn from_rgb_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xFF) as f32 / 255.0);
        Self::rgb(channel(16), channel(8), channel(0))
    }

    /// Construct from 8-bit sRGB components including alpha (alpha is linear).
    pub fn from_srgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            srgb_to_linear(r as f32 / 255.0),
            srgb_to_linear(g as f32 / 255.0),
            srgb_to_linear(b as f32 / 255.0),
            a as f32 / 255.0,
        )
    }

    // ── Conversions ─────────────────────────────────────────────────────────

    /// Returns `[r, g, b, a]`.
    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Returns `[r, g, b]` (alpha discarded).
    #[inline]
    pub fn to_rgb_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Returns the colour scaled by `intensity`, as used for light uniforms.
    #[inline]
    pub fn scaled(self, intensity: f32) -> [f32; 3] {
        [self.r * intensity, self.g * intensity, self.b * intensity]
    }

    /// Convert to a `wgpu::Color` for use as a clear value.
    #[cfg(feature = "gpu")]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }

    // ── Modifiers ───────────────────────────────────────────────────────────

    /// Return a new colour with the alpha channel replaced.
    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    // ── Palette ─────────────────────────────────────────────────────────────

    pub const WHITE:       Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK:       Self = Self::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
}

impl From<[f32; 4]> for Color {
    fn from(a: [f32; 4]) -> Self {
        Self::rgba(a[0], a[1], a[2], a[3])
    }
}

impl From<Color> for [f32; 4] {
    fn from(c: Color) -> Self {
        c.to_array()
    }
}

/// sRGB transfer function, decoding direction.
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rgb_hex_decodes_srgb_channels() {
        let c = Color::from_rgb_hex(0x00ff88);
        assert_relative_eq!(c.r, 0.0);
        assert_relative_eq!(c.g, 1.0, epsilon = 1e-6);
        // 0x88 = 136 → ~0.246 in linear light
        assert_relative_eq!(c.b, 0.2462, epsilon = 1e-3);
        assert_relative_eq!(c.a, 1.0);
    }

    #[test]
    fn alpha_override_keeps_rgb() {
        let c = Color::WHITE.with_alpha(0.8);
        assert_eq!(c.to_rgb_array(), [1.0, 1.0, 1.0]);
        assert_relative_eq!(c.a, 0.8);
    }
}
