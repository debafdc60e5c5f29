//! Colours used by particles and the penlight.
//!
//! Colours are stored as 8-bit RGB so they compare exactly; the renderer
//! side converts with [`Color::to_rgb_f32`].

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb8(255, 255, 255);

    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Normalised `[r, g, b]` in 0-1.
    pub fn to_rgb_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Image colours of the virtual singers.
pub mod palette {
    use super::Color;

    pub const MIKU: Color = Color::rgb8(57, 197, 187);
    pub const MIKU_PALE: Color = Color::rgb8(232, 242, 241);

    pub const RIN: Color = Color::rgb8(255, 85, 0);
    pub const RIN_PALE: Color = Color::rgb8(255, 244, 226);

    pub const LEN: Color = Color::rgb8(255, 188, 17);
    pub const LEN_PALE: Color = Color::rgb8(255, 252, 233);

    pub const LUKA: Color = Color::rgb8(255, 125, 144);
    pub const LUKA_PALE: Color = Color::rgb8(255, 240, 243);

    pub const MEIKO: Color = Color::rgb8(216, 0, 0);
    pub const MEIKO_PALE: Color = Color::rgb8(249, 227, 229);

    pub const KAITO: Color = Color::rgb8(0, 0, 255);
    pub const KAITO_PALE: Color = Color::rgb8(239, 239, 249);

    /// Colours auto-created particles pick from.
    pub const SINGERS: [Color; 6] = [MIKU, RIN, LEN, LUKA, MEIKO, KAITO];

    /// Look up a singer's image colour by character name.
    pub fn image_color(name: &str) -> Option<Color> {
        match name {
            "Miku" => Some(MIKU),
            "Rin" => Some(RIN),
            "Len" => Some(LEN),
            "Luka" => Some(LUKA),
            "Meiko" => Some(MEIKO),
            "Kaito" => Some(KAITO),
            _ => None,
        }
    }
}
