//! MakeCode Arcade image literals.
//!
//! A single image is written as
//!
//! ```text
//! img`
//! 0110
//! 1001
//! `
//! ```
//!
//! with one token per pixel, the token being the pixel's position in the
//! palette. An animation is a bracketed list of such literals, each indented
//! one level deeper and followed by a comma.

use crate::color::Color;
use crate::error::{Error, Result};
use crate::palette::Palette;
use crate::quantizer::QuantizedImage;
use std::collections::HashMap;

const OPEN: &str = "img`";
const CLOSE: &str = "`";
const INDENT: &str = "    ";

/// Token lookup for one palette, first position wins for repeated colors.
struct Tokens {
    by_color: HashMap<Color, String>,
}

impl Tokens {
    fn new(palette: &Palette) -> Self {
        let by_color = palette
            .positions()
            .into_iter()
            .map(|(color, position)| (color, palette.token(position)))
            .collect();
        Self { by_color }
    }

    fn write_rows(&self, image: &QuantizedImage, indent: &str, out: &mut String) -> Result<()> {
        for row in image.image().rows() {
            out.push_str(indent);
            for pixel in row {
                let color = Color::from(*pixel);
                let token = self
                    .by_color
                    .get(&color)
                    .ok_or(Error::ColorNotInPalette { color })?;
                out.push_str(token);
            }
            out.push('\n');
        }
        Ok(())
    }
}

pub fn serialize_image(image: &QuantizedImage, palette: &Palette) -> Result<String> {
    let tokens = Tokens::new(palette);
    let mut out = String::new();
    out.push_str(OPEN);
    out.push('\n');
    tokens.write_rows(image, "", &mut out)?;
    out.push_str(CLOSE);
    Ok(out)
}

pub fn serialize_animation(frames: &[QuantizedImage], palette: &Palette) -> Result<String> {
    let tokens = Tokens::new(palette);
    let row_indent = INDENT.repeat(2);
    let mut out = String::from("[\n");
    for frame in frames {
        out.push_str(INDENT);
        out.push_str(OPEN);
        out.push('\n');
        tokens.write_rows(frame, &row_indent, &mut out)?;
        out.push_str(INDENT);
        out.push_str(CLOSE);
        out.push_str(",\n");
    }
    out.push(']');
    Ok(out)
}
