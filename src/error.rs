use crate::color::Color;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaletteError {
    #[error("palette cannot be empty")]
    Empty,
    #[error("invalid palette color {token:?}: expected 6 hex digits")]
    InvalidColor { token: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid palette: {0}")]
    Palette(#[from] PaletteError),

    #[error("pixel ({x}, {y}) has color index {index} with no entry in the source color table")]
    UnresolvablePixel { x: u32, y: u32, index: u16 },

    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("animation has no frames")]
    EmptyAnimation,

    #[error("GIF frame has no color table")]
    MissingColorTable,

    #[error("GIF has more local color tables than can be indexed")]
    ColorTableOverflow,

    #[error("color {color} is not a member of the palette")]
    ColorNotInPalette { color: Color },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("GIF decode error: {0}")]
    Gif(#[from] gif::DecodingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
