use crate::color::Color;
use crate::error::{Error, Result};
use crate::raster::{SourceColorTable, SourceImage};

/// Turns any source pixel into the RGB color that gets quantized.
///
/// Indexed pixels are looked up in the table captured when the source was
/// decoded, never in anything attached to a resized frame.
#[derive(Debug, Clone, Copy)]
pub struct PixelResolver<'a> {
    image: &'a SourceImage,
    table: Option<&'a SourceColorTable>,
}

impl<'a> PixelResolver<'a> {
    pub fn new(image: &'a SourceImage, table: Option<&'a SourceColorTable>) -> Self {
        Self { image, table }
    }

    pub fn resolve(&self, x: u32, y: u32) -> Result<Color> {
        match self.image {
            SourceImage::Rgb(img) => Ok((*img.get_pixel(x, y)).into()),
            SourceImage::Rgba(img) => {
                let [r, g, b, _] = img.get_pixel(x, y).0;
                Ok(Color::new(r, g, b))
            }
            SourceImage::Indexed(img) => {
                let index = img.get_pixel(x, y).0[0];
                self.table
                    .and_then(|table| table.get(index))
                    .ok_or(Error::UnresolvablePixel { x, y, index })
            }
        }
    }
}
