use crate::decode::{load_animation, load_first_frame, load_image};
use crate::error::Result;
use crate::palette::Palette;
use crate::palette_index::PaletteIndex;
use crate::quantizer::{quantize_animation, quantize_image, QuantizedImage};
use crate::raster::{SourceAnimation, SourceImage, TargetSize};
use crate::serializer::{serialize_animation, serialize_image};
use image::RgbImage;
use std::io::Write;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub size: TargetSize,
    pub palette: Palette,
    /// Read the input as an animated GIF and emit a list of images.
    pub animated: bool,
}

/// Decode, resize, quantize and serialize, with the palette index built once.
#[derive(Debug)]
pub struct Converter {
    options: ConvertOptions,
    index: PaletteIndex,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        debug!("Using palette of {} colors", options.palette.len());
        let index = PaletteIndex::build(&options.palette);
        Self { options, index }
    }

    fn resize_image(&self, image: &SourceImage) -> Result<SourceImage> {
        let (width, height) = self.options.size.resolve(image.dimensions())?;
        debug!("New size: {}x{}", width, height);
        Ok(image.resize(width, height))
    }

    fn resize_animation(&self, animation: &SourceAnimation) -> Result<SourceAnimation> {
        let (width, height) = self.options.size.resolve(animation.dimensions())?;
        debug!("New size: {}x{}", width, height);
        Ok(animation.resize(width, height))
    }

    pub fn convert_image(&self, image: &SourceImage) -> Result<String> {
        let resized = self.resize_image(image)?;
        let quantized = quantize_image(&resized, &self.index, None)?;
        serialize_image(&quantized, &self.options.palette)
    }

    pub fn convert_animation(&self, animation: &SourceAnimation) -> Result<String> {
        let resized = self.resize_animation(animation)?;
        let quantized = quantize_animation(&resized, &self.index)?;
        debug!("Serializing {} frames", quantized.len());
        serialize_animation(&quantized, &self.options.palette)
    }

    /// Converts the file at `path` to text.
    pub fn render(&self, path: &Path) -> Result<String> {
        if self.options.animated {
            self.convert_animation(&load_animation(path)?)
        } else {
            self.convert_image(&load_image(path)?)
        }
    }

    /// Converts the file at `path` and writes the text to `w`. Nothing is
    /// written unless the whole conversion succeeds.
    pub fn convert<W: Write>(&self, path: &Path, w: &mut W) -> Result<()> {
        let text = self.render(path)?;
        w.write_all(text.as_bytes())?;
        Ok(())
    }

    /// The quantized image the text would describe. Only the first frame of an
    /// animation is decoded.
    pub fn preview(&self, path: &Path) -> Result<RgbImage> {
        let quantized = if self.options.animated {
            let animation = self.resize_animation(&load_first_frame(path)?)?;
            quantize_first(&animation, &self.index)?
        } else {
            quantize_image(&self.resize_image(&load_image(path)?)?, &self.index, None)?
        };
        Ok(quantized.into_inner())
    }
}

fn quantize_first(animation: &SourceAnimation, index: &PaletteIndex) -> Result<QuantizedImage> {
    quantize_image(&animation.frames()[0], index, animation.table())
}
