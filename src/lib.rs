//! Convert images and animated GIFs into MakeCode Arcade images.
//!
//! Every pixel is replaced by the closest palette color in RGB space and the
//! result is written as `img` literals whose tokens are palette positions.
//!
//! ```
//! use arcade_img::{quantize, serialize_image, Palette, SourceImage};
//! use image::{Rgb, RgbImage};
//!
//! let mut img = RgbImage::new(2, 1);
//! img.put_pixel(0, 0, Rgb([255, 255, 255]));
//! let palette = Palette::arcade();
//! let quantized = quantize(&SourceImage::Rgb(img), &palette).unwrap();
//! assert_eq!(serialize_image(&quantized, &palette).unwrap(), "img`\n10\n`");
//! ```

pub mod color;
pub mod converter;
pub mod decode;
pub mod error;
pub mod palette;
pub mod palette_index;
pub mod quantizer;
pub mod raster;
pub mod resolver;
pub mod serializer;

pub use color::{distance, Color};
pub use converter::{ConvertOptions, Converter};
pub use error::{Error, PaletteError, Result};
pub use palette::{Palette, ARCADE_PALETTE};
pub use palette_index::PaletteIndex;
pub use quantizer::{quantize, QuantizedImage, Quantize};
pub use raster::{IndexedImage, SourceAnimation, SourceColorTable, SourceImage, TargetSize};
pub use resolver::PixelResolver;
pub use serializer::{serialize_animation, serialize_image};
