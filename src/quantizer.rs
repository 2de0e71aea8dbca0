use crate::error::{Error, Result};
use crate::palette::Palette;
use crate::palette_index::PaletteIndex;
use crate::raster::{SourceAnimation, SourceColorTable, SourceImage};
use crate::resolver::PixelResolver;
use image::RgbImage;
use rayon::prelude::*;
use tracing::debug;

/// An image whose every pixel is a member of the palette it was quantized to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedImage {
    image: RgbImage,
}

impl QuantizedImage {
    #[inline(always)]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_inner(self) -> RgbImage {
        self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl From<QuantizedImage> for SourceImage {
    fn from(quantized: QuantizedImage) -> Self {
        SourceImage::Rgb(quantized.image)
    }
}

/// Repaints `image` with the nearest palette colors.
///
/// Rows are processed in parallel. The first unresolvable pixel in row order
/// aborts the whole image.
pub fn quantize_image(
    image: &SourceImage,
    index: &PaletteIndex,
    table: Option<&SourceColorTable>,
) -> Result<QuantizedImage> {
    image.check_dimensions()?;
    let (width, height) = image.dimensions();
    let resolver = PixelResolver::new(image, table);
    let row_len = width as usize * 3;
    let mut buf = vec![0; row_len * height as usize];

    buf.par_chunks_exact_mut(row_len)
        .enumerate()
        .map(|(y, row)| -> Result<()> {
            for (x, pixel) in row.chunks_exact_mut(3).enumerate() {
                let color = index.nearest(resolver.resolve(x as u32, y as u32)?);
                pixel.copy_from_slice(&color.to_array());
            }
            Ok(())
        })
        .collect::<Vec<Result<()>>>()
        .into_iter()
        .collect::<Result<()>>()?;

    let image = RgbImage::from_raw(width, height, buf)
        .ok_or(Error::InvalidDimensions { width, height })?;
    Ok(QuantizedImage { image })
}

/// Quantizes every frame independently, in parallel, keeping frame order.
pub fn quantize_animation(
    animation: &SourceAnimation,
    index: &PaletteIndex,
) -> Result<Vec<QuantizedImage>> {
    let frame_count = animation.frames().len();
    let frames = animation
        .frames()
        .par_iter()
        .map(|frame| quantize_image(frame, index, animation.table()))
        .collect::<Vec<_>>();

    frames
        .into_iter()
        .enumerate()
        .map(|(i, frame)| {
            debug!("Quantized frame {}/{}", i + 1, frame_count);
            frame
        })
        .collect()
}

/// Something that can be repainted with a palette.
pub trait Quantize {
    type Output;

    fn quantize_with(&self, index: &PaletteIndex) -> Result<Self::Output>;
}

/// Direct-color images only. An indexed image needs its color table, see the
/// impl for `(&SourceImage, &SourceColorTable)`.
impl Quantize for SourceImage {
    type Output = QuantizedImage;

    fn quantize_with(&self, index: &PaletteIndex) -> Result<QuantizedImage> {
        quantize_image(self, index, None)
    }
}

impl Quantize for (&SourceImage, &SourceColorTable) {
    type Output = QuantizedImage;

    fn quantize_with(&self, index: &PaletteIndex) -> Result<QuantizedImage> {
        let (image, table) = *self;
        quantize_image(image, index, Some(table))
    }
}

impl Quantize for SourceAnimation {
    type Output = Vec<QuantizedImage>;

    fn quantize_with(&self, index: &PaletteIndex) -> Result<Vec<QuantizedImage>> {
        quantize_animation(self, index)
    }
}

/// Builds a [`PaletteIndex`] for `palette` and quantizes `input` with it.
pub fn quantize<Q: Quantize>(input: &Q, palette: &Palette) -> Result<Q::Output> {
    debug!("Quantizing with palette of {} colors", palette.len());
    input.quantize_with(&PaletteIndex::build(palette))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::raster::IndexedImage;
    use image::{Luma, Rgb, Rgba, RgbaImage};
    use quickcheck::{quickcheck, TestResult};

    fn image_from(width: u32, pixels: &[(u8, u8, u8)]) -> SourceImage {
        let height = pixels.len() as u32 / width;
        let mut img = RgbImage::new(width, height);
        for (pixel, &(r, g, b)) in img.pixels_mut().zip(pixels) {
            *pixel = Rgb([r, g, b]);
        }
        SourceImage::Rgb(img)
    }

    #[test]
    fn test_quantize_two_pixels() {
        let image = image_from(2, &[(255, 255, 255), (0, 0, 0)]);
        let quantized = quantize(&image, &Palette::arcade()).unwrap();
        assert_eq!(quantized.dimensions(), (2, 1));
        assert_eq!(*quantized.image().get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*quantized.image().get_pixel(1, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_rgba_drops_alpha() {
        let image = SourceImage::Rgba(RgbaImage::from_pixel(3, 2, Rgba([250, 40, 30, 0])));
        let quantized = quantize(&image, &Palette::arcade()).unwrap();
        assert!(quantized.image().pixels().all(|p| *p == Rgb([0xff, 0x21, 0x21])));
    }

    #[test]
    fn test_indexed_matches_direct() {
        let mut colors = vec![Color::default(); 5];
        colors.push(Color::new(255, 33, 33));
        let table = SourceColorTable::from_colors(colors);
        let index = PaletteIndex::build(&Palette::arcade());

        let indexed = SourceImage::Indexed(IndexedImage::from_pixel(1, 1, Luma([5])));
        let direct = image_from(1, &[(255, 33, 33)]);
        assert_eq!(
            quantize_image(&indexed, &index, Some(&table)).unwrap(),
            quantize_image(&direct, &index, None).unwrap()
        );
    }

    #[test]
    fn test_quantize_indexed_with_table() {
        let table = SourceColorTable::from_colors([Color::new(2, 2, 2), Color::new(250, 250, 250)]);
        let image = SourceImage::Indexed(IndexedImage::from_fn(2, 1, |x, _| Luma([x as u16])));
        let quantized = quantize(&(&image, &table), &Palette::arcade()).unwrap();
        assert_eq!(*quantized.image().get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*quantized.image().get_pixel(1, 0), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_unresolvable_pixel_aborts() {
        let table = SourceColorTable::from_colors([Color::default(); 2]);
        let mut img = IndexedImage::new(4, 4);
        img.put_pixel(2, 1, Luma([7]));
        img.put_pixel(0, 3, Luma([8]));
        let image = SourceImage::Indexed(img);
        let index = PaletteIndex::build(&Palette::arcade());
        assert!(matches!(
            quantize_image(&image, &index, Some(&table)),
            Err(Error::UnresolvablePixel { x: 2, y: 1, index: 7 })
        ));
    }

    #[test]
    fn test_rejects_empty_image() {
        let image = SourceImage::Rgb(RgbImage::new(0, 3));
        assert!(matches!(
            quantize(&image, &Palette::arcade()),
            Err(Error::InvalidDimensions { width: 0, height: 3 })
        ));
    }

    #[test]
    fn test_animation_keeps_frame_order() {
        let shades = [(250, 250, 250), (5, 5, 5), (250, 30, 30)];
        let frames = shades
            .iter()
            .map(|&shade| image_from(2, &[shade; 4]))
            .collect();
        let animation = SourceAnimation::new(frames, None).unwrap();
        let quantized = quantize(&animation, &Palette::arcade()).unwrap();
        let firsts: Vec<_> = quantized.iter().map(|q| *q.image().get_pixel(0, 0)).collect();
        assert_eq!(
            firsts,
            [Rgb([255, 255, 255]), Rgb([0, 0, 0]), Rgb([0xff, 0x21, 0x21])]
        );
    }

    #[test]
    fn test_animation_reports_first_failing_frame() {
        let table = SourceColorTable::from_colors([Color::default(); 4]);
        let frames = (0..4u16)
            .map(|i| SourceImage::Indexed(IndexedImage::from_pixel(2, 2, Luma([i * 3]))))
            .collect();
        let animation = SourceAnimation::new(frames, Some(table)).unwrap();
        let index = PaletteIndex::build(&Palette::arcade());
        // frames 2 and 3 use indices 6 and 9
        assert!(matches!(
            quantize_animation(&animation, &index),
            Err(Error::UnresolvablePixel { index: 6, .. })
        ));
    }

    #[test]
    fn test_quantize_properties() {
        quickcheck(quantize_properties as fn(Vec<(u8, u8, u8)>, u8) -> TestResult)
    }
    fn quantize_properties(pixels: Vec<(u8, u8, u8)>, width: u8) -> TestResult {
        let width = u32::from(width % 8) + 1;
        if (pixels.len() as u32) < width {
            return TestResult::discard();
        }
        let height = pixels.len() as u32 / width;
        let pixels = &pixels[..(width * height) as usize];
        let palette = Palette::arcade();
        let image = image_from(width, pixels);

        let once = quantize(&image, &palette).unwrap();
        let members = once
            .image()
            .pixels()
            .all(|&p| palette.position(p.into()).is_some());
        let twice = quantize(&SourceImage::from(once.clone()), &palette).unwrap();
        TestResult::from_bool(members && once.dimensions() == (width, height) && once == twice)
    }
}
