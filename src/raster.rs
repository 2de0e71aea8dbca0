use crate::color::Color;
use crate::error::{Error, Result};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, RgbImage, RgbaImage};
use rayon::prelude::*;

/// Indices into a [`SourceColorTable`].
pub type IndexedImage = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Number of table slots reserved for each GIF color table.
pub const COLOR_TABLE_SLOTS: usize = 256;

/// Index to color mapping of an indexed source, captured once at decode time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceColorTable {
    entries: Vec<Option<Color>>,
}

impl SourceColorTable {
    pub fn from_colors<I: IntoIterator<Item = Color>>(colors: I) -> Self {
        Self {
            entries: colors.into_iter().map(Some).collect(),
        }
    }

    /// Appends a packed RGB color table in its own block of
    /// [`COLOR_TABLE_SLOTS`] entries and returns the block's offset.
    pub fn append_rgb_table(&mut self, rgb: &[u8]) -> Result<u16> {
        let offset = self.entries.len().next_multiple_of(COLOR_TABLE_SLOTS);
        let offset = u16::try_from(offset).map_err(|_| Error::ColorTableOverflow)?;
        self.entries.resize(offset as usize, None);
        self.entries.extend(
            rgb.chunks_exact(3)
                .take(COLOR_TABLE_SLOTS)
                .map(|c| Some(Color::new(c[0], c[1], c[2]))),
        );
        self.entries.resize(offset as usize + COLOR_TABLE_SLOTS, None);
        Ok(offset)
    }

    #[inline(always)]
    pub fn get(&self, index: u16) -> Option<Color> {
        self.entries.get(index as usize).copied().flatten()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A decoded source image before quantization.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceImage {
    Rgb(RgbImage),
    /// Alpha is dropped when pixels are resolved.
    Rgba(RgbaImage),
    Indexed(IndexedImage),
}

impl SourceImage {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            SourceImage::Rgb(img) => img.dimensions(),
            SourceImage::Rgba(img) => img.dimensions(),
            SourceImage::Indexed(img) => img.dimensions(),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    pub fn check_dimensions(&self) -> Result<()> {
        match self.dimensions() {
            (0, _) | (_, 0) => Err(Error::InvalidDimensions {
                width: self.width(),
                height: self.height(),
            }),
            _ => Ok(()),
        }
    }

    /// Lanczos3 for direct colors. Indexed images are resampled
    /// nearest-neighbour so every pixel stays a table index.
    pub fn resize(&self, width: u32, height: u32) -> SourceImage {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        match self {
            SourceImage::Rgb(img) => {
                SourceImage::Rgb(imageops::resize(img, width, height, FilterType::Lanczos3))
            }
            SourceImage::Rgba(img) => {
                SourceImage::Rgba(imageops::resize(img, width, height, FilterType::Lanczos3))
            }
            SourceImage::Indexed(img) => SourceImage::Indexed(resize_nearest(img, width, height)),
        }
    }
}

/// Samples the source pixel under each target pixel center.
fn resize_nearest(img: &IndexedImage, width: u32, height: u32) -> IndexedImage {
    let (source_width, source_height) = img.dimensions();
    let sample = |target: u32, target_len: u32, source_len: u32| {
        let center = (f64::from(target) + 0.5) * f64::from(source_len) / f64::from(target_len);
        (center as u32).min(source_len - 1)
    };
    IndexedImage::from_fn(width, height, |x, y| {
        *img.get_pixel(
            sample(x, width, source_width),
            sample(y, height, source_height),
        )
    })
}

/// Ordered frames of equal size, with the color table of indexed frames.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAnimation {
    frames: Vec<SourceImage>,
    table: Option<SourceColorTable>,
}

impl SourceAnimation {
    pub fn new(frames: Vec<SourceImage>, table: Option<SourceColorTable>) -> Result<Self> {
        let first = frames.first().ok_or(Error::EmptyAnimation)?;
        first.check_dimensions()?;
        let dimensions = first.dimensions();
        if let Some(frame) = frames.iter().find(|f| f.dimensions() != dimensions) {
            let (width, height) = frame.dimensions();
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(Self { frames, table })
    }

    #[inline(always)]
    pub fn frames(&self) -> &[SourceImage] {
        &self.frames
    }

    #[inline(always)]
    pub fn table(&self) -> Option<&SourceColorTable> {
        self.table.as_ref()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.frames[0].dimensions()
    }

    /// The color table is carried over untouched.
    pub fn resize(&self, width: u32, height: u32) -> SourceAnimation {
        let frames = self
            .frames
            .par_iter()
            .map(|frame| frame.resize(width, height))
            .collect();
        SourceAnimation {
            frames,
            table: self.table.clone(),
        }
    }
}

/// Requested output size. A missing side follows the source aspect ratio.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl TargetSize {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self { width, height }
    }

    pub fn resolve(&self, (source_width, source_height): (u32, u32)) -> Result<(u32, u32)> {
        if source_width == 0 || source_height == 0 {
            return Err(Error::InvalidDimensions {
                width: source_width,
                height: source_height,
            });
        }
        let scale = |value: u32, num: u32, den: u32| {
            (f64::from(value) * f64::from(num) / f64::from(den)).round_ties_even() as u32
        };
        let (width, height) = match (self.width, self.height) {
            (None, None) => (source_width, source_height),
            (Some(width), None) => (width, scale(width, source_height, source_width)),
            (None, Some(height)) => (scale(height, source_width, source_height), height),
            (Some(width), Some(height)) => (width, height),
        };
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok((width, height))
    }
}
