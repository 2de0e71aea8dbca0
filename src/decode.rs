use crate::error::{Error, Result};
use crate::raster::{IndexedImage, SourceAnimation, SourceColorTable, SourceImage};
use gif::{ColorOutput, DecodeOptions, DisposalMethod, Frame};
use image::{ImageReader, Luma};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Decodes a still image. A GIF read this way yields its first frame.
pub fn load_image(path: &Path) -> Result<SourceImage> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    debug!("Decoded {:?} image {}x{}", img.color(), img.width(), img.height());
    Ok(if img.color().has_alpha() {
        SourceImage::Rgba(img.to_rgba8())
    } else {
        SourceImage::Rgb(img.to_rgb8())
    })
}

pub fn load_animation(path: &Path) -> Result<SourceAnimation> {
    decode_animation(BufReader::new(File::open(path)?))
}

/// Decodes only the first frame of a GIF.
pub fn load_first_frame(path: &Path) -> Result<SourceAnimation> {
    decode_gif(BufReader::new(File::open(path)?), Some(1))
}

/// Decodes every frame of a GIF as indices into one [`SourceColorTable`].
///
/// The table holds the global color table followed by every distinct
/// frame-local one, so it stays valid whatever later happens to the frames.
pub fn decode_animation<R: Read>(reader: R) -> Result<SourceAnimation> {
    decode_gif(reader, None)
}

fn decode_gif<R: Read>(reader: R, max_frames: Option<usize>) -> Result<SourceAnimation> {
    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::Indexed);
    let mut decoder = options.read_info(reader)?;

    let mut table = SourceColorTable::default();
    let global = decoder
        .global_palette()
        .map(|rgb| table.append_rgb_table(rgb))
        .transpose()?;
    // Without a global table the background index refers to the table of
    // whichever frame is being disposed. The first local table lands at
    // offset 0, so the initial fill needs no rebasing.
    let background = decoder.bg_color().unwrap_or(0) as u16;
    let background_at = |offset: u16| global.unwrap_or(offset) + background;
    let mut canvas = IndexedImage::from_pixel(
        u32::from(decoder.width()),
        u32::from(decoder.height()),
        Luma([background_at(0)]),
    );
    let mut local_offsets: HashMap<Vec<u8>, u16> = HashMap::new();
    let mut frames = Vec::new();

    while max_frames.map_or(true, |max| frames.len() < max) {
        let Some(frame) = decoder.read_next_frame()? else {
            break;
        };
        let offset = match &frame.palette {
            Some(rgb) => match local_offsets.get(rgb) {
                Some(&offset) => offset,
                None => {
                    let offset = table.append_rgb_table(rgb)?;
                    local_offsets.insert(rgb.clone(), offset);
                    offset
                }
            },
            None => global.ok_or(Error::MissingColorTable)?,
        };

        let previous = (frame.dispose == DisposalMethod::Previous).then(|| canvas.clone());
        paint(&mut canvas, frame, offset);
        frames.push(SourceImage::Indexed(canvas.clone()));

        match frame.dispose {
            DisposalMethod::Background => fill(&mut canvas, frame, background_at(offset)),
            DisposalMethod::Previous => {
                if let Some(previous) = previous {
                    canvas = previous;
                }
            }
            _ => {}
        }
    }

    debug!(
        "Decoded {} GIF frames, color table of {} entries",
        frames.len(),
        table.len()
    );
    SourceAnimation::new(frames, Some(table))
}

/// Visits the canvas pixels covered by `frame` with the frame's own index.
fn frame_pixels<'a>(
    canvas: &IndexedImage,
    frame: &'a Frame<'_>,
) -> impl Iterator<Item = (u32, u32, u8)> + 'a {
    let (left, top) = (u32::from(frame.left), u32::from(frame.top));
    let width = u32::from(frame.width).max(1);
    let (canvas_width, canvas_height) = canvas.dimensions();
    frame
        .buffer
        .iter()
        .enumerate()
        .map(move |(i, &index)| (left + i as u32 % width, top + i as u32 / width, index))
        .filter(move |&(x, y, _)| x < canvas_width && y < canvas_height)
}

fn paint(canvas: &mut IndexedImage, frame: &Frame<'_>, offset: u16) {
    let pixels: Vec<_> = frame_pixels(canvas, frame)
        .filter(|&(_, _, index)| Some(index) != frame.transparent)
        .collect();
    for (x, y, index) in pixels {
        canvas.put_pixel(x, y, Luma([offset + u16::from(index)]));
    }
}

fn fill(canvas: &mut IndexedImage, frame: &Frame<'_>, index: u16) {
    let pixels: Vec<_> = frame_pixels(canvas, frame).collect();
    for (x, y, _) in pixels {
        canvas.put_pixel(x, y, Luma([index]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use gif::Encoder;
    use std::borrow::Cow;

    const GLOBAL: [u8; 9] = [255, 0, 0, 0, 255, 0, 0, 0, 255];

    fn frame(left: u16, top: u16, width: u16, indices: &[u8]) -> Frame<'static> {
        Frame {
            left,
            top,
            width,
            height: indices.len() as u16 / width,
            buffer: Cow::Owned(indices.to_vec()),
            ..Frame::default()
        }
    }

    fn encode(width: u16, height: u16, frames: &[Frame<'_>]) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = Encoder::new(&mut bytes, width, height, &GLOBAL).unwrap();
            for frame in frames {
                encoder.write_frame(frame).unwrap();
            }
        }
        bytes
    }

    fn indices(image: &SourceImage) -> Vec<u16> {
        match image {
            SourceImage::Indexed(img) => img.pixels().map(|p| p.0[0]).collect(),
            other => panic!("expected an indexed frame, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_frames_in_order() {
        let bytes = encode(
            2,
            1,
            &[frame(0, 0, 2, &[0, 1]), frame(0, 0, 2, &[1, 2]), frame(0, 0, 2, &[2, 0])],
        );
        let animation = decode_animation(bytes.as_slice()).unwrap();
        assert_eq!(animation.dimensions(), (2, 1));
        let frames: Vec<_> = animation.frames().iter().map(indices).collect();
        assert_eq!(frames, [vec![0, 1], vec![1, 2], vec![2, 0]]);
        let table = animation.table().unwrap();
        assert_eq!(table.get(0), Some(Color::new(255, 0, 0)));
        assert_eq!(table.get(2), Some(Color::new(0, 0, 255)));
    }

    #[test]
    fn test_partial_frames_compose() {
        let mut second = frame(1, 0, 1, &[2]);
        second.dispose = DisposalMethod::Background;
        let mut third = frame(0, 0, 1, &[1]);
        third.transparent = Some(1);
        let bytes = encode(2, 1, &[frame(0, 0, 2, &[1, 1]), second, third]);
        let animation = decode_animation(bytes.as_slice()).unwrap();
        let frames: Vec<_> = animation.frames().iter().map(indices).collect();
        // background index 0 after the second frame is disposed
        assert_eq!(frames, [vec![1, 1], vec![1, 2], vec![1, 0]]);
    }

    #[test]
    fn test_local_palette_is_rebased() {
        let mut local = frame(0, 0, 1, &[0]);
        local.palette = Some(vec![9, 9, 9]);
        let bytes = encode(1, 1, &[frame(0, 0, 1, &[2]), local]);
        let animation = decode_animation(bytes.as_slice()).unwrap();
        let frames: Vec<_> = animation.frames().iter().map(indices).collect();
        assert_eq!(frames, [vec![2], vec![256]]);
        let table = animation.table().unwrap();
        assert_eq!(table.get(256), Some(Color::new(9, 9, 9)));
        assert_eq!(table.get(2), Some(Color::new(0, 0, 255)));
    }

    /// Drops the global color table the encoder always writes.
    fn without_global_table(mut bytes: Vec<u8>) -> Vec<u8> {
        let table_len = 3 * (2 << (bytes[10] & 0b111));
        bytes[10] &= 0b0111_1111;
        bytes.drain(13..13 + table_len);
        bytes
    }

    #[test]
    fn test_background_uses_disposed_frame_table() {
        let mut first = frame(0, 0, 2, &[1, 1]);
        first.palette = Some(vec![10, 10, 10, 20, 20, 20]);
        let mut second = frame(0, 0, 2, &[1, 1]);
        second.palette = Some(vec![30, 30, 30, 40, 40, 40]);
        second.dispose = DisposalMethod::Background;
        let mut third = frame(1, 0, 1, &[1]);
        third.palette = second.palette.clone();

        let bytes = without_global_table(encode(2, 1, &[first, second, third]));
        let animation = decode_animation(bytes.as_slice()).unwrap();
        let frames: Vec<_> = animation.frames().iter().map(indices).collect();
        assert_eq!(frames, [vec![1, 1], vec![257, 257], vec![256, 257]]);
        let table = animation.table().unwrap();
        assert_eq!(table.get(256), Some(Color::new(30, 30, 30)));
        assert_eq!(table.get(0), Some(Color::new(10, 10, 10)));
    }

    #[test]
    fn test_first_frame_only() {
        let bytes = encode(1, 1, &[frame(0, 0, 1, &[1]), frame(0, 0, 1, &[2])]);
        let animation = decode_gif(bytes.as_slice(), Some(1)).unwrap();
        assert_eq!(animation.frames().len(), 1);
        assert_eq!(indices(&animation.frames()[0]), [1]);
    }

    #[test]
    fn test_not_a_gif() {
        assert!(matches!(
            decode_animation(&b"definitely not a gif"[..]),
            Err(Error::Gif(_))
        ));
    }
}
