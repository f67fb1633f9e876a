//! Pure image transforms for the project pipeline. Each function consumes
//! one encoded image and produces one PNG-encoded image.

use std::io::Cursor;

use image::{imageops::FilterType, DynamicImage, ImageFormat, Rgba};

/// Channel value above which a pixel counts as background. All three color
/// channels must exceed it.
pub const BACKGROUND_THRESHOLD: u8 = 240;

/// Color-threshold background keying: pixels with every channel above
/// [`BACKGROUND_THRESHOLD`] become fully transparent white; everything else
/// passes through untouched.
///
/// Lossy by design: re-running on an image with genuinely light but opaque
/// foreground pixels strips those too.
pub fn strip_background(input: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let mut img = image::load_from_memory(input)?.to_rgba8();
    for px in img.pixels_mut() {
        let [r, g, b, _] = px.0;
        if r > BACKGROUND_THRESHOLD && g > BACKGROUND_THRESHOLD && b > BACKGROUND_THRESHOLD {
            *px = Rgba([255, 255, 255, 0]);
        }
    }
    encode_png(DynamicImage::ImageRgba8(img))
}

/// Double both dimensions with a Lanczos resampler so the result stays
/// smooth instead of pixelated. Repeated calls compound; no count is kept.
pub fn upscale_2x(input: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory(input)?;
    let (w, h) = (img.width(), img.height());
    let enhanced = img.resize_exact(w * 2, h * 2, FilterType::Lanczos3);
    encode_png(enhanced)
}

fn encode_png(img: DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn png_from_pixels(pixels: &[[u8; 4]], width: u32) -> Vec<u8> {
        let height = pixels.len() as u32 / width;
        let mut img = RgbaImage::new(width, height);
        for (i, px) in pixels.iter().enumerate() {
            img.put_pixel(i as u32 % width, i as u32 / width, Rgba(*px));
        }
        encode_png(DynamicImage::ImageRgba8(img)).expect("encode")
    }

    fn pixels_of(png: &[u8]) -> Vec<[u8; 4]> {
        image::load_from_memory(png)
            .expect("decode")
            .to_rgba8()
            .pixels()
            .map(|p| p.0)
            .collect()
    }

    #[test]
    fn bright_pixels_become_transparent_white() {
        let input = png_from_pixels(
            &[
                [255, 255, 255, 255], // pure white background
                [241, 241, 241, 255], // just above threshold on all channels
                [10, 200, 30, 255],   // foreground
                [241, 241, 240, 255], // one channel at the threshold, kept
            ],
            2,
        );
        let out = pixels_of(&strip_background(&input).expect("strip"));
        assert_eq!(out[0], [255, 255, 255, 0]);
        assert_eq!(out[1], [255, 255, 255, 0]);
        assert_eq!(out[2], [10, 200, 30, 255]);
        assert_eq!(out[3], [241, 241, 240, 255]);
    }

    #[test]
    fn boundary_value_is_not_background() {
        // 240 exactly fails the strictly-greater-than test
        let input = png_from_pixels(&[[240, 240, 240, 255]], 1);
        let out = pixels_of(&strip_background(&input).expect("strip"));
        assert_eq!(out[0], [240, 240, 240, 255]);
    }

    #[test]
    fn below_threshold_pixels_roundtrip_identically() {
        let src: Vec<[u8; 4]> = (0u8..16)
            .map(|i| [i * 10, 255 - i * 10, 128, 255])
            .collect();
        let input = png_from_pixels(&src, 4);
        let out = pixels_of(&strip_background(&input).expect("strip"));
        assert_eq!(out, src);
    }

    #[test]
    fn upscale_doubles_dimensions() {
        let input = png_from_pixels(&vec![[90, 90, 90, 255]; 12], 4);
        let out = image::load_from_memory(&upscale_2x(&input).expect("upscale")).expect("decode");
        assert_eq!((out.width(), out.height()), (8, 6));
    }

    #[test]
    fn upscale_handles_one_by_one() {
        let input = png_from_pixels(&[[1, 2, 3, 255]], 1);
        let out = image::load_from_memory(&upscale_2x(&input).expect("upscale")).expect("decode");
        assert_eq!((out.width(), out.height()), (2, 2));
    }

    #[test]
    fn repeated_upscale_compounds() {
        let input = png_from_pixels(&[[9, 9, 9, 255]], 1);
        let once = upscale_2x(&input).expect("once");
        let twice = upscale_2x(&once).expect("twice");
        let out = image::load_from_memory(&twice).expect("decode");
        assert_eq!((out.width(), out.height()), (4, 4));
    }

    #[test]
    fn garbage_input_is_a_decode_error() {
        assert!(strip_background(b"not an image").is_err());
        assert!(upscale_2x(b"not an image").is_err());
    }
}
