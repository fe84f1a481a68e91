//! Image decoding with a decompression guard, tile cropping and encoding.

use crate::{common::*, grid::Tile};
use image::{ColorType, ImageReader, Limits};

/// Upper bound of decoded bytes per pixel, reached by 32-bit float RGBA.
const MAX_BYTES_PER_PIXEL: u64 = 16;

/// The result of trying to load a source image.
#[derive(Debug)]
pub enum ImageOutcome {
    Decoded(DynamicImage),
    Skipped(SkipReason),
}

/// Why a source image was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Oversized(String),
    Corrupt(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oversized(detail) => write!(f, "image is too large ({})", detail),
            Self::Corrupt(detail) => write!(f, "image cannot be decoded ({})", detail),
        }
    }
}

/// Decode an image unless it exceeds `max_pixels`.
///
/// Oversized, corrupt and unsupported images are reported as
/// [ImageOutcome::Skipped]. Other I/O failures are errors.
pub fn load_image(path: &Path, max_pixels: u64) -> Result<ImageOutcome> {
    if let Ok(size) = imagesize::size(path) {
        let pixels = size.width as u64 * size.height as u64;
        if pixels > max_pixels {
            let detail = format!(
                "{}x{} exceeds the limit of {} pixels",
                size.width, size.height, max_pixels
            );
            return Ok(ImageOutcome::Skipped(SkipReason::Oversized(detail)));
        }
    }

    let mut reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .with_context(|| format!("failed to open image '{}'", path.display()))?;
    let mut limits = Limits::default();
    limits.max_alloc = Some(max_pixels.saturating_mul(MAX_BYTES_PER_PIXEL));
    reader.limits(limits);

    let outcome = match reader.decode() {
        Ok(image) => ImageOutcome::Decoded(image),
        Err(err @ ImageError::Limits(_)) => {
            ImageOutcome::Skipped(SkipReason::Oversized(err.to_string()))
        }
        Err(err @ (ImageError::Decoding(_) | ImageError::Unsupported(_))) => {
            ImageOutcome::Skipped(SkipReason::Corrupt(err.to_string()))
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to decode '{}'", path.display()))
        }
    };
    Ok(outcome)
}

/// Copy the region of a tile out of the image.
///
/// Border tiles are smaller than the slice size unless `fill_border` is set,
/// in which case they are pasted onto a black canvas of the full size.
pub fn crop_tile(image: &DynamicImage, tile: &Tile, fill_border: bool) -> Result<DynamicImage> {
    let [t, l, b, r] = tile.crop_rect().tlbr();
    let crop = image.crop_imm(
        u32::try_from(l)?,
        u32::try_from(t)?,
        u32::try_from(r - l)?,
        u32::try_from(b - t)?,
    );

    if !(fill_border && tile.is_partial()) {
        return Ok(crop);
    }

    let nominal = tile.nominal();
    let mut canvas = DynamicImage::new(
        u32::try_from(nominal.w())?,
        u32::try_from(nominal.h())?,
        crop.color(),
    );
    canvas.copy_from(&crop, 0, 0)?;
    Ok(canvas)
}

/// Encode an image in the format implied by the file extension.
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("unknown image format of '{}'", path.display()))?;

    // JPEG has no alpha channel nor 16-bit samples
    let to_rgb8 = format == ImageFormat::Jpeg
        && !matches!(image.color(), ColorType::L8 | ColorType::Rgb8);
    let result = if to_rgb8 {
        DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(path, format)
    } else {
        image.save_with_format(path, format)
    };
    result.with_context(|| format!("failed to write image '{}'", path.display()))
}
