//! The YOLO label file format.
//!
//! Each non-blank line describes one object as five whitespace separated
//! fields, `class cx cy w h`, where the box coordinates are fractions of the
//! image width and height.

use crate::{Label, Pixel, Ratio};
use anyhow::{bail, format_err, Context, Result};
use bbox::{prelude::*, CyCxHW, Transform, HW, TLBR};
use noisy_float::prelude::*;
use num_traits::Float as _;
use std::{fmt, fs, io, path::Path};

/// A label in normalized coordinates, as stored in label files.
pub type RatioLabel = Ratio<Label<CyCxHW<R64>, usize>>;

/// A label in pixel coordinates of its owning image.
pub type PixelLabel = Pixel<Label<TLBR<R64>, usize>>;

/// Number of decimal places written for each coordinate.
pub const DECIMAL_PLACES: usize = 6;

impl Ratio<Label<CyCxHW<R64>, usize>> {
    pub fn new(class: usize, rect: CyCxHW<R64>) -> Self {
        Ratio(Label { rect, class })
    }

    /// Scale the normalized box by the image size.
    pub fn to_pixel(&self, image_size: &HW<usize>) -> PixelLabel {
        let scale = Transform::scaling(r64(image_size.h() as f64), r64(image_size.w() as f64));
        let Label { rect, class } = &scale * &self.0;
        Pixel(Label {
            rect: TLBR::from(&rect),
            class,
        })
    }
}

impl fmt::Display for Ratio<Label<CyCxHW<R64>, usize>> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Label { ref rect, class } = self.0;
        write!(
            f,
            "{} {:.prec$} {:.prec$} {:.prec$} {:.prec$}",
            class,
            rect.cx().raw(),
            rect.cy().raw(),
            rect.w().raw(),
            rect.h().raw(),
            prec = DECIMAL_PLACES
        )
    }
}

/// Parse one line of a label file. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<RatioLabel>> {
    let tokens: Vec<_> = line.split_whitespace().collect();
    let (class, cx, cy, w, h) = match *tokens.as_slice() {
        [] => return Ok(None),
        [class, cx, cy, w, h] => (class, cx, cy, w, h),
        ref other => bail!(
            "expect 5 fields 'class cx cy w h', but found {}",
            other.len()
        ),
    };

    let class: usize = class
        .parse()
        .with_context(|| format!("invalid class id '{}'", class))?;
    // a negative extent spans the same box with its edges swapped
    let rect = CyCxHW::from_cycxhw([
        parse_coord(cy)?,
        parse_coord(cx)?,
        parse_coord(h)?.abs(),
        parse_coord(w)?.abs(),
    ]);

    Ok(Some(RatioLabel::new(class, rect)))
}

fn parse_coord(token: &str) -> Result<R64> {
    let value: f64 = token
        .parse()
        .with_context(|| format!("invalid coordinate '{}'", token))?;
    R64::try_new(value).ok_or_else(|| format_err!("coordinate '{}' is not finite", token))
}

/// Parse the whole text of a label file.
pub fn parse_labels(text: &str) -> Result<Vec<RatioLabel>> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            parse_line(line)
                .with_context(|| format!("malformed label at line {}", index + 1))
                .transpose()
        })
        .collect()
}

/// Render labels as label file text, one newline-terminated line per label.
pub fn format_labels(labels: &[RatioLabel]) -> String {
    labels.iter().map(|label| format!("{}\n", label)).collect()
}

/// Load a label file. A file that does not exist yields `Ok(None)`.
pub fn load_label_file(path: impl AsRef<Path>) -> Result<Option<Vec<RatioLabel>>> {
    let path = path.as_ref();
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read label file '{}'", path.display()))
        }
    };
    let labels =
        parse_labels(&text).with_context(|| format!("failed to parse '{}'", path.display()))?;
    Ok(Some(labels))
}

/// Load a label file and scale its boxes to pixel coordinates of an image
/// with the given size.
pub fn load_pixel_labels(
    path: impl AsRef<Path>,
    image_size: &HW<usize>,
) -> Result<Option<Vec<PixelLabel>>> {
    let labels = load_label_file(path)?.map(|labels| {
        labels
            .iter()
            .map(|label| label.to_pixel(image_size))
            .collect()
    });
    Ok(labels)
}

/// Write labels to a label file. An empty slice produces an empty file.
pub fn save_label_file(path: impl AsRef<Path>, labels: &[RatioLabel]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, format_labels(labels))
        .with_context(|| format!("failed to write label file '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn parse_valid_line() {
        let label = parse_line("3 0.5 0.25 0.1 0.2").unwrap().unwrap();
        assert_eq!(label.class, 3);
        assert_abs_diff_eq!(label.rect.cx().raw(), 0.5);
        assert_abs_diff_eq!(label.rect.cy().raw(), 0.25);
        assert_abs_diff_eq!(label.rect.w().raw(), 0.1);
        assert_abs_diff_eq!(label.rect.h().raw(), 0.2);

        assert!(parse_line("  \t ").unwrap().is_none());
        assert!(parse_line("1\t0.5  0.5 0.1 0.1\r").unwrap().is_some());
    }

    #[test]
    fn reject_malformed_lines() {
        assert!(parse_line("0 0.5 0.5 0.1").is_err());
        assert!(parse_line("0 0.5 0.5 0.1 0.1 0.1").is_err());
        assert!(parse_line("car 0.5 0.5 0.1 0.1").is_err());
        assert!(parse_line("0 0.5 abc 0.1 0.1").is_err());
        assert!(parse_line("0 0.5 NaN 0.1 0.1").is_err());
    }

    #[test]
    fn accept_unchecked_values() {
        let label = parse_line("0 0.5 0.5 -0.1 0.1").unwrap().unwrap();
        assert_abs_diff_eq!(label.rect.w().raw(), 0.1);
        assert_abs_diff_eq!(label.rect.h().raw(), 0.1);

        let outside = parse_line("4 1.5 -0.2 0.3 2.0").unwrap().unwrap();
        assert_eq!(outside.class, 4);
        assert_abs_diff_eq!(outside.rect.cx().raw(), 1.5);
        assert_abs_diff_eq!(outside.rect.cy().raw(), -0.2);
    }

    #[test]
    fn malformed_file_reports_line_number() {
        let err = parse_labels("0 0.5 0.5 0.1 0.1\n\n0 0.5 0.5\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));
    }

    #[test]
    fn scale_to_pixels() {
        let label = parse_line("1 0.15 0.5 0.1 0.2").unwrap().unwrap();
        let size = HW::from_hw([700, 1000]);
        let Label { rect, class } = label.to_pixel(&size).0;
        let [t, l, b, r] = rect.tlbr();
        assert_eq!(class, 1);
        assert_abs_diff_eq!(t.raw(), 280.0, epsilon = 1e-9);
        assert_abs_diff_eq!(l.raw(), 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.raw(), 420.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.raw(), 200.0, epsilon = 1e-9);
    }

    #[test]
    fn format_six_decimals() {
        let label = RatioLabel::new(
            2,
            CyCxHW::from_cycxhw([r64(0.234375), r64(0.234375), r64(0.15625), r64(0.15625)]),
        );
        assert_eq!(label.to_string(), "2 0.234375 0.234375 0.156250 0.156250");

        let third = RatioLabel::new(
            0,
            CyCxHW::from_cycxhw([r64(1.0 / 3.0), r64(2.0 / 3.0), r64(0.5), r64(0.25)]),
        );
        assert_eq!(
            format_labels(&[third]),
            "0 0.666667 0.333333 0.250000 0.500000\n"
        );
    }

    #[test]
    fn missing_label_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        assert!(load_label_file(&path).unwrap().is_none());

        save_label_file(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert_eq!(load_label_file(&path).unwrap(), Some(vec![]));
    }

    #[test]
    fn load_pixel_labels_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.txt");
        fs::write(&path, "0 0.5 0.5 0.2 0.2\n4 0.1 0.1 0.2 0.2\n").unwrap();

        let size = HW::from_hw([100, 200]);
        let labels = load_pixel_labels(&path, &size).unwrap().unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1].class, 4);
        let [t, l, b, r] = labels[0].rect.tlbr();
        assert_abs_diff_eq!(t.raw(), 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(l.raw(), 80.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.raw(), 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.raw(), 120.0, epsilon = 1e-9);
    }
}
