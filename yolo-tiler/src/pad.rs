//! Padding of images to a minimum size.

use crate::{
    common::*,
    image_io::{load_image, save_image, ImageOutcome},
    options::{default_image_extensions, DEFAULT_MAX_IMAGE_PIXELS},
    walker::glob_files,
    writer::OutputDirs,
};

/// Pads the images of a folder on the bottom and right with black until
/// they reach the target size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Padder {
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
    pub output: OutputDirs,
    pub target: HW<usize>,
}

/// Counters of a padding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PadSummary {
    pub images_padded: usize,
    pub images_skipped: usize,
    pub labels_missing: usize,
}

impl Padder {
    pub fn run(&self) -> Result<PadSummary> {
        ensure!(
            self.images_dir.is_dir(),
            "image folder '{}' does not exist",
            self.images_dir.display()
        );
        for dir in [&self.output.images, &self.output.labels] {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory '{}'", dir.display()))?;
        }

        let images = glob_files(&self.images_dir, &default_image_extensions())?;

        let mut summary = PadSummary::default();
        for path in &images {
            self.pad_image(path, &mut summary)?;
        }

        info!(
            "Done. {} images padded into '{}'",
            summary.images_padded,
            self.output.images.display()
        );
        Ok(summary)
    }

    fn pad_image(&self, path: &Path, summary: &mut PadSummary) -> Result<()> {
        let image = match load_image(path, DEFAULT_MAX_IMAGE_PIXELS)? {
            ImageOutcome::Decoded(image) => image,
            ImageOutcome::Skipped(reason) => {
                warn!("skip image '{}': {}", path.display(), reason);
                summary.images_skipped += 1;
                return Ok(());
            }
        };
        let file_name = path
            .file_name()
            .ok_or_else(|| format_err!("'{}' has no file name", path.display()))?;

        let (w, h) = (image.width(), image.height());
        let new_w = w.max(u32::try_from(self.target.w())?);
        let new_h = h.max(u32::try_from(self.target.h())?);

        let padded = if (new_w, new_h) == (w, h) {
            image
        } else {
            let mut canvas = DynamicImage::new(new_w, new_h, image.color());
            canvas.copy_from(&image, 0, 0)?;
            canvas
        };
        save_image(&padded, &self.output.images.join(file_name))?;
        summary.images_padded += 1;

        let mut label_name = path.file_stem().unwrap_or_default().to_os_string();
        label_name.push(".txt");
        let label_path = self.labels_dir.join(&label_name);

        let labels = match label::load_label_file(&label_path)? {
            Some(labels) => labels,
            None => {
                warn!("label file '{}' does not exist", label_path.display());
                summary.labels_missing += 1;
                return Ok(());
            }
        };

        let scale = Transform::scaling(
            r64(h as f64 / new_h as f64),
            r64(w as f64 / new_w as f64),
        );
        let labels: Vec<_> = labels
            .iter()
            .map(|label| Ratio(&scale * &label.0))
            .collect();
        label::save_label_file(self.output.labels.join(&label_name), &labels)?;

        Ok(())
    }
}
