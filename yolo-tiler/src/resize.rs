//! Shrinking of images to fit a maximum size.

use crate::{
    common::*,
    image_io::{load_image, save_image, ImageOutcome},
    options::{default_image_extensions, DEFAULT_MAX_IMAGE_PIXELS},
    walker::glob_files,
    writer::recreate_dir,
};
use image::imageops::FilterType;

/// Number of images between two progress messages.
const PROGRESS_INTERVAL: usize = 100;

/// Shrinks the images of a folder so that they fit into `max_size`, keeping
/// their aspect ratio. Smaller images are written unchanged.
///
/// `input_dir` either holds the images itself, or holds an `images/` folder
/// next to a `labels/` folder. In the latter case the output mirrors both
/// folders and the label files are copied as they are, since they are
/// normalized by the image size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resizer {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_size: HW<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeSummary {
    pub images_resized: usize,
    pub images_kept: usize,
    pub images_skipped: usize,
    pub labels_copied: usize,
}

impl Resizer {
    pub fn run(&self) -> Result<ResizeSummary> {
        ensure!(
            self.input_dir.is_dir(),
            "input directory '{}' does not exist",
            self.input_dir.display()
        );
        ensure!(
            self.max_size.h() > 0 && self.max_size.w() > 0,
            "the maximum size must not be zero"
        );
        let extensions = default_image_extensions();

        let (images_dir, output_images, with_labels) = {
            let images = glob_files(&self.input_dir, &extensions)?;
            if !images.is_empty() {
                (self.input_dir.clone(), self.output_dir.clone(), false)
            } else {
                let images_dir = self.input_dir.join("images");
                ensure!(
                    !glob_files(&images_dir, &extensions)?.is_empty(),
                    "'{}' contains neither images nor an 'images' folder with images",
                    self.input_dir.display()
                );
                (images_dir, self.output_dir.join("images"), true)
            }
        };

        recreate_dir(&output_images)?;
        info!("resizing images in '{}'", images_dir.display());

        let images = glob_files(&images_dir, &extensions)?;
        let mut summary = ResizeSummary::default();
        for (index, path) in images.iter().enumerate() {
            self.resize_image(path, &output_images, &mut summary)?;

            let done = index + 1;
            if done % PROGRESS_INTERVAL == 0 || done == images.len() {
                info!("=== {} out of {}", done, images.len());
            }
        }

        if with_labels {
            self.copy_labels(&mut summary)?;
        }

        info!("Completed. Saved into '{}'", self.output_dir.display());
        Ok(summary)
    }

    fn resize_image(
        &self,
        path: &Path,
        output_dir: &Path,
        summary: &mut ResizeSummary,
    ) -> Result<()> {
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

        let max_w = u32::try_from(self.max_size.w())?;
        let max_h = u32::try_from(self.max_size.h())?;

        let output = if image.width() <= max_w && image.height() <= max_h {
            summary.images_kept += 1;
            image
        } else {
            summary.images_resized += 1;
            image.resize(max_w, max_h, FilterType::CatmullRom)
        };
        save_image(&output, &output_dir.join(file_name))
    }

    fn copy_labels(&self, summary: &mut ResizeSummary) -> Result<()> {
        let labels_dir = self.input_dir.join("labels");
        if !labels_dir.is_dir() {
            warn!(
                "'{}' does not exist, only images are written",
                labels_dir.display()
            );
            return Ok(());
        }

        let output_labels = self.output_dir.join("labels");
        recreate_dir(&output_labels)?;

        for source in glob_files(&labels_dir, &["txt"])? {
            let target = output_labels.join(source.file_name().unwrap_or_default());
            fs::copy(&source, &target).with_context(|| {
                format!(
                    "failed to copy '{}' to '{}'",
                    source.display(),
                    target.display()
                )
            })?;
            summary.labels_copied += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn save(path: &Path, w: u32, h: u32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([10, 20, 30])))
            .save(path)
            .unwrap();
    }

    fn dimensions(path: &Path) -> (u32, u32) {
        let image = image::open(path).unwrap();
        (image.width(), image.height())
    }

    #[test]
    fn shrink_flat_folder() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input");
        save(&input.join("wide.png"), 400, 100);
        save(&input.join("small.png"), 50, 40);
        fs::write(input.join("notes.txt"), "not an image").unwrap();

        let output = dir.path().join("output");
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("stale.png"), b"").unwrap();

        let resizer = Resizer {
            input_dir: input,
            output_dir: output.clone(),
            max_size: HW::from_hw([100, 200]),
        };
        let summary = resizer.run().unwrap();

        assert_eq!(
            summary,
            ResizeSummary {
                images_resized: 1,
                images_kept: 1,
                images_skipped: 0,
                labels_copied: 0,
            }
        );
        assert_eq!(dimensions(&output.join("wide.png")), (200, 50));
        assert_eq!(dimensions(&output.join("small.png")), (50, 40));
        assert!(!output.join("stale.png").exists());
        assert!(!output.join("notes.txt").exists());
    }

    #[test]
    fn shrink_images_folder_and_copy_labels() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input");
        save(&input.join("images/tall.jpg"), 100, 300);
        fs::create_dir_all(input.join("labels")).unwrap();
        fs::write(input.join("labels/tall.txt"), "0 0.5 0.5 0.2 0.2\n").unwrap();

        let output = dir.path().join("output");
        let resizer = Resizer {
            input_dir: input,
            output_dir: output.clone(),
            max_size: HW::from_hw([150, 150]),
        };
        let summary = resizer.run().unwrap();

        assert_eq!(summary.images_resized, 1);
        assert_eq!(summary.labels_copied, 1);
        assert_eq!(dimensions(&output.join("images/tall.jpg")), (50, 150));
        assert_eq!(
            fs::read_to_string(output.join("labels/tall.txt")).unwrap(),
            "0 0.5 0.5 0.2 0.2\n"
        );
    }

    #[test]
    fn folder_without_images_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("input/labels")).unwrap();
        let resizer = Resizer {
            input_dir: dir.path().join("input"),
            output_dir: dir.path().join("output"),
            max_size: HW::from_hw([720, 1280]),
        };
        assert!(resizer.run().is_err());
    }
}
