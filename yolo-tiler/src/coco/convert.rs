use super::{CocoAnnotation, CocoDataset, CocoImage};
use crate::{
    common::*,
    options::default_image_extensions,
    writer::{recreate_dir, OutputDirs},
};

/// Converts a COCO annotation file into per-image YOLO label files and
/// copies the labelled images next to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CocoToYolo {
    pub image_dir: PathBuf,
    pub json_path: PathBuf,
    pub output: OutputDirs,
    /// Do not write label files for images without annotations.
    pub remove_empty: bool,
    /// Keep identical label lines of an image.
    pub keep_duplicates: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub label_files: usize,
    pub boxes_written: usize,
    pub boxes_skipped: usize,
    pub images_copied: usize,
    pub images_missing: usize,
}

impl CocoToYolo {
    pub fn run(&self) -> Result<ConvertSummary> {
        let mut dataset = CocoDataset::open(&self.json_path)?;
        let verification = dataset.verify(false);
        ensure!(
            verification.is_valid(),
            "'{}' is not a valid COCO annotation file: {}",
            self.json_path.display(),
            verification.issues.iter().join("; ")
        );

        self.clear_output()?;

        let mut summary = ConvertSummary::default();
        let stems = self.write_labels(&dataset, &mut summary)?;
        self.copy_images(&stems, &mut summary)?;

        info!(
            "Done. {} label files and {} images saved into '{}'",
            summary.label_files,
            summary.images_copied,
            self.output.labels.parent().unwrap_or(&self.output.labels).display()
        );
        Ok(summary)
    }

    fn clear_output(&self) -> Result<()> {
        recreate_dir(&self.output.images)?;
        recreate_dir(&self.output.labels)?;
        Ok(())
    }

    /// Write label files and return the stems of the written files.
    fn write_labels(
        &self,
        dataset: &CocoDataset,
        summary: &mut ConvertSummary,
    ) -> Result<Vec<String>> {
        let images: HashMap<i64, &CocoImage> =
            dataset.images.iter().map(|image| (image.id, image)).collect();

        let mut labels: IndexMap<i64, Vec<RatioLabel>> = IndexMap::new();
        for ann in &dataset.annotations {
            let image = images
                .get(&ann.image_id)
                .ok_or_else(|| format_err!("image {} does not exist", ann.image_id))?;
            match to_yolo_label(ann, image)? {
                Some(label) => labels.entry(ann.image_id).or_default().push(label),
                None => {
                    warn!(
                        "skip annotation {} of image {}: the box is missing or lies outside the image",
                        ann.id, ann.image_id
                    );
                    summary.boxes_skipped += 1;
                }
            }
        }

        let mut stems = vec![];
        for image in &dataset.images {
            let image_labels = labels.get(&image.id);
            if image_labels.is_none() && self.remove_empty {
                continue;
            }

            let lines: Vec<RatioLabel> = match image_labels {
                Some(image_labels) if !self.keep_duplicates => image_labels
                    .iter()
                    .copied()
                    .unique_by(|label| label.to_string())
                    .collect(),
                Some(image_labels) => image_labels.clone(),
                None => vec![],
            };

            let stem = file_stem(image)?;
            label::save_label_file(self.output.labels.join(format!("{}.txt", stem)), &lines)?;
            summary.label_files += 1;
            summary.boxes_written += lines.len();
            stems.push(stem);
        }

        Ok(stems)
    }

    fn copy_images(&self, stems: &[String], summary: &mut ConvertSummary) -> Result<()> {
        let extensions = default_image_extensions();

        for (index, stem) in stems.iter().enumerate() {
            let source = extensions
                .iter()
                .map(|ext| self.image_dir.join(format!("{}.{}", stem, ext)))
                .find(|path| path.is_file());

            match source {
                Some(source) => {
                    let target = self.output.images.join(source.file_name().unwrap_or_default());
                    fs::copy(&source, &target).with_context(|| {
                        format!(
                            "failed to copy '{}' to '{}'",
                            source.display(),
                            target.display()
                        )
                    })?;
                    summary.images_copied += 1;
                }
                None => {
                    warn!("no image found for label file '{}.txt'", stem);
                    summary.images_missing += 1;
                }
            }

            if (index + 1) % 100 == 0 {
                info!("=== copied {} out of {} images", index + 1, stems.len());
            }
        }

        Ok(())
    }
}

fn file_stem(image: &CocoImage) -> Result<String> {
    let file_name = image
        .file_name
        .as_deref()
        .ok_or_else(|| format_err!("image {} has no 'file_name'", image.id))?;
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| format_err!("invalid file name '{}' of image {}", file_name, image.id))?;
    Ok(stem.to_owned())
}

/// Normalize a COCO box by the image size. Returns `None` if the annotation
/// has no box or the box does not lie inside the image.
fn to_yolo_label(ann: &CocoAnnotation, image: &CocoImage) -> Result<Option<RatioLabel>> {
    let (w_img, h_img) = match (image.width, image.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w as f64, h as f64),
        _ => bail!("image {} has no valid 'width' and 'height'", image.id),
    };
    let class = usize::try_from(ann.category_id - 1)
        .with_context(|| format!("invalid category id {}", ann.category_id))?;

    let [x, y, w, h] = match ann.bbox {
        Some(bbox) => bbox,
        None => return Ok(None),
    };
    let inside = x >= 0.0 && y >= 0.0 && w >= 0.0 && h >= 0.0 && x + w <= w_img && y + h <= h_img;
    if !inside {
        return Ok(None);
    }

    let rect = match CyCxHW::try_from_tlhw([r64(y), r64(x), r64(h), r64(w)]) {
        Ok(rect) => rect,
        Err(_) => return Ok(None),
    };
    let to_ratio = Transform::scaling(r64(1.0 / h_img), r64(1.0 / w_img));
    Ok(Some(RatioLabel::new(class, &to_ratio * &rect)))
}
