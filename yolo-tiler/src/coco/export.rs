use super::{CocoAnnotation, CocoCategory, CocoDataset, CocoImage};
use crate::{common::*, options::default_image_extensions, walker::glob_files};
use serde_json::json;

/// Collects YOLO label files into one COCO annotation file.
///
/// `source` is either a dataset folder with `images/` and `labels/`, or a
/// text file listing one image path per line. The label file of an image
/// is looked up in the `labels/` folder next to the image's folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YoloToCoco {
    pub source: PathBuf,
    pub json_path: PathBuf,
    /// Class names in class index order.
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub images: usize,
    pub annotations: usize,
    pub images_without_labels: usize,
}

impl YoloToCoco {
    pub fn run(&self) -> Result<ExportSummary> {
        ensure!(!self.classes.is_empty(), "at least one class name is required");
        let image_paths = self.image_paths()?;

        let mut summary = ExportSummary::default();
        let mut images = vec![];
        let mut annotations = vec![];

        for (index, path) in image_paths.iter().enumerate() {
            let image_id = index as i64 + 1;
            let size = imagesize::size(path)
                .with_context(|| format!("failed to read the size of '{}'", path.display()))?;
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| format_err!("invalid file name '{}'", path.display()))?;
            images.push(CocoImage {
                id: image_id,
                file_name: Some(file_name.to_owned()),
                width: Some(size.width as u64),
                height: Some(size.height as u64),
                extra: IndexMap::new(),
            });

            let label_path = label_path_of(path)?;
            let image_size = HW::from_hw([size.height, size.width]);
            let labels = match label::load_pixel_labels(&label_path, &image_size)? {
                Some(labels) => labels,
                None => {
                    debug!("no label file '{}'", label_path.display());
                    summary.images_without_labels += 1;
                    continue;
                }
            };

            for label in labels {
                ensure!(
                    label.class < self.classes.len(),
                    "class {} in '{}' has no name, {} class names were given",
                    label.class,
                    label_path.display(),
                    self.classes.len()
                );
                annotations.push(to_coco_annotation(
                    annotations.len() as i64 + 1,
                    image_id,
                    &label,
                ));
            }

            if (index + 1) % 100 == 0 {
                info!("=== {} out of {}", index + 1, image_paths.len());
            }
        }

        let categories = self
            .classes
            .iter()
            .enumerate()
            .map(|(index, name)| CocoCategory {
                id: index as i64 + 1,
                name: Some(name.clone()),
                extra: IndexMap::new(),
            })
            .collect();

        summary.images = images.len();
        summary.annotations = annotations.len();
        let dataset = CocoDataset {
            images,
            annotations,
            categories,
            extra: IndexMap::new(),
        };
        dataset.save(&self.json_path)?;

        info!(
            "Done. {} images and {} annotations saved into '{}'",
            summary.images,
            summary.annotations,
            self.json_path.display()
        );
        Ok(summary)
    }

    fn image_paths(&self) -> Result<Vec<PathBuf>> {
        if self.source.is_dir() {
            let images_dir = self.source.join("images");
            ensure!(
                images_dir.is_dir(),
                "'{}' has no 'images' folder",
                self.source.display()
            );
            return glob_files(&images_dir, &default_image_extensions());
        }

        let text = fs::read_to_string(&self.source)
            .with_context(|| format!("failed to read '{}'", self.source.display()))?;
        let paths = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect();
        Ok(paths)
    }
}

/// `<dir>/images/a.jpg` has its labels in `<dir>/labels/a.txt`.
fn label_path_of(image_path: &Path) -> Result<PathBuf> {
    let stem = image_path
        .file_stem()
        .ok_or_else(|| format_err!("'{}' has no file name", image_path.display()))?;
    let dataset_dir = image_path
        .parent()
        .and_then(Path::parent)
        .ok_or_else(|| format_err!("'{}' is not inside an images folder", image_path.display()))?;
    Ok(dataset_dir
        .join("labels")
        .join(stem)
        .with_extension("txt"))
}

/// Boxes are truncated to whole pixels.
fn to_coco_annotation(id: i64, image_id: i64, label: &PixelLabel) -> CocoAnnotation {
    let rect = &label.rect;
    let x = rect.l().raw().trunc();
    let y = rect.t().raw().trunc();
    let w = rect.w().raw().trunc();
    let h = rect.h().raw().trunc();

    let mut extra = IndexMap::new();
    extra.insert("area".to_owned(), json!(w * h));
    CocoAnnotation {
        id,
        image_id,
        category_id: label.class as i64 + 1,
        bbox: Some([x, y, w, h]),
        extra,
    }
}
