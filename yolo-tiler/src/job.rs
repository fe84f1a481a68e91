//! Tiling of the images of one processing unit.

use crate::{
    clip::clip_labels,
    common::*,
    grid::TileGrid,
    image_io::{crop_tile, load_image, ImageOutcome},
    negative::NegativeSampleSink,
    options::TileOptions,
    summary::{ImageReport, TileCounts},
    walker::DatasetUnit,
    writer::{OutputDirs, TileName, TileWriter},
};

/// Everything needed to tile the images of one unit. Built once per unit
/// and never modified afterwards.
#[derive(Debug, Clone)]
pub struct TileJob {
    pub unit: DatasetUnit,
    pub output: OutputDirs,
    pub negatives: Option<NegativeSampleSink>,
    pub options: Arc<TileOptions>,
}

impl TileJob {
    pub fn new(unit: DatasetUnit, output_dir: &Path, options: Arc<TileOptions>) -> Self {
        let output = OutputDirs::under(unit.output_root(output_dir));
        let negatives = options
            .negative_samples_dir
            .as_deref()
            .map(|dir| NegativeSampleSink::new(OutputDirs::under(unit.output_root(dir))));

        Self {
            unit,
            output,
            negatives,
            options,
        }
    }

    /// Create the output folders of the unit. Failures are only logged.
    pub fn prepare_dirs(&self) {
        self.output.create();
        if let Some(negatives) = &self.negatives {
            negatives.dirs().create();
        }
    }

    /// Tile one source image, visiting its tiles in row-major order.
    pub fn tile_image(&self, path: &Path) -> Result<ImageReport> {
        let image = match load_image(path, self.options.max_image_pixels)? {
            ImageOutcome::Decoded(image) => image,
            ImageOutcome::Skipped(reason) => {
                warn!("skip image '{}': {}", path.display(), reason);
                return Ok(ImageReport::Skipped(reason));
            }
        };
        let image_size = HW::from_hw([image.height() as usize, image.width() as usize]);

        let stem = path
            .file_stem()
            .ok_or_else(|| format_err!("'{}' has no file name", path.display()))?;
        let ext = path.extension().unwrap_or_default();

        let label_path = {
            let mut file_name = stem.to_os_string();
            file_name.push(".txt");
            self.unit.labels_dir.join(file_name)
        };
        let labels = match label::load_pixel_labels(&label_path, &image_size)? {
            Some(labels) => labels,
            None => {
                warn!(
                    "label file '{}' does not exist, assuming no objects",
                    label_path.display()
                );
                vec![]
            }
        };
        debug!(
            "'{}' has {} boxes on {}x{} pixels",
            path.display(),
            labels.len(),
            image_size.w(),
            image_size.h()
        );

        let grid = TileGrid::plan(&image_size, self.options.size, self.options.no_padding);
        let writer = TileWriter::new(&self.output, self.negatives.as_ref());
        let mut counts = TileCounts::default();

        for tile in grid.tiles() {
            let tile_labels = clip_labels(&tile, &labels);
            let name = TileName {
                stem,
                row: tile.row,
                col: tile.col,
                ext,
            };
            let outcome = writer.write(&name, &tile_labels, || {
                crop_tile(&image, &tile, self.options.fill_border)
            })?;
            counts.record(outcome);
        }

        Ok(ImageReport::Tiled(counts))
    }
}
