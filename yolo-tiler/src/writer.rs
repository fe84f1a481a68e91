//! Persistence of tiles into an output tree.

use crate::{
    common::*,
    image_io::save_image,
    negative::NegativeSampleSink,
};
use std::ffi::{OsStr, OsString};

/// The `images/` and `labels/` folder pair of an output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    pub images: PathBuf,
    pub labels: PathBuf,
}

impl OutputDirs {
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            images: root.join("images"),
            labels: root.join("labels"),
        }
    }

    /// Create both folders. Failures are logged, not returned, and show up
    /// later as write errors if the folders are still missing.
    pub fn create(&self) -> bool {
        let failures = [&self.images, &self.labels]
            .into_iter()
            .filter(|dir| {
                fs::create_dir_all(dir)
                    .map_err(|err| {
                        warn!("failed to create directory '{}': {}", dir.display(), err)
                    })
                    .is_err()
            })
            .count();
        failures == 0
    }

    pub fn image_path(&self, name: &TileName<'_>) -> PathBuf {
        self.images.join(name.file_name(name.ext))
    }

    pub fn label_path(&self, name: &TileName<'_>) -> PathBuf {
        self.labels.join(name.file_name(OsStr::new("txt")))
    }
}

/// Remove `dir` with its contents if it exists, then create it empty.
pub fn recreate_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => info!("cleared '{}'", dir.display()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to clear '{}'", dir.display()))
        }
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory '{}'", dir.display()))
}

/// The output name of a tile, `{stem}_{row}_{col}.{ext}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileName<'a> {
    pub stem: &'a OsStr,
    pub row: usize,
    pub col: usize,
    pub ext: &'a OsStr,
}

impl TileName<'_> {
    fn file_name(&self, ext: &OsStr) -> OsString {
        let mut name = self.stem.to_os_string();
        name.push(format!("_{}_{}.", self.row, self.col));
        name.push(ext);
        name
    }
}

/// What happened to a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOutcome {
    /// Saved to the main output with this many boxes.
    Written { boxes: usize },
    /// Saved to the negative sample folder.
    Negative,
    /// Not saved anywhere.
    Dropped,
}

/// Saves tiles that have annotations, and routes the others to the optional
/// negative sample sink.
#[derive(Debug, Clone, Copy)]
pub struct TileWriter<'a> {
    output: &'a OutputDirs,
    negatives: Option<&'a NegativeSampleSink>,
}

impl<'a> TileWriter<'a> {
    pub fn new(output: &'a OutputDirs, negatives: Option<&'a NegativeSampleSink>) -> Self {
        Self { output, negatives }
    }

    /// Persist one tile. `crop` is only called when the tile is saved
    /// somewhere.
    pub fn write<F>(&self, name: &TileName<'_>, labels: &[RatioLabel], crop: F) -> Result<TileOutcome>
    where
        F: FnOnce() -> Result<DynamicImage>,
    {
        let has_annotations = !labels.is_empty();

        if has_annotations {
            let image = crop()?;
            save_image(&image, &self.output.image_path(name))?;
            label::save_label_file(self.output.label_path(name), labels)?;
            return Ok(TileOutcome::Written {
                boxes: labels.len(),
            });
        }

        // empty tiles never reach the main output
        match self.negatives {
            Some(sink) => {
                sink.write(name, &crop()?)?;
                Ok(TileOutcome::Negative)
            }
            None => Ok(TileOutcome::Dropped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn tile_image() -> Result<DynamicImage> {
        Ok(DynamicImage::ImageRgb8(RgbImage::new(4, 4)))
    }

    fn name<'a>(stem: &'a str, row: usize, col: usize) -> TileName<'a> {
        TileName {
            stem: OsStr::new(stem),
            row,
            col,
            ext: OsStr::new("png"),
        }
    }

    fn count_files(dir: &Path) -> usize {
        fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[test]
    fn tile_file_names() {
        let dirs = OutputDirs::under("/out");
        let name = name("scene.v2", 3, 11);
        assert_eq!(dirs.image_path(&name), Path::new("/out/images/scene.v2_3_11.png"));
        assert_eq!(dirs.label_path(&name), Path::new("/out/labels/scene.v2_3_11.txt"));
    }

    #[test]
    fn annotated_tile_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputDirs::under(dir.path());
        assert!(output.create());

        let labels = [RatioLabel::new(
            2,
            CyCxHW::from_cycxhw([r64(0.234375), r64(0.234375), r64(0.15625), r64(0.15625)]),
        )];
        let outcome = TileWriter::new(&output, None)
            .write(&name("a", 0, 0), &labels, tile_image)
            .unwrap();

        assert_eq!(outcome, TileOutcome::Written { boxes: 1 });
        assert!(output.images.join("a_0_0.png").is_file());
        assert_eq!(
            fs::read_to_string(output.labels.join("a_0_0.txt")).unwrap(),
            "2 0.234375 0.234375 0.156250 0.156250\n"
        );
    }

    #[test]
    fn empty_tile_is_dropped_without_sink() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputDirs::under(dir.path());
        assert!(output.create());

        let outcome = TileWriter::new(&output, None)
            .write(&name("a", 1, 0), &[], || panic!("an empty tile must not be cropped"))
            .unwrap();

        assert_eq!(outcome, TileOutcome::Dropped);
        assert_eq!(count_files(&output.images), 0);
        assert_eq!(count_files(&output.labels), 0);
    }

    #[test]
    fn empty_tile_goes_to_negative_sink() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputDirs::under(dir.path().join("out"));
        let negative = NegativeSampleSink::new(OutputDirs::under(dir.path().join("neg")));
        assert!(output.create());
        assert!(negative.dirs().create());

        let outcome = TileWriter::new(&output, Some(&negative))
            .write(&name("a", 0, 1), &[], tile_image)
            .unwrap();

        assert_eq!(outcome, TileOutcome::Negative);
        assert_eq!(count_files(&output.images), 0);
        assert_eq!(count_files(&output.labels), 0);
        assert!(negative.dirs().images.join("a_0_1.png").is_file());
        assert_eq!(
            fs::read_to_string(negative.dirs().labels.join("a_0_1.txt")).unwrap(),
            ""
        );
    }

    #[test]
    fn write_fails_without_output_folders() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputDirs::under(dir.path().join("missing"));
        let labels = [RatioLabel::new(
            0,
            CyCxHW::from_cycxhw([r64(0.5), r64(0.5), r64(0.1), r64(0.1)]),
        )];
        assert!(TileWriter::new(&output, None)
            .write(&name("a", 0, 0), &labels, tile_image)
            .is_err());
    }
}
