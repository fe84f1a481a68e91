//! The destination of tiles without annotations.

use crate::{
    common::*,
    image_io::save_image,
    writer::{OutputDirs, TileName},
};

/// Saves empty tiles together with an empty label file, using the same
/// naming scheme as the main output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegativeSampleSink {
    dirs: OutputDirs,
}

impl NegativeSampleSink {
    pub fn new(dirs: OutputDirs) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &OutputDirs {
        &self.dirs
    }

    pub fn write(&self, name: &TileName<'_>, image: &DynamicImage) -> Result<()> {
        save_image(image, &self.dirs.image_path(name))?;
        label::save_label_file(self.dirs.label_path(name), &[])?;
        Ok(())
    }
}
