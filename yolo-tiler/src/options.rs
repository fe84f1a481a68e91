//! Tiling options.

use crate::common::*;

pub const DEFAULT_SLICE_SIZE: NonZeroUsize = match NonZeroUsize::new(640) {
    Some(size) => size,
    None => panic!("slice size must be non-zero"),
};

/// Twice the default pixel budget of common decoders. Larger images are
/// treated as decompression bombs and skipped.
pub const DEFAULT_MAX_IMAGE_PIXELS: u64 = 178_956_970;

/// Options shared by every processing unit of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileOptions {
    /// The edge length of a tile in pixels.
    pub size: NonZeroUsize,
    /// Drop the last row and the last column of tiles.
    pub no_padding: bool,
    /// Where tiles without any box are saved. Disabled if unset.
    pub negative_samples_dir: Option<PathBuf>,
    /// Number of images processed concurrently. Zero picks one per CPU.
    pub workers: usize,
    /// Images with more pixels than this are skipped.
    pub max_image_pixels: u64,
    /// Paste border tiles onto a black canvas so that every tile is exactly
    /// `size` by `size` pixels.
    pub fill_border: bool,
    /// File extensions recognized as images, compared case-insensitively.
    pub image_extensions: Vec<String>,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_SLICE_SIZE,
            no_padding: false,
            negative_samples_dir: None,
            workers: 1,
            max_image_pixels: DEFAULT_MAX_IMAGE_PIXELS,
            fill_border: false,
            image_extensions: default_image_extensions(),
        }
    }
}

impl TileOptions {
    /// Load options from a JSON5 file. Missing fields take their defaults.
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read options file '{}'", path.display()))?;
        let options = json5::from_str(&text)
            .with_context(|| format!("failed to parse options file '{}'", path.display()))?;
        Ok(options)
    }

    /// The effective number of worker threads.
    pub fn num_workers(&self) -> usize {
        match self.workers {
            0 => num_cpus::get(),
            workers => workers,
        }
    }
}

/// The image extensions recognized by default.
pub fn default_image_extensions() -> Vec<String> {
    vec!["jpg".into(), "jpeg".into(), "png".into()]
}
