//! Slicing of large annotated images into fixed-size tiles for detector
//! training, along with a few dataset preparation tools.

mod common;
pub mod clip;
pub mod coco;
pub mod grid;
pub mod image_io;
pub mod job;
pub mod negative;
pub mod options;
pub mod pad;
pub mod resize;
pub mod runner;
pub mod summary;
pub mod walker;
pub mod writer;

pub use options::TileOptions;
pub use runner::{CancelToken, Tiler};
pub use summary::TileSummary;
