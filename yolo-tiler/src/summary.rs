//! Counters reported by a tiling run.

use crate::{common::*, image_io::SkipReason, writer::TileOutcome};

/// Tile counters of a single image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileCounts {
    pub tiles_written: usize,
    pub negatives_written: usize,
    pub empty_dropped: usize,
    pub boxes_written: usize,
}

impl TileCounts {
    pub fn record(&mut self, outcome: TileOutcome) {
        match outcome {
            TileOutcome::Written { boxes } => {
                self.tiles_written += 1;
                self.boxes_written += boxes;
            }
            TileOutcome::Negative => self.negatives_written += 1,
            TileOutcome::Dropped => self.empty_dropped += 1,
        }
    }
}

/// The result of processing one source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReport {
    Tiled(TileCounts),
    Skipped(SkipReason),
}

/// Totals over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileSummary {
    pub units_processed: usize,
    pub units_skipped: usize,
    pub images_tiled: usize,
    pub images_skipped: usize,
    pub duplicate_stems: usize,
    pub tiles_written: usize,
    pub negatives_written: usize,
    pub empty_dropped: usize,
    pub boxes_written: usize,
    /// The run stopped on a cancellation request before every image was
    /// processed.
    pub cancelled: bool,
}

impl TileSummary {
    pub fn record(&mut self, report: &ImageReport) {
        match report {
            ImageReport::Tiled(counts) => {
                self.images_tiled += 1;
                self.tiles_written += counts.tiles_written;
                self.negatives_written += counts.negatives_written;
                self.empty_dropped += counts.empty_dropped;
                self.boxes_written += counts.boxes_written;
            }
            ImageReport::Skipped(_) => self.images_skipped += 1,
        }
    }

    /// Number of images either tiled or skipped.
    pub fn images_handled(&self) -> usize {
        self.images_tiled + self.images_skipped
    }
}

impl AddAssign for TileSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.units_processed += rhs.units_processed;
        self.units_skipped += rhs.units_skipped;
        self.images_tiled += rhs.images_tiled;
        self.images_skipped += rhs.images_skipped;
        self.duplicate_stems += rhs.duplicate_stems;
        self.tiles_written += rhs.tiles_written;
        self.negatives_written += rhs.negatives_written;
        self.empty_dropped += rhs.empty_dropped;
        self.boxes_written += rhs.boxes_written;
        self.cancelled |= rhs.cancelled;
    }
}

impl fmt::Display for TileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} images tiled, {} skipped; {} tiles with {} boxes written, {} negative samples, {} empty tiles dropped",
            self.images_tiled,
            self.images_skipped,
            self.tiles_written,
            self.boxes_written,
            self.negatives_written,
            self.empty_dropped
        )?;
        if self.units_skipped > 0 {
            write!(f, "; {} subfolders skipped", self.units_skipped)?;
        }
        if self.duplicate_stems > 0 {
            write!(f, "; {} images with duplicate names ignored", self.duplicate_stems)?;
        }
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}
