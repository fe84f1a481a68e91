//! Driving a tiling run over a whole dataset.

use crate::{
    common::*,
    job::TileJob,
    options::TileOptions,
    summary::{ImageReport, TileSummary},
    walker::{DatasetLayout, UnitEntry},
};

/// Number of images between two progress messages.
const PROGRESS_INTERVAL: usize = 100;

/// A cooperative cancellation flag, checked before each image.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tiles every processing unit of a dataset.
#[derive(Debug, Clone)]
pub struct Tiler {
    options: Arc<TileOptions>,
}

impl Tiler {
    pub fn new(options: TileOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &TileOptions {
        &self.options
    }

    pub fn run(
        &self,
        dataset_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> Result<TileSummary> {
        self.run_with_cancel(dataset_dir, output_dir, &CancelToken::new())
    }

    /// Tile a dataset, stopping before the next image once `cancel` is set.
    ///
    /// Skipped images and subfolders are counted in the summary. A malformed
    /// label file or a failed write aborts the run.
    pub fn run_with_cancel(
        &self,
        dataset_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        cancel: &CancelToken,
    ) -> Result<TileSummary> {
        self.run_observed(dataset_dir, output_dir, cancel, |_, _| {})
    }

    /// Like [Tiler::run_with_cancel], calling `on_image` after each image is
    /// done. With several workers it is called from the worker threads.
    pub fn run_observed<F>(
        &self,
        dataset_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        cancel: &CancelToken,
        on_image: F,
    ) -> Result<TileSummary>
    where
        F: Fn(&Path, &ImageReport) + Sync,
    {
        let dataset_dir = dataset_dir.as_ref();
        let output_dir = output_dir.as_ref();
        let layout = DatasetLayout::discover(dataset_dir)?;

        info!("slice size: {}", self.options.size);
        let mut summary = TileSummary::default();

        let entries = layout.entries();
        let num_entries = entries.len();

        for (index, entry) in entries.into_iter().enumerate() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let unit = match entry {
                UnitEntry::Ready(unit) => unit,
                UnitEntry::Skipped { subfolder, reason } => {
                    warn!("skip subfolder '{}': {}", subfolder.display(), reason);
                    summary.units_skipped += 1;
                    continue;
                }
            };

            let job = TileJob::new(unit, output_dir, self.options.clone());
            info!(
                "{} of {}: tiling '{}' into '{}'",
                index + 1,
                num_entries,
                job.unit.images_dir.display(),
                job.output.images.display()
            );
            summary += self.run_job(&job, cancel, &on_image)?;

            if summary.cancelled {
                break;
            }
        }

        if summary.cancelled {
            warn!("tiling was cancelled");
        }
        info!("Completed. Saved into '{}'", output_dir.display());
        info!("{}", summary);

        Ok(summary)
    }

    fn run_job<F>(
        &self,
        job: &TileJob,
        cancel: &CancelToken,
        on_image: &F,
    ) -> Result<TileSummary>
    where
        F: Fn(&Path, &ImageReport) + Sync,
    {
        let list = job.unit.list_images(&self.options)?;
        for path in &list.duplicates {
            warn!(
                "skip image '{}': another image of this folder has the same name",
                path.display()
            );
        }
        job.prepare_dirs();

        let images = &list.images;
        let workers = self.options.num_workers().min(images.len()).max(1);
        let tiler = ImageTiler {
            job,
            cancel,
            on_image,
            progress: Progress::new(images.len()),
        };

        let mut summary = if workers == 1 {
            tiler.tile_sequential(images)?
        } else {
            tiler.tile_parallel(images, workers)?
        };

        summary.units_processed = 1;
        summary.duplicate_stems = list.duplicates.len();
        summary.cancelled = summary.images_handled() < images.len();
        Ok(summary)
    }
}

/// Tiles the images of one job and reports each of them.
struct ImageTiler<'a, F> {
    job: &'a TileJob,
    cancel: &'a CancelToken,
    on_image: &'a F,
    progress: Progress,
}

impl<'a, F> ImageTiler<'a, F>
where
    F: Fn(&Path, &ImageReport) + Sync,
{
    /// Tile one image. Returns an empty summary once cancelled.
    fn tile(&self, path: &Path) -> Result<TileSummary> {
        let mut summary = TileSummary::default();
        if self.cancel.is_cancelled() {
            return Ok(summary);
        }

        let report = self.job.tile_image(path)?;
        summary.record(&report);
        (self.on_image)(path, &report);
        self.progress.tick();

        Ok(summary)
    }

    fn tile_sequential(&self, images: &[PathBuf]) -> Result<TileSummary> {
        let mut summary = TileSummary::default();
        for path in images {
            if self.cancel.is_cancelled() {
                break;
            }
            summary += self.tile(path)?;
        }
        Ok(summary)
    }

    /// Tile images on a pool of `workers` threads. The first error stops the
    /// pool from starting further images and is returned.
    fn tile_parallel(&self, images: &[PathBuf], workers: usize) -> Result<TileSummary> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .context("failed to start the tiling workers")?;

        pool.install(|| {
            images
                .par_iter()
                .map(|path| self.tile(path))
                .try_reduce(TileSummary::default, |mut lhs, rhs| {
                    lhs += rhs;
                    Ok(lhs)
                })
        })
    }
}

/// Logs a line every [PROGRESS_INTERVAL] images.
#[derive(Debug)]
struct Progress {
    done: AtomicUsize,
    total: usize,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
        }
    }

    fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        if done % PROGRESS_INTERVAL == 0 || done == self.total {
            info!("=== {} out of {}", done, self.total);
        }
    }
}
