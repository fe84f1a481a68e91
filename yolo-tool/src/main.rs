use anyhow::{bail, Result};
use bbox::HW;
use clap::Parser;
use log::{info, LevelFilter};
use prettytable::{cell, row, Table};
use std::{env, num::NonZeroUsize, path::PathBuf};
use yolo_tiler::{
    coco::{verify_coco_file, CocoToYolo, YoloToCoco},
    pad::Padder,
    resize::Resizer,
    writer::OutputDirs,
    TileOptions, TileSummary, Tiler,
};

#[derive(Debug, Clone, Parser)]
/// Dataset preparation tools for YOLO detectors.
enum Opts {
    /// Slice images and their labels into fixed-size tiles.
    Tile {
        /// dataset with images/ and labels/, or subfolders holding them
        dataset_directory: PathBuf,
        /// output folder
        output_folder: PathBuf,
        /// save tiles without objects into this folder
        #[clap(long)]
        negative_samples_path: Option<PathBuf>,
        /// tile size in pixels [default: 640]
        #[clap(long)]
        size: Option<NonZeroUsize>,
        /// drop the last row and column of tiles
        #[clap(long)]
        no_padding: bool,
        /// pad border tiles with black to the full tile size
        #[clap(long)]
        fill_border: bool,
        /// number of images processed in parallel, 0 for one per CPU
        #[clap(long)]
        workers: Option<usize>,
        /// skip images with more pixels than this
        #[clap(long)]
        max_image_pixels: Option<u64>,
        /// JSON5 file with tiling options, overridden by command line flags
        #[clap(long)]
        config_file: Option<PathBuf>,
    },
    /// Pad images with black on the bottom and right to a minimum size.
    Pad {
        #[clap(long)]
        images_folder: PathBuf,
        #[clap(long)]
        labels_folder: PathBuf,
        #[clap(long)]
        img_width: usize,
        #[clap(long)]
        img_height: usize,
        #[clap(long)]
        output_folder: PathBuf,
    },
    /// Shrink images to fit a maximum size, keeping their aspect ratio.
    Resize {
        /// folder with images, or with images/ and labels/ folders
        #[clap(long)]
        input_dir: PathBuf,
        /// output folder, cleared before writing
        #[clap(long)]
        output_dir: PathBuf,
        #[clap(long, default_value = "1280")]
        width: usize,
        #[clap(long, default_value = "720")]
        height: usize,
    },
    /// Check the ids of a COCO annotation file.
    VerifyCoco {
        json_path: PathBuf,
        /// renumber ids and write <name>_fixed.json
        #[clap(long)]
        fix: bool,
    },
    /// Convert a COCO annotation file to YOLO label files.
    CocoToYolo {
        img_folder: PathBuf,
        json_path: PathBuf,
        output_path: PathBuf,
        /// do not write label files for images without objects
        #[clap(long)]
        remove_empty: bool,
        /// keep identical labels of an image
        #[clap(long)]
        keep_duplicate_labels: bool,
    },
    /// Collect YOLO label files into a COCO annotation file.
    YoloToCoco {
        /// dataset with images/ and labels/, or a text file of image paths
        #[clap(short, long)]
        path: PathBuf,
        #[clap(short, long, default_value = "train_coco.json")]
        output: PathBuf,
        /// class names in class index order
        #[clap(long, multiple_values = true, default_value = "small vehicle")]
        classes: Vec<String>,
    },
}

fn main() -> Result<()> {
    let mut logger = pretty_env_logger::formatted_builder();
    match env::var("RUST_LOG") {
        Ok(filters) => logger.parse_filters(&filters),
        Err(_) => logger.filter_level(LevelFilter::Info),
    };
    logger.init();

    match Opts::parse() {
        Opts::Tile {
            dataset_directory,
            output_folder,
            negative_samples_path,
            size,
            no_padding,
            fill_border,
            workers,
            max_image_pixels,
            config_file,
        } => {
            let mut options = match config_file {
                Some(path) => TileOptions::open(path)?,
                None => TileOptions::default(),
            };
            if let Some(size) = size {
                options.size = size;
            }
            if let Some(dir) = negative_samples_path {
                options.negative_samples_dir = Some(dir);
            }
            if let Some(workers) = workers {
                options.workers = workers;
            }
            if let Some(max) = max_image_pixels {
                options.max_image_pixels = max;
            }
            options.no_padding |= no_padding;
            options.fill_border |= fill_border;

            let summary = Tiler::new(options).run(&dataset_directory, &output_folder)?;
            print_summary(&summary);
        }
        Opts::Pad {
            images_folder,
            labels_folder,
            img_width,
            img_height,
            output_folder,
        } => {
            let padder = Padder {
                images_dir: images_folder,
                labels_dir: labels_folder,
                output: OutputDirs::under(output_folder),
                target: HW::try_from_hw([img_height, img_width])?,
            };
            padder.run()?;
        }
        Opts::Resize {
            input_dir,
            output_dir,
            width,
            height,
        } => {
            let resizer = Resizer {
                input_dir,
                output_dir,
                max_size: HW::try_from_hw([height, width])?,
            };
            resizer.run()?;
        }
        Opts::VerifyCoco { json_path, fix } => {
            let (verification, _) = verify_coco_file(&json_path, fix)?;
            if !verification.is_valid() {
                bail!(
                    "'{}' is not a valid COCO annotation file",
                    json_path.display()
                );
            }
            info!("'{}' is a valid COCO annotation file", json_path.display());
        }
        Opts::CocoToYolo {
            img_folder,
            json_path,
            output_path,
            remove_empty,
            keep_duplicate_labels,
        } => {
            let converter = CocoToYolo {
                image_dir: img_folder,
                json_path,
                output: OutputDirs::under(output_path),
                remove_empty,
                keep_duplicates: keep_duplicate_labels,
            };
            converter.run()?;
        }
        Opts::YoloToCoco {
            path,
            output,
            classes,
        } => {
            let exporter = YoloToCoco {
                source: path,
                json_path: output,
                classes,
            };
            exporter.run()?;
        }
    }

    Ok(())
}

fn print_summary(summary: &TileSummary) {
    let mut table = Table::new();
    table.add_row(row!["item", "count"]);
    table.add_row(row!["units processed", summary.units_processed]);
    table.add_row(row!["units skipped", summary.units_skipped]);
    table.add_row(row!["images tiled", summary.images_tiled]);
    table.add_row(row!["images skipped", summary.images_skipped]);
    table.add_row(row!["duplicate names", summary.duplicate_stems]);
    table.add_row(row!["tiles written", summary.tiles_written]);
    table.add_row(row!["boxes written", summary.boxes_written]);
    table.add_row(row!["negative samples", summary.negatives_written]);
    table.add_row(row!["empty tiles dropped", summary.empty_dropped]);
    table.printstd();
}
