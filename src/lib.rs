//! Labelsplit: convert and split object detection datasets.
//!
//! Labelsplit converts annotation corpora between per-image Pascal VOC XML,
//! COCO JSON, and YOLO text labels, and partitions the images into
//! train/val or train/test subsets while relocating image files to match
//! the output layout.
//!
//! # Modules
//!
//! - [`index`]: the dataset index (images, categories, annotations) plus
//!   the format readers and the bounding-box transforms
//! - [`split`]: deterministic train/val/test partitioning
//! - [`convert`]: the COCO->YOLO and XML->COCO pipelines
//! - [`error`]: error types for labelsplit operations

pub mod convert;
pub mod error;
pub mod index;
pub mod split;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use convert::{coco2yolo, xml2coco, Coco2YoloOptions, Xml2CocoOptions};
pub use error::ConvertError;

/// The labelsplit CLI application.
#[derive(Parser)]
#[command(name = "labelsplit")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert a COCO JSON dataset to a YOLO tree with a train/val split.
    Coco2yolo(Coco2YoloArgs),

    /// Convert per-image VOC XML files to train/test COCO JSON documents.
    Xml2coco(Xml2CocoArgs),
}

/// Arguments for the coco2yolo subcommand.
#[derive(clap::Args)]
struct Coco2YoloArgs {
    /// COCO annotation JSON file.
    #[arg(long)]
    annotations: PathBuf,

    /// Directory containing the source image files.
    #[arg(long)]
    images: PathBuf,

    /// Output dataset root; images/ and labels/ trees are created under it.
    #[arg(long)]
    output: PathBuf,

    /// Fraction of images assigned to the validation split.
    #[arg(long, default_value_t = 0.1)]
    val_ratio: f64,

    /// Seed for the split shuffle; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

/// Arguments for the xml2coco subcommand.
#[derive(clap::Args)]
struct Xml2CocoArgs {
    /// Directory of per-image XML annotation files.
    #[arg(long)]
    annotations: PathBuf,

    /// Directory containing the source image files.
    #[arg(long)]
    images: PathBuf,

    /// Output path for the train COCO document.
    #[arg(long)]
    train_output: PathBuf,

    /// Output path for the test COCO document.
    #[arg(long)]
    test_output: PathBuf,

    /// Fraction of images assigned to the test split.
    #[arg(long, default_value_t = 0.2)]
    test_ratio: f64,

    /// Seed for the split shuffle; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

/// Run the labelsplit CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), ConvertError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Coco2yolo(args)) => {
            let summary = coco2yolo::run(&Coco2YoloOptions {
                annotations: args.annotations,
                images: args.images,
                output: args.output,
                val_ratio: args.val_ratio,
                seed: args.seed,
            })?;
            print!("{summary}");
            Ok(())
        }
        Some(Commands::Xml2coco(args)) => {
            let summary = xml2coco::run(&Xml2CocoOptions {
                annotations: args.annotations,
                images: args.images,
                train_output: args.train_output,
                test_output: args.test_output,
                test_ratio: args.test_ratio,
                seed: args.seed,
            })?;
            print!("{summary}");
            Ok(())
        }
        None => {
            println!("labelsplit {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Convert and split object detection datasets.");
            println!();
            println!("Run 'labelsplit --help' for usage information.");
            Ok(())
        }
    }
}
