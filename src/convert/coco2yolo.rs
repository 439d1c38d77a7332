//! COCO JSON to YOLO dataset conversion.
//!
//! Reads one COCO document, splits its images into train/val, writes one
//! label file per image under `labels/{train,val}/` and copies image files
//! into `images/{train,val}/`. Category ids pass through from the source
//! document unchanged.

use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::ConversionSummary;
use crate::error::ConvertError;
use crate::index::io_coco_json::read_coco_json;
use crate::index::registry::CategoryRegistry;
use crate::index::{Category, Image, ImageId};
use crate::split::{split_image_ids, SplitAssignment};

/// Options for one COCO to YOLO run.
#[derive(Clone, Debug)]
pub struct Coco2YoloOptions {
    /// COCO annotation JSON file.
    pub annotations: PathBuf,

    /// Directory holding the source image files, resolved against each
    /// image's `file_name`.
    pub images: PathBuf,

    /// Output dataset root.
    pub output: PathBuf,

    /// Fraction of images assigned to the validation split.
    pub val_ratio: f64,

    /// Seed for the split shuffle; the thread rng is used when omitted.
    pub seed: Option<u64>,
}

/// Execute the COCO to YOLO pipeline.
pub fn run(opts: &Coco2YoloOptions) -> Result<ConversionSummary, ConvertError> {
    let index = read_coco_json(&opts.annotations)?;
    let registry = CategoryRegistry::from_categories(index.categories.clone());

    let layout = OutputLayout::create(&opts.output)?;

    // One split for the whole run; labels and image copies both consult it.
    let ids: Vec<ImageId> = index.images.iter().map(|img| img.id).collect();
    let assignment = split_image_ids(&ids, opts.val_ratio, opts.seed)?;

    let image_by_id: HashMap<ImageId, &Image> =
        index.images.iter().map(|img| (img.id, img)).collect();

    // Zero-dimension images cannot be normalized; their annotations are
    // dropped, the rest of the run continues.
    let mut degenerate: HashSet<ImageId> = HashSet::new();
    for image in &index.images {
        if image.width == 0 || image.height == 0 {
            let error = ConvertError::InvalidGeometry {
                file_name: image.file_name.clone(),
                width: image.width,
                height: image.height,
            };
            eprintln!("Warning: {error}");
            degenerate.insert(image.id);
        }
    }

    let mut summary = ConversionSummary::default();

    for ann in &index.annotations {
        let image = image_by_id
            .get(&ann.image_id)
            .copied()
            .expect("annotation image ids validated by the reader");

        if degenerate.contains(&image.id) {
            summary.dropped_annotations += 1;
            continue;
        }

        if !registry.contains(ann.category_id) {
            eprintln!(
                "Warning: dropping annotation {}: category id {} is not in the source category list",
                ann.id, ann.category_id
            );
            summary.dropped_annotations += 1;
            continue;
        }

        // Center in pixel space first, then divide: (x + w/2) / W stays
        // exact for integer-valued inputs.
        let (image_w, image_h) = (image.width as f64, image.height as f64);
        let (cx, cy, w, h) = ann.bbox.to_cxcywh();
        let (cx, cy, w, h) = (cx / image_w, cy / image_h, w / image_w, h / image_h);

        // Append mode: several annotations of the same image extend the same
        // file, in source order. Clearing stale output is the caller's job.
        let label_path = layout.label_path(&assignment, image);
        let mut label_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&label_path)
            .map_err(ConvertError::Io)?;

        writeln!(label_file, "{} {} {} {} {}", ann.category_id, cx, cy, w, h)
            .map_err(ConvertError::Io)?;
        summary.annotations += 1;
    }

    for image in &index.images {
        let src = opts.images.join(&image.file_name);
        let dest_dir = if assignment.is_holdout(image.id) {
            &layout.val_images
        } else {
            &layout.train_images
        };
        let dest = dest_dir.join(base_name(&image.file_name));

        match fs::copy(&src, &dest) {
            Ok(_) => {
                if assignment.is_holdout(image.id) {
                    summary.holdout_images += 1;
                } else {
                    summary.train_images += 1;
                }
            }
            Err(error) => {
                eprintln!("Warning: failed to copy '{}': {error}", src.display());
                summary.failed_copies += 1;
            }
        }
    }

    write_data_yaml(&opts.output, registry.categories())?;

    Ok(summary)
}

struct OutputLayout {
    train_images: PathBuf,
    val_images: PathBuf,
    train_labels: PathBuf,
    val_labels: PathBuf,
}

impl OutputLayout {
    fn create(output_root: &Path) -> Result<Self, ConvertError> {
        let layout = Self {
            train_images: output_root.join("images/train"),
            val_images: output_root.join("images/val"),
            train_labels: output_root.join("labels/train"),
            val_labels: output_root.join("labels/val"),
        };

        for dir in [
            &layout.train_images,
            &layout.val_images,
            &layout.train_labels,
            &layout.val_labels,
        ] {
            fs::create_dir_all(dir).map_err(ConvertError::Io)?;
        }

        Ok(layout)
    }

    fn label_path(&self, assignment: &SplitAssignment, image: &Image) -> PathBuf {
        let dir = if assignment.is_holdout(image.id) {
            &self.val_labels
        } else {
            &self.train_labels
        };
        dir.join(Path::new(base_name(&image.file_name)).with_extension("txt"))
    }
}

/// Last path component of a possibly slash-qualified file name.
fn base_name(file_name: &str) -> &str {
    file_name.rsplit('/').next().unwrap_or(file_name)
}

fn write_data_yaml(output_root: &Path, categories: &[Category]) -> Result<(), ConvertError> {
    let mut yaml = String::from("names:\n");
    for category in categories {
        yaml.push_str(&format!(
            "  {}: {}\n",
            category.id,
            yaml_single_quoted(&category.name)
        ));
    }

    fs::write(output_root.join("data.yaml"), yaml).map_err(ConvertError::Io)
}

fn yaml_single_quoted(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}
