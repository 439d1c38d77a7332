//! Per-image VOC XML to COCO JSON conversion.
//!
//! Reads an annotation directory, discovers the category set with a full
//! pre-pass, splits the images into train/test, and writes two independent
//! COCO documents. The category list is identical in both documents;
//! annotation ids restart at 0 in each.

use std::collections::HashMap;
use std::path::PathBuf;

use super::ConversionSummary;
use crate::error::ConvertError;
use crate::index::io_coco_json::write_coco_json;
use crate::index::io_voc_xml::{read_voc_dir, VocFile};
use crate::index::registry::CategoryRegistry;
use crate::index::{Annotation, AnnotationId, DatasetIndex, Image, ImageId};
use crate::split::split_image_ids;

/// Options for one XML to COCO run.
#[derive(Clone, Debug)]
pub struct Xml2CocoOptions {
    /// Directory of per-image XML annotation files.
    pub annotations: PathBuf,

    /// Directory holding the corresponding image files.
    pub images: PathBuf,

    /// Output path for the train COCO document.
    pub train_output: PathBuf,

    /// Output path for the test COCO document.
    pub test_output: PathBuf,

    /// Fraction of images assigned to the test split.
    pub test_ratio: f64,

    /// Seed for the split shuffle; the thread rng is used when omitted.
    pub seed: Option<u64>,
}

/// Execute the XML to COCO pipeline.
pub fn run(opts: &Xml2CocoOptions) -> Result<ConversionSummary, ConvertError> {
    let corpus = read_voc_dir(&opts.annotations, &opts.images)?;

    // Phase one: category discovery over the full corpus. This must finish
    // before any per-split processing so both documents share one mapping.
    let registry = CategoryRegistry::discover(corpus.category_names());

    // Phase two: split once, then build and write each document.
    let ids: Vec<ImageId> = corpus.files.iter().map(|file| file.image_id).collect();
    let assignment = split_image_ids(&ids, opts.test_ratio, opts.seed)?;

    let file_by_id: HashMap<ImageId, &VocFile> = corpus
        .files
        .iter()
        .map(|file| (file.image_id, file))
        .collect();

    let mut summary = ConversionSummary {
        skipped_files: corpus.skipped_files,
        ..Default::default()
    };

    let train_index = build_split_index(assignment.train(), &file_by_id, &registry, &mut summary);
    let test_index = build_split_index(assignment.holdout(), &file_by_id, &registry, &mut summary);

    summary.train_images = train_index.images.len();
    summary.holdout_images = test_index.images.len();

    write_coco_json(&opts.train_output, &train_index)?;
    write_coco_json(&opts.test_output, &test_index)?;

    Ok(summary)
}

/// Build the dataset index for one output document.
///
/// The annotation id counter belongs to this document alone and counts up
/// from 0, so ids never collide within a document and are never shared
/// across the two.
fn build_split_index(
    ids: &[ImageId],
    file_by_id: &HashMap<ImageId, &VocFile>,
    registry: &CategoryRegistry,
    summary: &mut ConversionSummary,
) -> DatasetIndex {
    let mut index = DatasetIndex {
        categories: registry.categories().to_vec(),
        ..Default::default()
    };

    let mut next_annotation_id: u64 = 0;

    for id in ids {
        let file = file_by_id
            .get(id)
            .copied()
            .expect("split ids are drawn from the corpus");

        index.images.push(Image::new(
            file.image_id,
            file.image_path.to_string_lossy().to_string(),
            file.width,
            file.height,
        ));

        for object in &file.objects {
            let Some(category_id) = registry.id_for(&object.name) else {
                eprintln!(
                    "Warning: dropping annotation in image {}: category '{}' is not in the registry",
                    file.image_id, object.name
                );
                summary.dropped_annotations += 1;
                continue;
            };

            index.annotations.push(
                Annotation::new(
                    AnnotationId::new(next_annotation_id),
                    file.image_id,
                    category_id,
                    object.bbox,
                )
                .with_occlusion(object.truncated.unwrap_or(0)),
            );
            next_annotation_id += 1;
            summary.annotations += 1;
        }
    }

    index
}
