//! COCO JSON reader and writer.
//!
//! COCO bounding boxes use `[x, y, width, height]` with `(x, y)` the
//! top-left corner in absolute pixels; the index stores XYXY, so boxes are
//! converted on the way in and out.
//!
//! The reader treats a missing top-level key or an annotation referencing
//! an unknown image id as fatal. The writer emits one fixed schema
//! instance: an `info` block, an empty `licenses` array, and annotation
//! ids renumbered sequentially from 0 by a counter owned by the document
//! being written.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::model::{Annotation, Category, DatasetIndex, Image};
use super::{AnnotationId, BBoxXYXY, CategoryId, ImageId, Pixel};
use crate::error::ConvertError;

// ============================================================================
// COCO Schema Types (internal to this module)
// ============================================================================

/// Top-level COCO document structure.
#[derive(Debug, Serialize, Deserialize)]
struct CocoDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    info: Option<CocoInfo>,

    #[serde(default)]
    licenses: Vec<CocoLicense>,

    images: Vec<CocoImage>,

    annotations: Vec<CocoAnnotation>,

    categories: Vec<CocoCategory>,
}

/// COCO info block. The writer always emits the same fixed instance.
#[derive(Debug, Serialize, Deserialize)]
struct CocoInfo {
    #[serde(default)]
    year: u32,

    #[serde(default)]
    version: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    date_created: String,
}

impl CocoInfo {
    fn detection_defaults() -> Self {
        Self {
            year: 2021,
            version: "1.0".to_string(),
            description: "For object detection".to_string(),
            date_created: "2021".to_string(),
        }
    }
}

/// COCO license entry. Accepted on input; output always carries an empty
/// license list.
#[derive(Debug, Serialize, Deserialize)]
struct CocoLicense {
    id: u64,
    name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

/// COCO image entry.
#[derive(Debug, Serialize, Deserialize)]
struct CocoImage {
    id: u64,
    width: u32,
    height: u32,
    file_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_captured: Option<String>,
}

/// COCO category entry.
#[derive(Debug, Serialize, Deserialize)]
struct CocoCategory {
    id: u32,
    name: String,
}

/// COCO annotation entry, with the optional `occlusion` extension field.
#[derive(Debug, Serialize, Deserialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u32,

    /// COCO bbox format: [x, y, width, height] with (x, y) the top-left corner.
    bbox: [f64; 4],

    #[serde(default, skip_serializing_if = "Option::is_none")]
    area: Option<f64>,

    #[serde(default)]
    iscrowd: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    occlusion: Option<u32>,
}

// ============================================================================
// Public API
// ============================================================================

/// Reads a dataset index from a COCO JSON file.
///
/// Fails with [`ConvertError::CocoJsonParse`] if the document is missing a
/// required top-level key or is otherwise unparsable, and with
/// [`ConvertError::MalformedInput`] if any annotation references an image id
/// absent from the image list.
pub fn read_coco_json(path: &Path) -> Result<DatasetIndex, ConvertError> {
    let file = File::open(path).map_err(ConvertError::Io)?;
    let reader = BufReader::new(file);

    let coco: CocoDocument =
        serde_json::from_reader(reader).map_err(|source| ConvertError::CocoJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    coco_to_index(coco, path)
}

/// Writes a dataset index as a COCO JSON document.
///
/// Parent directories are created as needed. The output is pretty-printed.
pub fn write_coco_json(path: &Path, index: &DatasetIndex) -> Result<(), ConvertError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(ConvertError::Io)?;
    }

    let file = File::create(path).map_err(ConvertError::Io)?;
    let writer = BufWriter::new(file);

    let coco = index_to_coco(index);

    serde_json::to_writer_pretty(writer, &coco).map_err(|source| ConvertError::CocoJsonWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a dataset index from a COCO JSON string. Useful for testing
/// without file I/O.
pub fn from_coco_str(json: &str) -> Result<DatasetIndex, ConvertError> {
    let coco: CocoDocument =
        serde_json::from_str(json).map_err(|source| ConvertError::CocoJsonParse {
            path: Path::new("<memory>").to_path_buf(),
            source,
        })?;
    coco_to_index(coco, Path::new("<memory>"))
}

/// Serializes a dataset index to a COCO JSON string. Useful for testing
/// without file I/O.
pub fn to_coco_string(index: &DatasetIndex) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&index_to_coco(index))
}

// ============================================================================
// Conversion: COCO -> index
// ============================================================================

fn coco_to_index(coco: CocoDocument, path: &Path) -> Result<DatasetIndex, ConvertError> {
    let image_ids: HashSet<u64> = coco.images.iter().map(|img| img.id).collect();

    for annotation in &coco.annotations {
        if !image_ids.contains(&annotation.image_id) {
            return Err(ConvertError::MalformedInput {
                path: path.to_path_buf(),
                message: format!(
                    "annotation {} references image_id {} which is absent from the image list",
                    annotation.id, annotation.image_id
                ),
            });
        }
    }

    let images = coco
        .images
        .into_iter()
        .map(|img| Image::new(img.id, img.file_name, img.width, img.height))
        .collect();

    let categories = coco
        .categories
        .into_iter()
        .map(|cat| Category::new(cat.id, cat.name))
        .collect();

    let annotations = coco
        .annotations
        .into_iter()
        .map(|ann| {
            let [x, y, w, h] = ann.bbox;
            let mut annotation = Annotation::new(
                AnnotationId::new(ann.id),
                ImageId::new(ann.image_id),
                CategoryId::new(ann.category_id),
                BBoxXYXY::<Pixel>::from_xywh(x, y, w, h),
            );
            annotation.iscrowd = ann.iscrowd;
            annotation.occlusion = ann.occlusion;
            annotation
        })
        .collect();

    Ok(DatasetIndex {
        images,
        categories,
        annotations,
    })
}

// ============================================================================
// Conversion: index -> COCO
// ============================================================================

fn index_to_coco(index: &DatasetIndex) -> CocoDocument {
    let images: Vec<CocoImage> = index
        .images
        .iter()
        .map(|img| CocoImage {
            id: img.id.as_u64(),
            width: img.width,
            height: img.height,
            file_name: img.file_name.clone(),
            date_captured: Some("2021".to_string()),
        })
        .collect();

    let categories: Vec<CocoCategory> = index
        .categories
        .iter()
        .map(|cat| CocoCategory {
            id: cat.id.as_u32(),
            name: cat.name.clone(),
        })
        .collect();

    // Annotation ids restart at 0 in every written document; the counter is
    // local to this conversion, never shared across documents.
    let mut next_annotation_id: u64 = 0;
    let annotations: Vec<CocoAnnotation> = index
        .annotations
        .iter()
        .map(|ann| {
            let (x, y, w, h) = ann.bbox.to_xywh();
            let coco = CocoAnnotation {
                id: next_annotation_id,
                image_id: ann.image_id.as_u64(),
                category_id: ann.category_id.as_u32(),
                bbox: [x, y, w, h],
                area: Some(ann.bbox.area()),
                iscrowd: ann.iscrowd,
                occlusion: ann.occlusion,
            };
            next_annotation_id += 1;
            coco
        })
        .collect();

    CocoDocument {
        info: Some(CocoInfo::detection_defaults()),
        licenses: Vec::new(),
        images,
        annotations,
        categories,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_coco_json() -> &'static str {
        r#"{
            "images": [
                {"id": 1, "width": 640, "height": 480, "file_name": "image001.jpg"}
            ],
            "categories": [
                {"id": 1, "name": "person"}
            ],
            "annotations": [
                {
                    "id": 5,
                    "image_id": 1,
                    "category_id": 1,
                    "bbox": [10.0, 20.0, 90.0, 60.0],
                    "area": 5400.0,
                    "iscrowd": 0
                }
            ]
        }"#
    }

    #[test]
    fn coco_to_index_basic() {
        let index = from_coco_str(sample_coco_json()).expect("parse failed");

        assert_eq!(index.images.len(), 1);
        assert_eq!(index.categories.len(), 1);
        assert_eq!(index.annotations.len(), 1);

        let img = &index.images[0];
        assert_eq!(img.id.as_u64(), 1);
        assert_eq!(img.file_name, "image001.jpg");
        assert_eq!(img.width, 640);
        assert_eq!(img.height, 480);

        // COCO [10, 20, 90, 60] becomes XYXY [10, 20, 100, 80].
        let ann = &index.annotations[0];
        assert_eq!(ann.bbox.xmin(), 10.0);
        assert_eq!(ann.bbox.ymin(), 20.0);
        assert_eq!(ann.bbox.xmax(), 100.0);
        assert_eq!(ann.bbox.ymax(), 80.0);
        assert_eq!(ann.iscrowd, 0);
    }

    #[test]
    fn missing_top_level_key_is_fatal() {
        let missing_categories = r#"{
            "images": [],
            "annotations": []
        }"#;

        let err = from_coco_str(missing_categories).unwrap_err();
        assert!(matches!(err, ConvertError::CocoJsonParse { .. }));
    }

    #[test]
    fn unknown_image_reference_is_fatal() {
        let dangling = r#"{
            "images": [{"id": 1, "width": 100, "height": 100, "file_name": "a.jpg"}],
            "categories": [{"id": 1, "name": "person"}],
            "annotations": [
                {"id": 0, "image_id": 99, "category_id": 1, "bbox": [0, 0, 10, 10]}
            ]
        }"#;

        let err = from_coco_str(dangling).unwrap_err();
        match err {
            ConvertError::MalformedInput { message, .. } => {
                assert!(message.contains("image_id 99"));
            }
            other => panic!("expected MalformedInput, got {other:?}"),
        }
    }

    #[test]
    fn writer_renumbers_annotations_from_zero() {
        let index = DatasetIndex {
            images: vec![Image::new(3u64, "c.jpg", 100, 100)],
            categories: vec![Category::new(1u32, "car")],
            annotations: vec![
                Annotation::new(40u64, 3u64, 1u32, BBoxXYXY::from_xyxy(0.0, 0.0, 10.0, 10.0)),
                Annotation::new(41u64, 3u64, 1u32, BBoxXYXY::from_xyxy(5.0, 5.0, 20.0, 20.0)),
            ],
        };

        let json = to_coco_string(&index).expect("serialize failed");
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["annotations"][0]["id"], 0);
        assert_eq!(parsed["annotations"][1]["id"], 1);
    }

    #[test]
    fn writer_emits_fixed_info_block_and_empty_licenses() {
        let index = DatasetIndex::default();
        let json = to_coco_string(&index).expect("serialize failed");
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["info"]["year"], 2021);
        assert_eq!(parsed["info"]["version"], "1.0");
        assert_eq!(parsed["info"]["description"], "For object detection");
        assert_eq!(parsed["licenses"], serde_json::json!([]));
    }

    #[test]
    fn writer_converts_bbox_and_computes_area() {
        let index = DatasetIndex {
            images: vec![Image::new(1u64, "a.png", 100, 200)],
            categories: vec![Category::new(1u32, "car")],
            annotations: vec![Annotation::new(
                0u64,
                1u64,
                1u32,
                BBoxXYXY::from_xyxy(10.0, 20.0, 30.0, 50.0),
            )
            .with_occlusion(1)],
        };

        let json = to_coco_string(&index).expect("serialize failed");
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        let ann = &parsed["annotations"][0];
        assert_eq!(ann["bbox"][0], 10.0);
        assert_eq!(ann["bbox"][1], 20.0);
        assert_eq!(ann["bbox"][2], 20.0);
        assert_eq!(ann["bbox"][3], 30.0);
        assert_eq!(ann["area"], 600.0);
        assert_eq!(ann["occlusion"], 1);
    }

    #[test]
    fn occlusion_roundtrips_and_stays_optional() {
        let with_occlusion = r#"{
            "images": [{"id": 1, "width": 100, "height": 100, "file_name": "a.jpg"}],
            "categories": [{"id": 1, "name": "person"}],
            "annotations": [
                {"id": 0, "image_id": 1, "category_id": 1, "bbox": [0, 0, 50, 50], "occlusion": 2},
                {"id": 1, "image_id": 1, "category_id": 1, "bbox": [0, 0, 50, 50]}
            ]
        }"#;

        let index = from_coco_str(with_occlusion).expect("parse failed");
        assert_eq!(index.annotations[0].occlusion, Some(2));
        assert_eq!(index.annotations[1].occlusion, None);
    }
}
