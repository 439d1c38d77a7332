//! Core dataset index for one conversion run.
//!
//! Readers parse source files into this format-agnostic index; the splitter
//! and writers consume it. An index is owned entirely by a single run and
//! nothing in it survives the run.

use super::bbox::BBoxXYXY;
use super::ids::{AnnotationId, CategoryId, ImageId};
use super::space::Pixel;

/// The in-memory dataset index: images, categories, annotations.
#[derive(Clone, Debug, Default)]
pub struct DatasetIndex {
    /// All images, in source order.
    pub images: Vec<Image>,

    /// All category definitions.
    pub categories: Vec<Category>,

    /// All annotations, in source order.
    pub annotations: Vec<Annotation>,
}

/// An image in the dataset. Created during the corpus scan; immutable
/// thereafter. `id` is the join key to annotations.
#[derive(Clone, Debug)]
pub struct Image {
    pub id: ImageId,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

impl Image {
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
        }
    }
}

/// A category (class label). Within one run, id and name form a bijection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A bounding-box annotation.
///
/// `id` is only unique within one output document; COCO writers renumber
/// sequentially from 0 per document.
#[derive(Clone, Debug)]
pub struct Annotation {
    pub id: AnnotationId,
    pub image_id: ImageId,
    pub category_id: CategoryId,

    /// Bounding box in pixel-space XYXY.
    pub bbox: BBoxXYXY<Pixel>,

    pub iscrowd: u8,

    /// Occlusion level carried from VOC `<truncated>`, when present.
    pub occlusion: Option<u32>,
}

impl Annotation {
    pub fn new(
        id: impl Into<AnnotationId>,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        bbox: BBoxXYXY<Pixel>,
    ) -> Self {
        Self {
            id: id.into(),
            image_id: image_id.into(),
            category_id: category_id.into(),
            bbox,
            iscrowd: 0,
            occlusion: None,
        }
    }

    pub fn with_occlusion(mut self, occlusion: u32) -> Self {
        self.occlusion = Some(occlusion);
        self
    }
}
