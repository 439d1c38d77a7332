//! The two conversion pipelines.
//!
//! Both share one shape: reader -> dataset index -> splitter -> writer. The
//! pipelines are independent; nothing is shared between runs. Each run
//! returns a [`ConversionSummary`] so skipped and dropped items stay
//! auditable after the fact.

pub mod coco2yolo;
pub mod xml2coco;

pub use coco2yolo::Coco2YoloOptions;
pub use xml2coco::Xml2CocoOptions;

use std::fmt;

/// Counts of what one conversion run wrote and what it left out.
///
/// Every per-item skip is also logged at the point it happens; the summary
/// only aggregates, so a run's completeness can be checked at a glance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Images placed into the train subset.
    pub train_images: usize,

    /// Images placed into the holdout (validation/test) subset.
    pub holdout_images: usize,

    /// Annotations written across both subsets.
    pub annotations: usize,

    /// Source files excluded by the reader (bad stem, missing image,
    /// unparsable content).
    pub skipped_files: usize,

    /// Annotations dropped during writing (unknown category, degenerate
    /// image geometry).
    pub dropped_annotations: usize,

    /// Image files that could not be copied into the output tree.
    pub failed_copies: usize,
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Images: {} train, {} holdout",
            self.train_images, self.holdout_images
        )?;
        writeln!(f, "Annotations written: {}", self.annotations)?;

        if self.skipped_files > 0 {
            writeln!(f, "Skipped source files: {}", self.skipped_files)?;
        }
        if self.dropped_annotations > 0 {
            writeln!(f, "Dropped annotations: {}", self.dropped_annotations)?;
        }
        if self.failed_copies > 0 {
            writeln!(f, "Failed image copies: {}", self.failed_copies)?;
        }

        Ok(())
    }
}
