//! Coordinate space marker types.
//!
//! Zero-sized types used as type parameters to distinguish coordinate
//! systems at compile time.

use std::fmt;

/// Marker type for absolute pixel coordinates, (0, 0) at the top-left.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker type for coordinates normalized to image dimensions (0.0 to 1.0).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {} // unreachable: Pixel has no variants
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {} // unreachable: Normalized has no variants
    }
}
