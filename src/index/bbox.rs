//! Bounding box types and the conversions between box conventions.
//!
//! The canonical in-memory representation is XYXY (xmin, ymin, xmax, ymax)
//! in pixel space. Conversions to COCO's corner+size `[x, y, w, h]` and to
//! YOLO's normalized center+size `(cx, cy, w, h)` are pure functions that
//! return new values; no input is ever mutated.

use super::coord::Coord;
use super::{Normalized, Pixel};

/// An axis-aligned bounding box in XYXY format (xmin, ymin, xmax, ymax).
///
/// The `TSpace` parameter is either [`Pixel`](super::Pixel) or
/// [`Normalized`](super::Normalized).
///
/// Note: min < max is NOT enforced. Malformed corner input propagates as
/// negative width/height rather than being rejected here, matching the
/// reference conversion behavior.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn new(min: Coord<TSpace>, max: Coord<TSpace>) -> Self {
        Self { min, max }
    }

    /// Creates a new bounding box from explicit corner coordinates.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            min: Coord::new(xmin, ymin),
            max: Coord::new(xmax, ymax),
        }
    }

    /// Converts from XYWH format (x, y, width, height) where (x, y) is the
    /// top-left corner. This is the format used by COCO annotations.
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_xyxy(x, y, x + width, y + height)
    }

    /// Converts from center+size format (cx, cy, width, height). This is the
    /// format used by YOLO labels (in normalized space).
    #[inline]
    pub fn from_cxcywh(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self::from_xyxy(
            cx - width / 2.0,
            cy - height / 2.0,
            cx + width / 2.0,
            cy + height / 2.0,
        )
    }

    /// Converts to XYWH format (x, y, width, height).
    #[inline]
    pub fn to_xywh(&self) -> (f64, f64, f64, f64) {
        (self.xmin(), self.ymin(), self.width(), self.height())
    }

    /// Converts to center+size format (cx, cy, width, height).
    #[inline]
    pub fn to_cxcywh(&self) -> (f64, f64, f64, f64) {
        (
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            self.width(),
            self.height(),
        )
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.min.x
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.min.y
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.max.x
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.max.y
    }

    /// Width of the box. May be negative if the box is malformed (xmax < xmin).
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the box. May be negative if the box is malformed (ymax < ymin).
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Area of the box. May be negative if the box is malformed.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Returns true if all coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Returns true if the box is properly ordered (min <= max for both axes).
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.min.x)
            .field("ymin", &self.min.y)
            .field("xmax", &self.max.x)
            .field("ymax", &self.max.y)
            .finish()
    }
}

impl<TSpace> Default for BBoxXYXY<TSpace> {
    fn default() -> Self {
        Self::from_xyxy(0.0, 0.0, 0.0, 0.0)
    }
}

impl BBoxXYXY<Pixel> {
    /// Converts pixel coordinates to normalized coordinates.
    ///
    /// Callers must reject zero-valued image dimensions before calling; a
    /// zero divisor would otherwise produce infinities.
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Normalized> {
        BBoxXYXY::from_xyxy(
            self.min.x / image_width,
            self.min.y / image_height,
            self.max.x / image_width,
            self.max.y / image_height,
        )
    }
}

impl BBoxXYXY<Normalized> {
    /// Converts normalized coordinates back to pixel coordinates.
    pub fn to_pixel(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Pixel> {
        BBoxXYXY::from_xyxy(
            self.min.x * image_width,
            self.min.y * image_height,
            self.max.x * image_width,
            self.max.y * image_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_from_xyxy() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(10.0, 20.0, 100.0, 80.0);
        assert_eq!(bbox.xmin(), 10.0);
        assert_eq!(bbox.ymin(), 20.0);
        assert_eq!(bbox.xmax(), 100.0);
        assert_eq!(bbox.ymax(), 80.0);
    }

    #[test]
    fn bbox_from_xywh() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xywh(10.0, 20.0, 90.0, 60.0);
        assert_eq!(bbox.xmax(), 100.0);
        assert_eq!(bbox.ymax(), 80.0);
    }

    #[test]
    fn corner_to_size_conversion() {
        // 10..30 x 20..50 on the corner convention.
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(10.0, 20.0, 30.0, 50.0);
        let (x, y, w, h) = bbox.to_xywh();
        assert_eq!((x, y, w, h), (10.0, 20.0, 20.0, 30.0));
        assert_eq!(bbox.area(), 600.0);
    }

    #[test]
    fn normalized_center_size() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(10.0, 20.0, 30.0, 50.0);
        let (cx, cy, w, h) = bbox.to_normalized(100.0, 200.0).to_cxcywh();
        assert!((cx - 0.2).abs() < 1e-12);
        assert!((cy - 0.175).abs() < 1e-12);
        assert!((w - 0.2).abs() < 1e-12);
        assert!((h - 0.15).abs() < 1e-12);
    }

    #[test]
    fn pixel_normalized_roundtrip() {
        let original: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(13.0, 7.5, 91.0, 44.25);
        let restored = original.to_normalized(640.0, 480.0).to_pixel(640.0, 480.0);
        assert!((original.xmin() - restored.xmin()).abs() < 1e-9);
        assert!((original.ymin() - restored.ymin()).abs() < 1e-9);
        assert!((original.xmax() - restored.xmax()).abs() < 1e-9);
        assert!((original.ymax() - restored.ymax()).abs() < 1e-9);
    }

    #[test]
    fn cxcywh_roundtrip() {
        let original: BBoxXYXY<Normalized> = BBoxXYXY::from_cxcywh(0.5, 0.4, 0.2, 0.3);
        let (cx, cy, w, h) = original.to_cxcywh();
        let restored: BBoxXYXY<Normalized> = BBoxXYXY::from_cxcywh(cx, cy, w, h);
        assert_eq!(original, restored);
    }

    #[test]
    fn malformed_corners_propagate() {
        // Inverted corners keep their negative extent; nothing clamps.
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(30.0, 50.0, 10.0, 20.0);
        assert!(!bbox.is_ordered());
        assert_eq!(bbox.width(), -20.0);
        assert_eq!(bbox.height(), -30.0);
        assert_eq!(bbox.area(), 600.0);
    }
}
