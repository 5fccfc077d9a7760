//! Geometry types shared by the anchor and compositing stages.
//!
//! Two coordinate conventions coexist in a stamping run: text search reports
//! positions with the origin at the top-left corner and y growing downward,
//! while the overlay canvas draws with the origin at the bottom-left corner
//! and y growing upward. Every box carries its convention explicitly so a
//! flip can never be applied twice.

use serde::{Deserialize, Serialize};

/// Coordinate convention a bounding box is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordSpace {
    /// Origin top-left, y increases downward (text search results).
    Document,
    /// Origin bottom-left, y increases upward (overlay canvas).
    Render,
}

/// An axis-aligned rectangle tagged with its coordinate convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    /// Convention the y coordinates are expressed in
    pub space: CoordSpace,
}

impl BoundingBox {
    /// Create a box in document convention (top-left origin).
    pub fn document(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            space: CoordSpace::Document,
        }
    }

    /// Create a box in render convention (bottom-left origin).
    pub fn render(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            space: CoordSpace::Render,
        }
    }

    /// Convert into render convention. Identity if already in render space.
    pub fn to_render(self, page_height: f32) -> Self {
        self.into_space(CoordSpace::Render, page_height)
    }

    /// Convert into document convention. Identity if already in document space.
    pub fn to_document(self, page_height: f32) -> Self {
        self.into_space(CoordSpace::Document, page_height)
    }

    fn into_space(self, space: CoordSpace, page_height: f32) -> Self {
        if self.space == space {
            return self;
        }
        // The flip is its own inverse; y0/y1 keep their identity (y0 stays
        // the text-top edge) so a round trip restores the box exactly.
        Self {
            x0: self.x0,
            y0: page_height - self.y0,
            x1: self.x1,
            y1: page_height - self.y1,
            space,
        }
    }

    /// Box width.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }
}

/// A positioned text span extracted from a page, in document convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Page the span was found on (0-indexed)
    pub page_index: usize,

    /// Decoded text content
    pub text: String,

    /// Bounding box in document convention
    pub bbox: BoundingBox,
}

/// A located occurrence of the anchor marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorMatch {
    /// Page the marker was found on (0-indexed)
    pub page_index: usize,

    /// The matched marker text
    pub text: String,

    /// Bounding box of the match in document convention
    pub bbox: BoundingBox,
}

/// Final stamp placement origin, always in render convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_uses_page_height() {
        let b = BoundingBox::document(10.0, 20.0, 50.0, 40.0).to_render(842.0);
        assert_eq!(b.space, CoordSpace::Render);
        assert_eq!(b.y0, 822.0);
        assert_eq!(b.y1, 802.0);
        assert_eq!(b.x0, 10.0);
        assert_eq!(b.x1, 50.0);
    }

    #[test]
    fn test_round_trip_is_exact() {
        let original = BoundingBox::document(10.0, 20.0, 50.0, 40.0);
        let back = original.to_render(842.0).to_document(842.0);
        assert_eq!(back, original);
    }

    #[test]
    fn test_conversion_is_idempotent_per_space() {
        let b = BoundingBox::document(10.0, 20.0, 50.0, 40.0);
        // Converting to the space the box is already in must not flip again.
        assert_eq!(b.to_document(842.0), b);
        let r = b.to_render(842.0);
        assert_eq!(r.to_render(842.0), r);
    }

    #[test]
    fn test_width() {
        let b = BoundingBox::document(10.0, 20.0, 50.0, 40.0);
        assert_eq!(b.width(), 40.0);
    }

    #[test]
    fn test_space_tag_survives_serialization() {
        let m = AnchorMatch {
            page_index: 0,
            text: "设计".to_string(),
            bbox: BoundingBox::document(10.0, 20.0, 50.0, 40.0),
        };
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"space\":\"document\""));

        let back: AnchorMatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
