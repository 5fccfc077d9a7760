//! Placement mapping between the document and render conventions.
//!
//! This is the only module where the two conventions meet: everything
//! upstream works in document space, everything downstream in render space,
//! and the single `page_height - y` flip happens here.

use crate::model::{AnchorMatch, Placement};
use crate::options::{StampMode, StampSpec};

/// Map an anchor match to the stamp placement origin in render convention.
///
/// The horizontal offset is always applied. Text-only stamps additionally
/// offset vertically from the box top; the image modes anchor directly at
/// the box top and let the compositor hang the image below it.
pub fn map_placement(
    anchor: &AnchorMatch,
    page_height: f32,
    spec: &StampSpec,
    mode: StampMode,
) -> Placement {
    let bbox = anchor.bbox.to_document(page_height);

    let x = bbox.x0 + spec.offset_x;
    let y = match mode {
        StampMode::TextOnly => bbox.y0 + spec.offset_y,
        StampMode::ImageThenText | StampMode::ImageWithVectorOverlay => bbox.y0,
    };

    Placement {
        x,
        y: page_height - y,
    }
}

/// Placement for an explicitly configured fallback point (document
/// convention). Only the pipeline decides to use this, and only when the
/// caller opted in.
pub fn fallback_placement(point: (f32, f32), page_height: f32) -> Placement {
    Placement {
        x: point.0,
        y: page_height - point.1,
    }
}
