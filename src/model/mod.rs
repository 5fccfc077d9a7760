//! Data model for pages, geometry, and anchor matches.

mod geom;
mod page;

pub use geom::{AnchorMatch, BoundingBox, CoordSpace, Placement, TextSpan};
pub use page::{PageCategory, PageDimensions};
