//! Page-level types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Physical size of a page in points (1 point = 1/72 inch).
///
/// Read once from the page's MediaBox and immutable afterwards; the size
/// category is derived from the dimensions, never stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    /// Page height in points
    pub height: f32,

    /// Page width in points
    pub width: f32,
}

impl PageDimensions {
    /// Create page dimensions from a (height, width) pair.
    pub fn new(height: f32, width: f32) -> Self {
        Self { height, width }
    }

    /// Classify the page into a standard drawing-sheet category.
    ///
    /// Portrait pages (height > width) classify as [`PageCategory::A4PortraitTall`]
    /// before any exact size is considered. Exact matches compare the
    /// dimensions rounded to whole points, the same rounding the sheet sizes
    /// are read with.
    pub fn category(&self) -> PageCategory {
        let h = self.height.round() as i64;
        let w = self.width.round() as i64;

        if h > w {
            return PageCategory::A4PortraitTall;
        }

        const SHEETS: [(i64, i64, PageCategory); 5] = [
            (2384, 3370, PageCategory::A0),
            (1684, 2384, PageCategory::A1),
            (1191, 1684, PageCategory::A2),
            (842, 1191, PageCategory::A3),
            (595, 842, PageCategory::A4),
        ];

        let mut category = PageCategory::Unclassified;
        for (sheet_h, sheet_w, sheet) in SHEETS {
            if h == sheet_h && w == sheet_w {
                category = sheet;
            }
        }
        category
    }

    /// Check if the page is in landscape orientation.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

/// Standard drawing-sheet size categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageCategory {
    /// A0 landscape sheet (2384 x 3370 pt)
    A0,
    /// A1 landscape sheet (1684 x 2384 pt)
    A1,
    /// A2 landscape sheet (1191 x 1684 pt)
    A2,
    /// A3 landscape sheet (842 x 1191 pt)
    A3,
    /// A4 landscape sheet (595 x 842 pt)
    A4,
    /// Any portrait page, regardless of exact size
    A4PortraitTall,
    /// No known sheet size matched
    Unclassified,
}

impl fmt::Display for PageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageCategory::A0 => "A0",
            PageCategory::A1 => "A1",
            PageCategory::A2 => "A2",
            PageCategory::A3 => "A3",
            PageCategory::A4 => "A4",
            PageCategory::A4PortraitTall => "A4 portrait",
            PageCategory::Unclassified => "unclassified",
        };
        f.write_str(name)
    }
}
