//! # sigstamp
//!
//! Anchor-positioned signature and date stamping for PDF drawing sheets.
//!
//! This library stamps a signature mark (raster image and/or vector graphic)
//! and a date label onto a content-relative position of a PDF page. The
//! position is not entered by hand: the page's text is searched for a known
//! marker (for example the 设计 cell of a title block) and the stamp is
//! placed at a fixed offset from the marker's bounding box, so the same
//! configuration works across differently sized sheets.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sigstamp::{stamp_file_with_options, StampOptions};
//!
//! fn main() -> sigstamp::Result<()> {
//!     let options = StampOptions::new()
//!         .with_marker("设计")
//!         .with_image("sign.png")
//!         .with_size(50.0, 30.0);
//!
//!     let report = stamp_file_with_options("a2.pdf", "a2_signed.pdf", &options)?;
//!     println!("stamped page {} ({})", report.page_index, report.category);
//!     Ok(())
//! }
//! ```
//!
//! ## Coordinate conventions
//!
//! Text search reports boxes with the origin at the top-left corner and y
//! growing downward; the overlay draws from the bottom-left corner with y
//! growing upward. Every [`BoundingBox`] carries its convention and the flip
//! happens exactly once, inside the placement mapper.

pub mod coords;
pub mod document;
pub mod error;
pub mod locate;
pub mod model;
pub mod options;
pub mod overlay;
pub mod pipeline;
pub mod raster;

// Re-export commonly used types
pub use document::SourceDocument;
pub use error::{Error, Result};
pub use locate::locate;
pub use model::{
    AnchorMatch, BoundingBox, CoordSpace, PageCategory, PageDimensions, Placement, TextSpan,
};
pub use options::{StampMode, StampOptions, StampSpec};
pub use overlay::Overlay;
pub use pipeline::StampReport;

use std::path::Path;

use chrono::NaiveDate;

/// Stamp a document with default options: the signature image below the
/// 设计 marker, today's date inline after it.
///
/// # Example
///
/// ```no_run
/// use sigstamp::stamp_file;
///
/// stamp_file("a2.pdf", "a2_signed.pdf", "sign.png").unwrap();
/// ```
pub fn stamp_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    image: impl Into<std::path::PathBuf>,
) -> Result<StampReport> {
    let options = StampOptions::new().with_image(image);
    pipeline::run(input, output, &options)
}

/// Stamp a document with explicit options.
pub fn stamp_file_with_options<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &StampOptions,
) -> Result<StampReport> {
    pipeline::run(input, output, options)
}

/// List every occurrence of a marker across the document.
///
/// # Example
///
/// ```no_run
/// use sigstamp::find_marker;
///
/// for m in find_marker("a2.pdf", "设计").unwrap() {
///     println!("page {}: ({:.1}, {:.1})", m.page_index, m.bbox.x0, m.bbox.y0);
/// }
/// ```
pub fn find_marker<P: AsRef<Path>>(input: P, marker: &str) -> Result<Vec<AnchorMatch>> {
    pipeline::find_marker(input, marker)
}

/// Read a page's dimensions and derived sheet category.
pub fn page_info<P: AsRef<Path>>(input: P, page: usize) -> Result<(PageDimensions, PageCategory)> {
    let doc = SourceDocument::open(input)?;
    let dims = doc.dimensions(page)?;
    Ok((dims, dims.category()))
}

/// Builder for stamping runs.
///
/// # Example
///
/// ```no_run
/// use sigstamp::Sigstamp;
///
/// let report = Sigstamp::new()
///     .marker("设计")
///     .image("sign.png")
///     .size(50.0, 30.0)
///     .offset_x(30.0)
///     .stamp("a2.pdf", "a2_signed.pdf")?;
/// # Ok::<(), sigstamp::Error>(())
/// ```
pub struct Sigstamp {
    options: StampOptions,
}

impl Sigstamp {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: StampOptions::default(),
        }
    }

    /// Set the anchor marker text.
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.options = self.options.with_marker(marker);
        self
    }

    /// Set the placement mode.
    pub fn mode(mut self, mode: StampMode) -> Self {
        self.options = self.options.with_mode(mode);
        self
    }

    /// Pin the target page (0-indexed).
    pub fn page(mut self, page: usize) -> Self {
        self.options = self.options.with_page(page);
        self
    }

    /// Set the raster signature image.
    pub fn image(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.options = self.options.with_image(path);
        self
    }

    /// Set the vector signature graphic.
    pub fn vector(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.options = self.options.with_vector(path);
        self
    }

    /// Set the stamp size in points.
    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.options = self.options.with_size(width, height);
        self
    }

    /// Set the horizontal anchor offset.
    pub fn offset_x(mut self, x: f32) -> Self {
        self.options.spec.offset_x = x;
        self
    }

    /// Set the vertical anchor offset (text-only mode).
    pub fn offset_y(mut self, y: f32) -> Self {
        self.options.spec.offset_y = y;
        self
    }

    /// Allow a fallback position when the marker is absent.
    pub fn fallback(mut self, x: f32, y: f32) -> Self {
        self.options = self.options.with_fallback(x, y);
        self
    }

    /// Inject the label date instead of reading the clock at run time.
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.options = self.options.with_date(date);
        self
    }

    /// Run the stamping pipeline.
    pub fn stamp<P: AsRef<Path>, Q: AsRef<Path>>(
        self,
        input: P,
        output: Q,
    ) -> Result<StampReport> {
        pipeline::run(input, output, &self.options)
    }

    /// The accumulated options, for inspection or reuse.
    pub fn options(&self) -> &StampOptions {
        &self.options
    }
}

impl Default for Sigstamp {
    fn default() -> Self {
        Self::new()
    }
}
