//! Stamping options and configuration.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Placement policy of a stamp.
///
/// The three modes carry their own offset and anchor rules; the mode is an
/// explicit choice, never inferred from which paths happen to be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StampMode {
    /// Date label only, offset from the anchor box top.
    TextOnly,
    /// Signature image below the anchor line, date label inline after it.
    #[default]
    ImageThenText,
    /// Like `ImageThenText` plus a scaled vector graphic.
    ImageWithVectorOverlay,
}

/// Geometry and resources of the stamp itself.
#[derive(Debug, Clone)]
pub struct StampSpec {
    /// Raster signature image (required in the image modes)
    pub image_path: Option<PathBuf>,

    /// Vector signature graphic (required in the vector mode)
    pub vector_path: Option<PathBuf>,

    /// Stamp width in points
    pub target_width: f32,

    /// Stamp height in points
    pub target_height: f32,

    /// Horizontal offset from the anchor box origin, always applied
    pub offset_x: f32,

    /// Vertical offset from the anchor box top, applied in text-only mode
    pub offset_y: f32,

    /// Label font size in points
    pub font_size: f32,

    /// JPEG quality used when re-encoding resized signature images
    pub jpeg_quality: u8,
}

impl Default for StampSpec {
    fn default() -> Self {
        Self {
            image_path: None,
            vector_path: None,
            target_width: 50.0,
            target_height: 30.0,
            offset_x: 30.0,
            offset_y: 0.0,
            font_size: 24.0,
            jpeg_quality: 95,
        }
    }
}

/// Options for a single stamping run.
#[derive(Debug, Clone)]
pub struct StampOptions {
    /// Marker text that anchors the stamp
    pub marker: String,

    /// Placement policy
    pub mode: StampMode,

    /// Target page (0-indexed). `None` searches every page and stamps the
    /// page of the first match.
    pub page: Option<usize>,

    /// Explicit fallback position in document convention, used only when the
    /// marker is absent. Without it an absent marker is an error.
    pub fallback: Option<(f32, f32)>,

    /// Label date. `None` resolves to today at run time.
    pub date: Option<NaiveDate>,

    /// Literal label override; replaces the formatted date entirely.
    pub label: Option<String>,

    /// Stamp geometry and resources
    pub spec: StampSpec,
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            marker: "设计".to_string(),
            mode: StampMode::default(),
            page: None,
            fallback: None,
            date: None,
            label: None,
            spec: StampSpec::default(),
        }
    }
}

impl StampOptions {
    /// Create new stamp options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the anchor marker text.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Set the placement mode.
    pub fn with_mode(mut self, mode: StampMode) -> Self {
        self.mode = mode;
        self
    }

    /// Pin the target page (0-indexed).
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    /// Allow a fallback position (document convention) when the marker is
    /// absent.
    pub fn with_fallback(mut self, x: f32, y: f32) -> Self {
        self.fallback = Some((x, y));
        self
    }

    /// Inject the label date instead of reading the clock at run time.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Replace the date label with a literal string.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the raster signature image.
    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.spec.image_path = Some(path.into());
        self
    }

    /// Set the vector signature graphic.
    pub fn with_vector(mut self, path: impl Into<PathBuf>) -> Self {
        self.spec.vector_path = Some(path.into());
        self
    }

    /// Set the stamp size in points.
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.spec.target_width = width;
        self.spec.target_height = height;
        self
    }

    /// Set the anchor offsets in points.
    pub fn with_offsets(mut self, x: f32, y: f32) -> Self {
        self.spec.offset_x = x;
        self.spec.offset_y = y;
        self
    }

    /// Set the label font size.
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.spec.font_size = size;
        self
    }

    /// Check that the options are usable before touching any file.
    pub fn validate(&self) -> Result<()> {
        if self.marker.is_empty() {
            return Err(Error::InvalidConfiguration(
                "marker text is empty".to_string(),
            ));
        }
        match self.mode {
            StampMode::TextOnly => {}
            StampMode::ImageThenText => {
                require_path(self.spec.image_path.as_deref(), "image")?;
            }
            StampMode::ImageWithVectorOverlay => {
                require_path(self.spec.image_path.as_deref(), "image")?;
                require_path(self.spec.vector_path.as_deref(), "vector graphic")?;
            }
        }
        Ok(())
    }
}

fn require_path(path: Option<&Path>, what: &str) -> Result<()> {
    match path {
        Some(_) => Ok(()),
        None => Err(Error::InvalidConfiguration(format!(
            "{what} path is required for this stamp mode"
        ))),
    }
}
