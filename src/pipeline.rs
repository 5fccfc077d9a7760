//! The stamping pipeline: a straight-line run from source file to stamped
//! output. Each step's failure aborts the remaining steps; the output file
//! only appears after every step has succeeded.

use std::path::Path;

use chrono::Local;
use serde::Serialize;

use crate::coords;
use crate::document::SourceDocument;
use crate::error::{Error, Result};
use crate::locate::locate;
use crate::model::{AnchorMatch, PageCategory, Placement};
use crate::options::StampOptions;
use crate::overlay;

/// Outcome of a stamping run.
#[derive(Debug, Clone, Serialize)]
pub struct StampReport {
    /// Page that was stamped (0-indexed)
    pub page_index: usize,

    /// Size category of the stamped page
    pub category: PageCategory,

    /// The anchor the stamp was placed against, if the marker was found
    pub anchor: Option<AnchorMatch>,

    /// Final placement origin in render convention
    pub placement: Placement,

    /// The label that was stamped
    pub label: String,
}

/// Stamp one document and write the result to `output`.
pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &StampOptions,
) -> Result<StampReport> {
    options.validate()?;

    let mut doc = SourceDocument::open(input.as_ref())?;

    let (anchor, page_index) = match options.page {
        Some(index) => {
            let spans = doc.text_spans(index)?;
            let first = locate(&spans, &options.marker).next();
            (first, index)
        }
        None => {
            let spans = doc.all_text_spans()?;
            // First match wins; its page becomes the target page.
            let first = locate(&spans, &options.marker).next();
            let index = first.as_ref().map(|m| m.page_index).unwrap_or(0);
            (first, index)
        }
    };

    let dims = doc.dimensions(page_index)?;
    let category = dims.category();
    log::info!(
        "page {}: {:.0}x{:.0} pt, sheet category {}",
        page_index,
        dims.width,
        dims.height,
        category
    );

    let placement = match &anchor {
        Some(anchor) => {
            log::info!(
                "marker '{}' found on page {} at ({:.1}, {:.1})",
                options.marker,
                anchor.page_index,
                anchor.bbox.x0,
                anchor.bbox.y0
            );
            coords::map_placement(anchor, dims.height, &options.spec, options.mode)
        }
        None => match options.fallback {
            Some(point) => {
                log::warn!(
                    "marker '{}' not found, using fallback position ({}, {})",
                    options.marker,
                    point.0,
                    point.1
                );
                coords::fallback_placement(point, dims.height)
            }
            None => return Err(Error::AnchorNotFound(options.marker.clone())),
        },
    };

    let label = match &options.label {
        Some(label) => label.clone(),
        None => options
            .date
            .unwrap_or_else(|| Local::now().date_naive())
            .format("%Y%m%d")
            .to_string(),
    };

    let stamp_overlay = overlay::compose(
        &placement,
        &options.spec,
        options.mode,
        dims,
        &label,
        page_index,
    )?;
    doc.merge_overlay(stamp_overlay)?;
    doc.save(output.as_ref())?;

    Ok(StampReport {
        page_index,
        category,
        anchor,
        placement,
        label,
    })
}

/// List every occurrence of a marker across the whole document.
pub fn find_marker<P: AsRef<Path>>(input: P, marker: &str) -> Result<Vec<AnchorMatch>> {
    let doc = SourceDocument::open(input.as_ref())?;
    let spans = doc.all_text_spans()?;
    Ok(locate(&spans, marker).collect())
}
