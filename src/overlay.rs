//! Overlay construction.
//!
//! The overlay is a complete single-page PDF built in memory with
//! `pdf-writer`: the resized raster signature as an RGB image XObject with an
//! alpha soft mask, the optional vector signature converted by `svg2pdf`, and
//! the date label in the Helvetica base font. The merge step later imports
//! this page into the target document as a form XObject.

use std::collections::HashMap;
use std::fs;

use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str};

use crate::error::{Error, Result};
use crate::model::{PageDimensions, Placement};
use crate::options::{StampMode, StampSpec};
use crate::raster::{self, RasterStamp};

/// Horizontal gap between the image's right edge and the label baseline.
const LABEL_GUTTER: f32 = 5.0;

/// Lift of the label baseline above the image's bottom edge.
const LABEL_LIFT: f32 = 5.0;

const IMAGE_NAME: Name<'static> = Name(b"Im1");
const VECTOR_NAME: Name<'static> = Name(b"S1");
const FONT_NAME: Name<'static> = Name(b"F1");

/// A page-scoped overlay, ready to be merged exactly once.
#[derive(Debug)]
pub struct Overlay {
    bytes: Vec<u8>,
    page_index: usize,
}

impl Overlay {
    /// Page the overlay was composed for (0-indexed).
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// The overlay as a finished single-page PDF.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

struct VectorStamp {
    chunk: pdf_writer::Chunk,
    xobject: Ref,
    scale_x: f32,
    scale_y: f32,
    intrinsic_width: f32,
    intrinsic_height: f32,
}

/// Build the overlay for one page.
///
/// `placement` is the mapped anchor origin in render convention; the raster
/// and vector stamps hang below it, the label position depends on the mode.
pub fn compose(
    placement: &Placement,
    spec: &StampSpec,
    mode: StampMode,
    page: PageDimensions,
    label: &str,
    page_index: usize,
) -> Result<Overlay> {
    if spec.target_width <= 0.0 || spec.target_height <= 0.0 {
        return Err(Error::InvalidConfiguration(format!(
            "stamp target size must be positive, got {}x{}",
            spec.target_width, spec.target_height
        )));
    }

    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let page_id = alloc.bump();
    let content_id = alloc.bump();
    let font_id = alloc.bump();
    let image_id = alloc.bump();
    let smask_id = alloc.bump();

    let raster = match mode {
        StampMode::TextOnly => None,
        StampMode::ImageThenText | StampMode::ImageWithVectorOverlay => {
            let path = spec.image_path.as_deref().ok_or_else(|| {
                Error::InvalidConfiguration("image path is required for this stamp mode".into())
            })?;
            Some(raster::load_scaled(path, spec.target_width, spec.target_height)?)
        }
    };

    let vector = match mode {
        StampMode::ImageWithVectorOverlay => {
            let path = spec.vector_path.as_deref().ok_or_else(|| {
                Error::InvalidConfiguration(
                    "vector graphic path is required for this stamp mode".into(),
                )
            })?;
            Some(load_vector(path, spec, &mut alloc)?)
        }
        _ => None,
    };

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    {
        let mut page_writer = pdf.page(page_id);
        page_writer.media_box(Rect::new(0.0, 0.0, page.width, page.height));
        page_writer.parent(page_tree_id);
        page_writer.contents(content_id);

        let mut resources = page_writer.resources();
        resources.fonts().pair(FONT_NAME, font_id);
        let mut xobjects = resources.x_objects();
        if raster.is_some() {
            xobjects.pair(IMAGE_NAME, image_id);
        }
        if let Some(v) = &vector {
            xobjects.pair(VECTOR_NAME, v.xobject);
        }
        xobjects.finish();
        resources.finish();
        page_writer.finish();
    }

    pdf.type1_font(font_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    if let Some(r) = &raster {
        write_image_xobject(&mut pdf, image_id, smask_id, r);
    }

    let content = build_content(placement, spec, mode, label, raster.is_some(), vector.as_ref());
    pdf.stream(content_id, &content.finish());

    if let Some(v) = vector {
        pdf.extend(&v.chunk);
    }

    Ok(Overlay {
        bytes: pdf.finish(),
        page_index,
    })
}

fn build_content(
    placement: &Placement,
    spec: &StampSpec,
    mode: StampMode,
    label: &str,
    has_raster: bool,
    vector: Option<&VectorStamp>,
) -> Content {
    let mut content = Content::new();

    // The stamp body hangs below the anchored text line: its bottom edge
    // sits target_height under the placement.
    let body_bottom = placement.y - spec.target_height;

    if has_raster {
        content.save_state();
        content.transform([
            spec.target_width,
            0.0,
            0.0,
            spec.target_height,
            placement.x,
            body_bottom,
        ]);
        content.x_object(IMAGE_NAME);
        content.restore_state();
    }

    if let Some(v) = vector {
        // svg2pdf normalizes the scene to a unit square, so the intrinsic
        // size re-enters through the independently computed scale factors.
        content.save_state();
        content.transform([
            v.intrinsic_width * v.scale_x,
            0.0,
            0.0,
            v.intrinsic_height * v.scale_y,
            placement.x,
            body_bottom,
        ]);
        content.x_object(VECTOR_NAME);
        content.restore_state();
    }

    let (label_x, label_y) = match mode {
        StampMode::TextOnly => (placement.x, placement.y),
        StampMode::ImageThenText | StampMode::ImageWithVectorOverlay => (
            placement.x + spec.target_width + LABEL_GUTTER,
            body_bottom + LABEL_LIFT,
        ),
    };

    content.begin_text();
    content.set_font(FONT_NAME, spec.font_size);
    content.next_line(label_x, label_y);
    content.show(Str(label.as_bytes()));
    content.end_text();

    content
}

fn write_image_xobject(pdf: &mut Pdf, image_id: Ref, smask_id: Ref, stamp: &RasterStamp) {
    let mut image = pdf.image_xobject(image_id, &stamp.rgb);
    image.filter(Filter::FlateDecode);
    image.width(stamp.width as i32);
    image.height(stamp.height as i32);
    image.color_space().device_rgb();
    image.bits_per_component(8);
    image.s_mask(smask_id);
    image.finish();

    let mut mask = pdf.image_xobject(smask_id, &stamp.alpha);
    mask.filter(Filter::FlateDecode);
    mask.width(stamp.width as i32);
    mask.height(stamp.height as i32);
    mask.color_space().device_gray();
    mask.bits_per_component(8);
    mask.finish();
}

fn load_vector(path: &std::path::Path, spec: &StampSpec, alloc: &mut Ref) -> Result<VectorStamp> {
    let svg = fs::read_to_string(path)?;

    let mut options = svg2pdf::usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = svg2pdf::usvg::Tree::from_str(&svg, &options)
        .map_err(|e| Error::VectorDecode(e.to_string()))?;

    let size = tree.size();
    let (vw, vh) = (size.width(), size.height());
    if vw <= 0.0 || vh <= 0.0 {
        return Err(Error::VectorDecode(format!(
            "vector graphic has a degenerate intrinsic size ({vw}x{vh})"
        )));
    }

    let (chunk, root) = svg2pdf::to_chunk(&tree, svg2pdf::ConversionOptions::default())
        .map_err(|e| Error::VectorDecode(e.to_string()))?;

    let mut id_map = HashMap::new();
    let chunk = chunk.renumber(|old| *id_map.entry(old).or_insert_with(|| alloc.bump()));
    let xobject = id_map
        .get(&root)
        .copied()
        .ok_or_else(|| Error::VectorDecode("vector root object lost in renumbering".into()))?;

    Ok(VectorStamp {
        chunk,
        xobject,
        scale_x: spec.target_width / vw,
        scale_y: spec.target_height / vh,
        intrinsic_width: vw,
        intrinsic_height: vh,
    })
}
