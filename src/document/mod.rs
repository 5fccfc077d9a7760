//! Thin access layer over the source PDF document.
//!
//! Everything lopdf-specific lives here: opening, page lookup, MediaBox
//! resolution, span extraction, overlay merge, and atomic save. The rest of
//! the crate only sees the model types.

mod text;

use std::path::Path;

use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::model::{BoundingBox, PageDimensions, TextSpan};
use crate::overlay::Overlay;

/// Ascender height above the baseline, as a fraction of the font size.
const ASCENT: f32 = 0.8;

/// Descender depth below the baseline, as a fraction of the font size.
const DESCENT: f32 = 0.2;

/// An opened source document.
pub struct SourceDocument {
    doc: lopdf::Document,
}

impl SourceDocument {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc = lopdf::Document::load(path)
            .map_err(|e| Error::DocumentOpen(format!("{}: {e}", path.display())))?;
        Ok(Self { doc })
    }

    /// Open a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::DocumentOpen(e.to_string()))?;
        Ok(Self { doc })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    fn page_id(&self, index: usize) -> Result<ObjectId> {
        let pages = self.doc.get_pages();
        pages
            .values()
            .nth(index)
            .copied()
            .ok_or(Error::PageOutOfRange(index, pages.len()))
    }

    /// Physical dimensions of a page (0-indexed).
    pub fn dimensions(&self, index: usize) -> Result<PageDimensions> {
        let page_id = self.page_id(index)?;
        let media_box = self.media_box(page_id)?;
        Ok(PageDimensions::new(
            media_box[3] - media_box[1],
            media_box[2] - media_box[0],
        ))
    }

    /// MediaBox of a page, walking up the Pages tree when inherited.
    fn media_box(&self, page_id: ObjectId) -> Result<[f32; 4]> {
        let mut dict = self.doc.get_dictionary(page_id)?;
        loop {
            if let Ok(obj) = dict.get(b"MediaBox") {
                let obj = match obj {
                    Object::Reference(id) => self.doc.get_object(*id)?,
                    direct => direct,
                };
                let array = obj
                    .as_array()
                    .map_err(|_| Error::PdfParse("MediaBox is not an array".to_string()))?;
                if array.len() < 4 {
                    return Err(Error::PdfParse("malformed MediaBox".to_string()));
                }
                let mut coords = [0.0f32; 4];
                for (slot, entry) in coords.iter_mut().zip(array) {
                    *slot = entry
                        .as_float()
                        .map_err(|_| Error::PdfParse("non-numeric MediaBox entry".to_string()))?;
                }
                return Ok(coords);
            }
            match dict.get(b"Parent").ok().and_then(|p| p.as_reference().ok()) {
                Some(parent_id) => dict = self.doc.get_dictionary(parent_id)?,
                None => break,
            }
        }
        log::warn!("page has no MediaBox, assuming Letter size");
        Ok([0.0, 0.0, 612.0, 792.0])
    }

    /// Extract positioned text spans from one page, in document convention.
    pub fn text_spans(&self, index: usize) -> Result<Vec<TextSpan>> {
        let page_id = self.page_id(index)?;
        let page_height = self.dimensions(index)?.height;

        let raw = text::extract_spans(&self.doc, page_id)?;
        Ok(raw
            .into_iter()
            .map(|span| TextSpan {
                page_index: index,
                bbox: BoundingBox::document(
                    span.x,
                    page_height - (span.y + span.font_size * ASCENT),
                    span.x + span.width,
                    page_height - (span.y - span.font_size * DESCENT),
                ),
                text: span.text,
            })
            .collect())
    }

    /// Extract spans from every page, in page order.
    pub fn all_text_spans(&self) -> Result<Vec<TextSpan>> {
        let mut spans = Vec::new();
        for index in 0..self.page_count() {
            spans.extend(self.text_spans(index)?);
        }
        Ok(spans)
    }

    /// Merge an overlay onto its target page.
    ///
    /// The overlay packet is imported into this document's object space and
    /// wrapped as a form XObject drawn on top of the existing content. The
    /// overlay is consumed; it cannot be merged twice.
    pub fn merge_overlay(&mut self, overlay: Overlay) -> Result<()> {
        let page_id = self.page_id(overlay.page_index())?;

        let mut packet = lopdf::Document::load_mem(overlay.bytes())
            .map_err(|e| Error::Merge(format!("overlay packet: {e}")))?;
        packet.renumber_objects_with(self.doc.max_id + 1);

        let packet_page_id = packet
            .get_pages()
            .values()
            .next()
            .copied()
            .ok_or_else(|| Error::Merge("overlay packet has no page".to_string()))?;

        let (packet_resources, packet_media_box) = {
            let dict = packet
                .get_dictionary(packet_page_id)
                .map_err(|e| Error::Merge(e.to_string()))?;
            let resources = dict
                .get(b"Resources")
                .cloned()
                .unwrap_or_else(|_| Object::Dictionary(Dictionary::new()));
            let media_box = dict
                .get(b"MediaBox")
                .cloned()
                .map_err(|e| Error::Merge(format!("overlay page lacks MediaBox: {e}")))?;
            (resources, media_box)
        };
        let packet_content = content_bytes(&packet, packet_page_id)
            .map_err(|e| Error::Merge(e.to_string()))?;

        self.doc.objects.extend(packet.objects);
        // max_id must cover the imported ids or add_object would reuse them.
        if let Some(max) = self.doc.objects.keys().map(|(num, _)| *num).max() {
            self.doc.max_id = self.doc.max_id.max(max);
        }

        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => packet_media_box,
                "Resources" => packet_resources,
            },
            packet_content,
        );
        let form_id = self.doc.add_object(form);
        let stamp_name = format!("Stamp{}", form_id.0);

        // Register the form under the page's XObject resources, resolving
        // one level of indirection so shared dictionaries are not mutated.
        let mut resources = {
            let page_dict = self
                .doc
                .get_dictionary(page_id)
                .map_err(|e| Error::Merge(e.to_string()))?;
            self.resolved_dict(page_dict.get(b"Resources").ok())?
        };
        let mut xobjects = self.resolved_dict(resources.get(b"XObject").ok())?;
        xobjects.set(stamp_name.as_bytes().to_vec(), Object::Reference(form_id));
        resources.set("XObject", Object::Dictionary(xobjects));

        let draw_ops = format!("q\n/{stamp_name} Do\nQ\n");
        let draw_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), draw_ops.into_bytes()));

        let existing_contents = {
            let page_dict = self
                .doc
                .get_dictionary(page_id)
                .map_err(|e| Error::Merge(e.to_string()))?;
            page_dict.get(b"Contents").ok().cloned()
        };
        let new_contents = match existing_contents {
            Some(Object::Reference(existing)) => Object::Array(vec![
                Object::Reference(existing),
                Object::Reference(draw_id),
            ]),
            Some(Object::Array(mut streams)) => {
                streams.push(Object::Reference(draw_id));
                Object::Array(streams)
            }
            Some(direct @ Object::Stream(_)) => {
                let moved = self.doc.add_object(direct);
                Object::Array(vec![Object::Reference(moved), Object::Reference(draw_id)])
            }
            _ => Object::Reference(draw_id),
        };

        let page = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| Error::Merge(e.to_string()))?;
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", new_contents);

        log::debug!(
            "merged overlay onto page {} as /{stamp_name}",
            overlay.page_index()
        );
        Ok(())
    }

    fn resolved_dict(&self, obj: Option<&Object>) -> Result<Dictionary> {
        match obj {
            None => Ok(Dictionary::new()),
            Some(Object::Dictionary(dict)) => Ok(dict.clone()),
            Some(Object::Reference(id)) => Ok(self
                .doc
                .get_dictionary(*id)
                .map_err(|e| Error::Merge(e.to_string()))?
                .clone()),
            Some(_) => Err(Error::Merge(
                "expected a dictionary in page resources".to_string(),
            )),
        }
    }

    /// Save the document, writing to a temporary file in the target
    /// directory and renaming on success so a failed run leaves no partial
    /// output behind.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.doc.renumber_objects();

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| Error::Persist(e.to_string()))?;
        self.doc
            .save_to(tmp.as_file_mut())
            .map_err(|e| Error::Persist(e.to_string()))?;
        tmp.persist(path).map_err(|e| Error::Persist(e.to_string()))?;

        log::info!("saved stamped document to {}", path.display());
        Ok(())
    }
}

/// Concatenated, decompressed content of a page.
pub(crate) fn content_bytes(doc: &lopdf::Document, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc.get_dictionary(page_id)?;
    let contents = match page_dict.get(b"Contents") {
        Ok(contents) => contents,
        // A page with no content streams has no text.
        Err(_) => return Ok(Vec::new()),
    };

    match contents {
        Object::Reference(id) => stream_content(doc, *id),
        Object::Stream(stream) => Ok(stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone())),
        Object::Array(parts) => {
            let mut content = Vec::new();
            for part in parts {
                if let Ok(id) = part.as_reference() {
                    content.extend_from_slice(&stream_content(doc, id)?);
                    content.push(b' ');
                }
            }
            Ok(content)
        }
        _ => Err(Error::PdfParse("invalid content stream".to_string())),
    }
}

fn stream_content(doc: &lopdf::Document, id: ObjectId) -> Result<Vec<u8>> {
    let stream = doc.get_object(id)?.as_stream()?;
    Ok(stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone()))
}
