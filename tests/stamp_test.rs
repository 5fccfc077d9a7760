//! End-to-end tests for the stamping pipeline.
//!
//! Synthetic drawing sheets are built in memory with lopdf, stamped through
//! the public API, and the merged output is inspected down to the overlay's
//! drawing operations.

use std::path::{Path, PathBuf};

use lopdf::{dictionary, Document, Object, Stream};
use tempfile::TempDir;

use sigstamp::{
    find_marker, page_info, stamp_file_with_options, Error, PageCategory, StampMode, StampOptions,
};

/// A page description: (width, height, [(text, baseline_x, baseline_y)]).
type PageSpec<'a> = (f32, f32, &'a [(&'a str, f32, f32)]);

/// Build a PDF with one Helvetica-labelled page per spec, 10 pt font.
fn sheet_pdf(pages: &[PageSpec]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for (width, height, texts) in pages {
        let mut content = String::new();
        for (text, x, y) in *texts {
            content.push_str(&format!("BT\n/F1 10 Tf\n{x} {y} Td\n({text}) Tj\nET\n"));
        }
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => Object::Array(vec![
                0.into(),
                0.into(),
                (*width as f64).into(),
                (*height as f64).into(),
            ]),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => Object::Array(kids),
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set(b"Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn write_input(dir: &TempDir, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join("sheet.pdf");
    std::fs::write(&path, bytes).unwrap();
    path
}

fn sample_image(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("sign.png");
    image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]))
        .save(&path)
        .unwrap();
    path
}

/// The overlay form XObject's decoded drawing operations.
fn stamp_operations(output: &Path) -> Vec<lopdf::content::Operation> {
    let doc = Document::load(output).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let page = doc.get_dictionary(page_id).unwrap();

    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let (_, form_ref) = xobjects
        .iter()
        .find(|(name, _)| name.starts_with(b"Stamp"))
        .expect("stamp form XObject registered on the page");

    let form = doc
        .get_object(form_ref.as_reference().unwrap())
        .unwrap()
        .as_stream()
        .unwrap();
    assert_eq!(
        form.dict.get(b"Subtype").unwrap().as_name().unwrap(),
        b"Form"
    );
    let content = form.decompressed_content().unwrap_or_else(|_| form.content.clone());
    lopdf::content::Content::decode(&content).unwrap().operations
}

fn has_op(ops: &[lopdf::content::Operation], operator: &str, operands: &[f32]) -> bool {
    ops.iter().any(|op| {
        op.operator == operator
            && op.operands.len() == operands.len()
            && op
                .operands
                .iter()
                .zip(operands)
                .all(|(obj, want)| obj.as_float().map(|v| (v - want).abs() < 0.01).unwrap_or(false))
    })
}

fn shown_text(ops: &[lopdf::content::Operation]) -> Vec<String> {
    ops.iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).to_string()),
            _ => None,
        })
        .collect()
}

fn injected_date() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

#[test]
fn stamp_image_mode_places_stamp_below_anchor_line() {
    let dir = TempDir::new().unwrap();
    // Baseline at 734 puts the span's top edge at document y = 100 with the
    // 10 pt font (842 - 734 - 8).
    let input = write_input(&dir, &sheet_pdf(&[(595.0, 842.0, &[("DESIGN", 100.0, 734.0)])]));
    let output = dir.path().join("signed.pdf");

    let options = StampOptions::new()
        .with_marker("DESIGN")
        .with_image(sample_image(&dir))
        .with_size(25.0, 15.0)
        .with_offsets(30.0, 0.0)
        .with_date(injected_date());

    let report = stamp_file_with_options(&input, &output, &options).unwrap();

    assert_eq!(report.page_index, 0);
    assert_eq!(report.category, PageCategory::A4PortraitTall);
    assert_eq!(report.label, "20260115");
    let anchor = report.anchor.expect("anchor found");
    assert!((anchor.bbox.x0 - 100.0).abs() < 0.01);
    assert!((anchor.bbox.y0 - 100.0).abs() < 0.01);
    assert!((report.placement.x - 130.0).abs() < 0.01);
    assert!((report.placement.y - 742.0).abs() < 0.01);

    let ops = stamp_operations(&output);
    // Image bottom-left corner immediately below the anchored line.
    assert!(has_op(&ops, "cm", &[25.0, 0.0, 0.0, 15.0, 130.0, 727.0]));
    // Date label inline after the image.
    assert!(has_op(&ops, "Td", &[160.0, 732.0]));
    assert_eq!(shown_text(&ops), vec!["20260115".to_string()]);
}

#[test]
fn stamp_appends_to_existing_page_content() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sheet_pdf(&[(595.0, 842.0, &[("DESIGN", 100.0, 734.0)])]));
    let output = dir.path().join("signed.pdf");

    let options = StampOptions::new()
        .with_marker("DESIGN")
        .with_image(sample_image(&dir))
        .with_date(injected_date());
    stamp_file_with_options(&input, &output, &options).unwrap();

    let doc = Document::load(&output).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let page = doc.get_dictionary(page_id).unwrap();
    let contents = page.get(b"Contents").unwrap().as_array().unwrap();
    // Original content stream plus the stamp draw stream.
    assert_eq!(contents.len(), 2);
}

#[test]
fn text_only_mode_offsets_from_box_top() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sheet_pdf(&[(595.0, 842.0, &[("DESIGN", 100.0, 734.0)])]));
    let output = dir.path().join("signed.pdf");

    let options = StampOptions::new()
        .with_marker("DESIGN")
        .with_mode(StampMode::TextOnly)
        .with_offsets(30.0, 10.0)
        .with_date(injected_date());
    stamp_file_with_options(&input, &output, &options).unwrap();

    let ops = stamp_operations(&output);
    // Label baseline at (100+30, 842-(100+10)).
    assert!(has_op(&ops, "Td", &[130.0, 732.0]));
    assert_eq!(shown_text(&ops), vec!["20260115".to_string()]);
    // No image in this mode.
    assert!(!ops.iter().any(|op| op.operator == "Do"));
}

#[test]
fn absent_marker_is_an_error_and_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sheet_pdf(&[(595.0, 842.0, &[("other", 50.0, 700.0)])]));
    let output = dir.path().join("signed.pdf");

    let options = StampOptions::new()
        .with_marker("DESIGN")
        .with_image(sample_image(&dir));
    let err = stamp_file_with_options(&input, &output, &options).unwrap_err();

    assert!(matches!(err, Error::AnchorNotFound(marker) if marker == "DESIGN"));
    assert!(!output.exists());
}

#[test]
fn absent_marker_uses_fallback_only_when_opted_in() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sheet_pdf(&[(595.0, 842.0, &[("other", 50.0, 700.0)])]));
    let output = dir.path().join("signed.pdf");

    let options = StampOptions::new()
        .with_marker("DESIGN")
        .with_mode(StampMode::TextOnly)
        .with_fallback(100.0, 100.0)
        .with_date(injected_date());
    let report = stamp_file_with_options(&input, &output, &options).unwrap();

    assert!(report.anchor.is_none());
    assert!((report.placement.x - 100.0).abs() < 0.01);
    assert!((report.placement.y - 742.0).abs() < 0.01);
    assert!(output.exists());
}

#[test]
fn first_match_selects_the_target_page() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        &sheet_pdf(&[
            (595.0, 842.0, &[("other", 50.0, 700.0)]),
            (842.0, 595.0, &[("DESIGN", 200.0, 300.0)]),
        ]),
    );
    let output = dir.path().join("signed.pdf");

    let options = StampOptions::new()
        .with_marker("DESIGN")
        .with_mode(StampMode::TextOnly)
        .with_date(injected_date());
    let report = stamp_file_with_options(&input, &output, &options).unwrap();

    assert_eq!(report.page_index, 1);
    assert_eq!(report.category, PageCategory::A4);
}

#[test]
fn pinned_page_restricts_the_search() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        &sheet_pdf(&[
            (595.0, 842.0, &[("DESIGN", 100.0, 734.0)]),
            (595.0, 842.0, &[("other", 50.0, 700.0)]),
        ]),
    );
    let output = dir.path().join("signed.pdf");

    let options = StampOptions::new()
        .with_marker("DESIGN")
        .with_mode(StampMode::TextOnly)
        .with_page(1)
        .with_date(injected_date());
    let err = stamp_file_with_options(&input, &output, &options).unwrap_err();
    assert!(matches!(err, Error::AnchorNotFound(_)));
}

#[test]
fn page_out_of_range_is_reported() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sheet_pdf(&[(595.0, 842.0, &[("DESIGN", 100.0, 734.0)])]));
    let output = dir.path().join("signed.pdf");

    let options = StampOptions::new()
        .with_marker("DESIGN")
        .with_mode(StampMode::TextOnly)
        .with_page(5);
    let err = stamp_file_with_options(&input, &output, &options).unwrap_err();
    assert!(matches!(err, Error::PageOutOfRange(5, 1)));
}

#[test]
fn zero_target_size_is_rejected_without_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sheet_pdf(&[(595.0, 842.0, &[("DESIGN", 100.0, 734.0)])]));
    let output = dir.path().join("signed.pdf");

    let options = StampOptions::new()
        .with_marker("DESIGN")
        .with_image(sample_image(&dir))
        .with_size(0.0, 15.0);
    let err = stamp_file_with_options(&input, &output, &options).unwrap_err();

    assert!(matches!(err, Error::InvalidConfiguration(_)));
    assert!(!output.exists());
}

#[test]
fn missing_image_mode_configuration_fails_before_opening_the_document() {
    let options = StampOptions::new().with_marker("DESIGN");
    // No image path configured: the input path is never touched.
    let err =
        stamp_file_with_options("does-not-exist.pdf", "unused.pdf", &options).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration(_)));
}

#[test]
fn stamped_output_remains_a_loadable_pdf() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sheet_pdf(&[(595.0, 842.0, &[("DESIGN", 100.0, 734.0)])]));
    let output = dir.path().join("signed.pdf");

    let options = StampOptions::new()
        .with_marker("DESIGN")
        .with_image(sample_image(&dir))
        .with_date(injected_date());
    stamp_file_with_options(&input, &output, &options).unwrap();

    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[test]
fn find_marker_lists_all_matches_in_document_convention() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        &sheet_pdf(&[
            (595.0, 842.0, &[("DESIGN", 100.0, 734.0), ("other", 10.0, 10.0)]),
            (595.0, 842.0, &[("DESIGN", 200.0, 500.0)]),
        ]),
    );

    let matches = find_marker(&input, "DESIGN").unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].page_index, 0);
    assert!((matches[0].bbox.x0 - 100.0).abs() < 0.01);
    assert!((matches[0].bbox.y0 - 100.0).abs() < 0.01);
    assert_eq!(matches[1].page_index, 1);

    assert!(find_marker(&input, "missing").unwrap().is_empty());
}

#[test]
fn page_info_classifies_landscape_a4() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sheet_pdf(&[(842.0, 595.0, &[])]));

    let (dims, category) = page_info(&input, 0).unwrap();
    assert_eq!(dims.width, 842.0);
    assert_eq!(dims.height, 595.0);
    assert_eq!(category, PageCategory::A4);
}
