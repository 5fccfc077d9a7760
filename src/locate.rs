//! Marker search over extracted text spans.

use crate::model::{AnchorMatch, TextSpan};

/// Find every span whose text equals `marker` exactly.
///
/// The search is lazy and restartable; callers typically take only the first
/// match. An empty result is not an error; deciding what an absent anchor
/// means is the pipeline's job.
pub fn locate<'a>(
    spans: &'a [TextSpan],
    marker: &'a str,
) -> impl Iterator<Item = AnchorMatch> + 'a {
    spans
        .iter()
        .filter(move |span| span.text == marker)
        .map(|span| AnchorMatch {
            page_index: span.page_index,
            text: span.text.clone(),
            bbox: span.bbox,
        })
}
