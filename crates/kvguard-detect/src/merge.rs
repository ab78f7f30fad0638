//! Conflict resolution and masking of span sets

use kvguard_core::Span;
use std::cmp::Ordering;
use tracing::warn;

/// Resolve overlaps with a single greedy pass
///
/// Spans are ordered by start offset, then by descending confidence, then by
/// category name. Each span is compared against the last accepted one only:
/// on overlap the higher-confidence span wins (ties keep the earlier one),
/// otherwise the span is appended. This is not an optimal interval selection;
/// a chain of overlaps can make the result depend on the order.
pub fn merge_spans(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by(merge_order);

    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if last.overlaps(&span) => {
                if span.confidence > last.confidence {
                    *last = span;
                }
            }
            _ => merged.push(span),
        }
    }

    merged
}

fn merge_order(a: &Span, b: &Span) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.category.as_str().cmp(b.category.as_str()))
}

/// Replace every span in `text` with its masked value
///
/// `spans` must be non-overlapping (the output of [`merge_spans`]). They are
/// applied from the highest start offset down so earlier offsets stay valid.
pub fn apply_masks(text: &str, spans: &[Span]) -> String {
    let mut ordered: Vec<&Span> = spans.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut masked = text.to_string();
    for span in ordered {
        if span.is_empty()
            || span.end > text.len()
            || !text.is_char_boundary(span.start)
            || !text.is_char_boundary(span.end)
        {
            warn!(
                category = %span.category,
                start = span.start,
                end = span.end,
                "Skipping span with invalid range"
            );
            continue;
        }
        masked.replace_range(span.start..span.end, &span.masked_value);
    }

    masked
}
