//! Orderings over words and annotations.
//!
//! Layout order is not a total order (two boxes can each be "on the same
//! line" as a third without being on the same line as each other), so
//! collections ordered by it are sorted with [`tolerant_sort`], a stable
//! insertion sort that never relies on transitivity.

use crate::config::Orientation;
use crate::geometry::BoundingBox;
use crate::model::annotation::Annotation;
use crate::model::word::{Word, WordId};
use std::cmp::Ordering;

/// Reading order of two boxes on the same page.
///
/// Boxes on the same line compare by their horizontal position in reading
/// direction; otherwise the higher box comes first.
pub fn layout_order(a: &BoundingBox, b: &BoundingBox, orientation: Orientation) -> Ordering {
    if a.is_same_line(b) {
        match orientation {
            Orientation::LeftRightTopDown => a.left.cmp(&b.left),
            Orientation::RightLeftTopDown => b.right.cmp(&a.right),
        }
    } else {
        a.top.cmp(&b.top)
    }
}

/// Sort key of a stream head: where the stream starts on the page.
fn head_key(words: &[Word], head: WordId) -> (u32, i32, i32, WordId) {
    match words.get(head.index()) {
        Some(w) => (w.page_id, w.bounds.top, w.bounds.left, head),
        None => (u32::MAX, i32::MAX, i32::MAX, head),
    }
}

/// Order of two words by page, then text stream, then stream position.
pub(crate) fn text_stream_order(words: &[Word], a: WordId, b: WordId) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let (wa, wb) = match (words.get(a.index()), words.get(b.index())) {
        (Some(wa), Some(wb)) => (wa, wb),
        _ => return a.cmp(&b),
    };
    wa.page_id
        .cmp(&wb.page_id)
        .then_with(|| {
            if wa.stream_head == wb.stream_head {
                wa.stream_pos.cmp(&wb.stream_pos)
            } else {
                head_key(words, wa.stream_head).cmp(&head_key(words, wb.stream_head))
            }
        })
        .then_with(|| a.cmp(&b))
}

/// Nesting order of annotations: first word ascending, last word descending
/// (enclosing spans before enclosed ones), then creation order.
pub(crate) fn annotation_order(words: &[Word], a: &Annotation, b: &Annotation) -> Ordering {
    text_stream_order(words, a.first_word, b.first_word)
        .then_with(|| text_stream_order(words, b.last_word, a.last_word))
        .then_with(|| a.created.cmp(&b.created))
}

/// Stable insertion sort that tolerates non-transitive comparators.
///
/// Each element moves left past every predecessor that compares strictly
/// greater, and stops at the first one that does not.
pub fn tolerant_sort<T, F>(items: &mut [T], mut cmp: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && cmp(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}
