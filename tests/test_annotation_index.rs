//! Integration tests for document annotations
//!
//! Tests creation rules, the type/endpoint/page/uid indexes, ordering,
//! endpoint changes, cleanup of duplicates and annotation values.

use image_markup::geometry::BoundingBox;
use image_markup::model::{annotation_uid, ChangeEvent, ChangeLog, Document, NextRelation, Target, WordId};
use image_markup::Error;
use proptest::prelude::*;

/// One stream of `n` words on page 0 (one line) and page 1.
fn stream_doc(n: usize) -> (Document, Vec<WordId>) {
    let mut doc = Document::new("annotations");
    doc.add_page(0, BoundingBox::new(0, 5000, 0, 1000)).unwrap();
    doc.add_page(1, BoundingBox::new(0, 5000, 0, 1000)).unwrap();
    let words: Vec<WordId> = (0..n)
        .map(|i| {
            let page = if i < n / 2 { 0 } else { 1 };
            let left = 10 + 60 * i as i32;
            doc.add_word(page, BoundingBox::new(left, left + 50, 10, 40), format!("w{}", i))
                .unwrap()
        })
        .collect();
    for pair in words.windows(2) {
        doc.set_next_word(pair[0], Some(pair[1])).unwrap();
    }
    (doc, words)
}

#[test]
fn test_cross_stream_annotation_is_not_created() {
    let (mut doc, words) = stream_doc(4);
    let loner = doc
        .add_word(0, BoundingBox::new(10, 60, 500, 530), "loner")
        .unwrap();
    assert_eq!(doc.add_annotation(words[0], loner, "note").unwrap(), None);
    assert_eq!(doc.annotation_count(), 0);
}

#[test]
fn test_reversed_endpoints_are_swapped() {
    let (mut doc, words) = stream_doc(4);
    let id = doc.add_annotation(words[2], words[0], "span").unwrap().unwrap();
    let annotation = doc.annotation(id).unwrap();
    assert_eq!(annotation.first_word(), words[0]);
    assert_eq!(annotation.last_word(), words[2]);
}

#[test]
fn test_indexes() {
    let (mut doc, words) = stream_doc(6);
    let person = doc.add_annotation(words[0], words[1], "person").unwrap().unwrap();
    let place = doc.add_annotation(words[2], words[4], "place").unwrap().unwrap();
    let other = doc.add_annotation(words[4], words[4], "person").unwrap().unwrap();

    assert_eq!(doc.annotations_of_type("person"), vec![person, other]);
    assert_eq!(doc.annotations_starting_at(words[2]), vec![place]);
    assert_eq!(doc.annotations_ending_at(words[4]), vec![place, other]);
    assert_eq!(doc.annotations_on_page(0), vec![person, place]);
    assert_eq!(doc.annotations_on_page(1), vec![place, other]);
    assert_eq!(doc.annotation_types(), vec!["person".to_string(), "place".to_string()]);

    let uid = doc.annotation(place).unwrap().uid().to_string();
    assert_eq!(doc.annotation_by_uid(&uid), Some(place));
    assert_eq!(uid.len(), 32);
    assert!(uid.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
}

#[test]
fn test_uid_follows_type_and_endpoints() {
    let (mut doc, words) = stream_doc(4);
    let id = doc.add_annotation(words[0], words[1], "person").unwrap().unwrap();
    let first = doc.word(words[0]).unwrap().local_id();
    let last = doc.word(words[1]).unwrap().local_id();
    assert_eq!(doc.annotation(id).unwrap().uid(), annotation_uid("person", &first, &last));

    doc.set_annotation_type(id, "org").unwrap();
    assert_eq!(doc.annotation(id).unwrap().uid(), annotation_uid("org", &first, &last));
    assert!(doc.annotations_of_type("person").is_empty());
}

#[test]
fn test_order_outer_before_inner() {
    let (mut doc, words) = stream_doc(6);
    let inner = doc.add_annotation(words[1], words[2], "inner").unwrap().unwrap();
    let outer = doc.add_annotation(words[1], words[4], "outer").unwrap().unwrap();
    let first = doc.add_annotation(words[0], words[0], "first").unwrap().unwrap();
    assert_eq!(doc.annotations(), vec![first, outer, inner]);
}

#[test]
fn test_set_endpoints() {
    let (mut doc, words) = stream_doc(6);
    let id = doc.add_annotation(words[1], words[2], "span").unwrap().unwrap();
    let log = ChangeLog::new();
    doc.add_listener(Box::new(log.clone()));

    assert!(doc.set_annotation_last_word(id, words[4]).unwrap());
    assert_eq!(doc.annotation(id).unwrap().last_word(), words[4]);
    assert_eq!(doc.annotations_ending_at(words[4]), vec![id]);
    assert!(doc.annotations_ending_at(words[2]).is_empty());
    assert!(log.events().iter().any(|e| matches!(
        e,
        ChangeEvent::AttributeChanged { target: Target::Annotation(a), name, .. } if *a == id && name == "lastWord"
    )));

    let err = doc.set_annotation_first_word(id, words[5]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let loner = doc
        .add_word(0, BoundingBox::new(10, 60, 500, 530), "loner")
        .unwrap();
    assert!(!doc.set_annotation_first_word(id, loner).unwrap());
    assert_eq!(doc.annotation(id).unwrap().first_word(), words[1]);
}

#[test]
fn test_remove_annotation_emits_event() {
    let (mut doc, words) = stream_doc(3);
    let id = doc.add_annotation(words[0], words[1], "span").unwrap().unwrap();
    let log = ChangeLog::new();
    doc.add_listener(Box::new(log.clone()));

    assert!(doc.remove_annotation(id));
    assert!(!doc.remove_annotation(id));
    assert_eq!(
        log.events(),
        vec![ChangeEvent::AnnotationRemoved {
            annotation: id,
            annotation_type: "span".to_string()
        }]
    );
    assert_eq!(doc.annotation_count(), 0);
    assert!(doc.annotations_starting_at(words[0]).is_empty());
}

#[test]
fn test_cleanup_removes_duplicates() {
    let (mut doc, words) = stream_doc(4);
    let kept = doc.add_annotation(words[0], words[1], "span").unwrap().unwrap();
    doc.add_annotation(words[0], words[1], "span").unwrap().unwrap();
    doc.add_annotation(words[0], words[1], "span").unwrap().unwrap();
    let different = doc.add_annotation(words[0], words[1], "other").unwrap().unwrap();

    assert_eq!(doc.cleanup_annotations(), 2);
    assert_eq!(doc.annotations(), vec![kept, different]);
    assert_eq!(doc.cleanup_annotations(), 0);
}

#[test]
fn test_edited_annotations_collide_and_merge() {
    let (mut doc, words) = stream_doc(4);
    let a = doc.add_annotation(words[0], words[1], "person").unwrap().unwrap();
    let b = doc.add_annotation(words[0], words[2], "org").unwrap().unwrap();
    doc.set_attribute(&Target::Annotation(a), "source", "ocr".into()).unwrap();
    doc.set_attribute(&Target::Annotation(b), "source", "manual".into()).unwrap();
    doc.set_attribute(&Target::Annotation(b), "score", 1.into()).unwrap();
    assert_eq!(doc.cleanup_annotations(), 0);

    doc.set_annotation_type(b, "person").unwrap();
    assert!(doc.set_annotation_last_word(b, words[1]).unwrap());
    let uid = doc.annotation(a).unwrap().uid().to_string();
    assert_eq!(doc.annotation(b).unwrap().uid(), uid);

    assert_eq!(doc.cleanup_annotations(), 1);
    assert!(doc.annotation(b).is_none());
    assert_eq!(doc.annotations(), vec![a]);
    assert_eq!(doc.annotation_by_uid(&uid), Some(a));
    assert_eq!(doc.get_attribute(&Target::Annotation(a), "source"), Some("ocr".into()));
    assert_eq!(doc.get_attribute(&Target::Annotation(a), "score"), Some(1.into()));
    assert_eq!(doc.annotations_ending_at(words[1]), vec![a]);
    assert!(doc.annotations_ending_at(words[2]).is_empty());
}

#[test]
fn test_annotation_value_joins_relations() {
    let (mut doc, words) = stream_doc(4);
    doc.set_word_string(words[1], "wonder-").unwrap();
    doc.set_word_string(words[2], "ful").unwrap();
    doc.set_next_relation(words[1], NextRelation::Hyphenated).unwrap();
    doc.set_word_string(words[3], "!").unwrap();
    doc.set_next_relation(words[2], NextRelation::Continue).unwrap();

    let id = doc.add_annotation(words[0], words[3], "sentence").unwrap().unwrap();
    assert_eq!(doc.annotation_value(id), "w0 wonderful!");
    assert_eq!(doc.annotation_words(id), words);
}

#[test]
fn test_relinking_keeps_annotation_index_consistent() {
    let (mut doc, words) = stream_doc(6);
    let id = doc.add_annotation(words[3], words[4], "span").unwrap().unwrap();
    doc.set_next_word(words[2], None).unwrap();
    assert_eq!(doc.annotations_starting_at(words[3]), vec![id]);
    assert_eq!(doc.annotations(), vec![id]);
    assert_eq!(doc.annotation_value(id), "w3 w4");
}

proptest! {
    #[test]
    fn prop_index_matches_annotations(
        spans in prop::collection::vec((0usize..8, 0usize..8, 0usize..3), 1..25),
        removals in prop::collection::vec(0usize..25, 0..10),
        retypes in prop::collection::vec((0usize..25, 0usize..3), 0..10),
        moves in prop::collection::vec((0usize..25, 0usize..8, 0usize..8), 0..10),
    ) {
        let (mut doc, words) = stream_doc(8);
        let types = ["a", "b", "c"];
        let mut ids = Vec::new();
        for (first, last, ty) in spans {
            if let Some(id) = doc.add_annotation(words[first], words[last], types[ty]).unwrap() {
                ids.push(id);
            }
        }
        for r in removals {
            if let Some(id) = ids.get(r) {
                doc.remove_annotation(*id);
            }
        }
        for (r, ty) in retypes {
            if let Some(&id) = ids.get(r).filter(|id| doc.annotation(**id).is_some()) {
                doc.set_annotation_type(id, types[ty]).unwrap();
            }
        }
        for (r, x, y) in moves {
            if let Some(&id) = ids.get(r).filter(|id| doc.annotation(**id).is_some()) {
                prop_assert!(doc.set_annotation_words(id, words[x.min(y)], words[x.max(y)]).unwrap());
            }
        }
        doc.cleanup_annotations();

        let all = doc.annotations();
        let mut seen = std::collections::HashSet::new();
        for &id in &all {
            let annotation = doc.annotation(id).unwrap();
            let key = (annotation.annotation_type().to_string(), annotation.first_word(), annotation.last_word());
            prop_assert!(seen.insert(key), "duplicate survived cleanup: {}", id);
            prop_assert_eq!(doc.annotation_by_uid(annotation.uid()), Some(id));
        }
        for &w in &words {
            let starting = doc.annotations_starting_at(w);
            let expected: Vec<_> = all.iter().copied().filter(|a| doc.annotation(*a).unwrap().first_word() == w).collect();
            prop_assert_eq!(starting, expected);
        }
        for ty in types {
            let of_type = doc.annotations_of_type(ty);
            let expected: Vec<_> = all.iter().copied().filter(|a| doc.annotation(*a).unwrap().annotation_type() == ty).collect();
            prop_assert_eq!(of_type, expected);
        }
        for pair in all.windows(2) {
            let (a, b) = (doc.annotation(pair[0]).unwrap(), doc.annotation(pair[1]).unwrap());
            let (af, bf) = (words.iter().position(|w| *w == a.first_word()), words.iter().position(|w| *w == b.first_word()));
            prop_assert!(af <= bf);
        }
    }
}
