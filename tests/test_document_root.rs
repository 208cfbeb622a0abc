//! Integration tests for the document root view
//!
//! Tests the annotation overlay: mirrored document annotations, synthesized
//! paragraphs, pages, regions, tables and words, annotation creation through
//! token ranges, and overlay upkeep across edits.

use image_markup::config::{NormalizationLevel, SequenceConfig};
use image_markup::geometry::BoundingBox;
use image_markup::model::{Document, NextRelation, Target, WordId};
use image_markup::sequence::{AnnotationSource, DocumentRoot, SequenceScope, TokenText};
use image_markup::Error;

/// Two paragraphs: "Alice was beginning" / "to get very tired" form one
/// stream, "Down the rabbit hole" another.
fn story() -> (Document, Vec<WordId>, Vec<WordId>) {
    let mut doc = Document::new("alice");
    doc.add_page(0, BoundingBox::new(0, 2000, 0, 3000)).unwrap();
    let mut first = Vec::new();
    for (top, line) in [(100, &["Alice", "was", "beginning"][..]), (160, &["to", "get", "very", "tired"][..])] {
        let mut left = 100;
        for s in line {
            let width = 20 * s.len() as i32;
            first.push(
                doc.add_word(0, BoundingBox::new(left, left + width, top, top + 40), *s)
                    .unwrap(),
            );
            left += width + 20;
        }
    }
    let mut second = Vec::new();
    let mut left = 100;
    for s in ["Down", "the", "rabbit", "hole"] {
        let width = 20 * s.len() as i32;
        second.push(
            doc.add_word(0, BoundingBox::new(left, left + width, 400, 440), s)
                .unwrap(),
        );
        left += width + 20;
    }
    for stream in [&first, &second] {
        for pair in stream.windows(2) {
            doc.set_next_word(pair[0], Some(pair[1])).unwrap();
        }
    }
    (doc, first, second)
}

#[test]
fn test_paragraph_annotations() {
    let (mut doc, _, _) = story();
    let root = DocumentRoot::new(&mut doc, SequenceConfig::new()).unwrap();
    assert_eq!(
        root.text(),
        "Alice was beginning to get very tired\nDown the rabbit hole"
    );
    let paragraphs = root.annotations_of_type("paragraph");
    assert_eq!(paragraphs.len(), 2);
    assert_eq!(paragraphs[0].value, "Alice was beginning to get very tired");
    assert_eq!(paragraphs[0].start_index, 0);
    assert_eq!(paragraphs[0].size, 7);
    assert_eq!(paragraphs[1].start_offset, 38);
    assert_eq!(paragraphs[1].source, AnnotationSource::Paragraph);
}

#[test]
fn test_paragraph_regions_mark_paragraph_ends() {
    let (mut doc, first, _) = story();
    doc.add_region(0, BoundingBox::new(0, 2000, 90, 150), "paragraph").unwrap();
    let root = DocumentRoot::new(&mut doc, SequenceConfig::new()).unwrap();
    assert_eq!(
        root.text(),
        "Alice was beginning\nto get very tired\nDown the rabbit hole"
    );
    drop(root);
    assert_eq!(doc.word(first[2]).unwrap().next_relation(), NextRelation::ParagraphEnd);
}

#[test]
fn test_document_annotations_are_mirrored() {
    let (mut doc, first, _) = story();
    let id = doc.add_annotation(first[0], first[0], "person").unwrap().unwrap();
    doc.set_attribute(&Target::Annotation(id), "confidence", 0.9.into())
        .unwrap();
    let root = DocumentRoot::new(&mut doc, SequenceConfig::new()).unwrap();

    let people = root.annotations_of_type("person");
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].value, "Alice");
    assert_eq!(people[0].source, AnnotationSource::Document(id));
    assert_eq!(people[0].attributes.get("confidence"), Some(&0.9.into()));

    let at_zero: Vec<String> = root
        .annotations_at(0)
        .into_iter()
        .map(|v| v.annotation_type)
        .collect();
    // Outer span first
    assert_eq!(at_zero, vec!["paragraph".to_string(), "person".to_string()]);
}

#[test]
fn test_add_annotation_by_token_range() {
    let (mut doc, first, _) = story();
    let mut root = DocumentRoot::new(&mut doc, SequenceConfig::new()).unwrap();

    let view = root.add_annotation("phrase", 3, 4).unwrap().unwrap();
    assert_eq!(view.value, "to get very tired");
    assert_eq!(view.start_index, 3);

    // Tokens 6 and 7 lie in different streams
    assert_eq!(root.add_annotation("broken", 6, 2).unwrap(), None);
    assert!(matches!(root.add_annotation("bad", 10, 2), Err(Error::InvalidArgument(_))));
    assert!(matches!(root.add_annotation("bad", 0, 0), Err(Error::InvalidArgument(_))));
    assert!(matches!(root.add_annotation("bad", 1, usize::MAX), Err(Error::InvalidArgument(_))));
    assert!(matches!(root.add_annotation("bad", usize::MAX, 1), Err(Error::InvalidArgument(_))));

    let AnnotationSource::Document(id) = view.source else {
        panic!("expected a document annotation");
    };
    assert!(root.remove_annotation(id));
    assert!(root.annotations_of_type("phrase").is_empty());
    drop(root);
    assert!(doc.annotations_starting_at(first[3]).is_empty());
}

#[test]
fn test_pages_and_regions_at_word_level() {
    let (mut doc, _, _) = story();
    doc.add_region(0, BoundingBox::new(0, 2000, 350, 500), "block").unwrap();
    let config = SequenceConfig::new().with_normalization(NormalizationLevel::Words);
    let root = DocumentRoot::new(&mut doc, config).unwrap();

    let pages = root.annotations_of_type("page");
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].size, root.size());
    assert_eq!(pages[0].source, AnnotationSource::Page(0));

    let blocks = root.annotations_of_type("block");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].value, "Down the rabbit hole");
    assert!(root.annotations_of_type("paragraph").is_empty());
}

#[test]
fn test_regions_disabled() {
    let (mut doc, _, _) = story();
    doc.add_region(0, BoundingBox::new(0, 2000, 350, 500), "block").unwrap();
    let config = SequenceConfig::new()
        .with_normalization(NormalizationLevel::Raw)
        .with_regions(false);
    let root = DocumentRoot::new(&mut doc, config).unwrap();
    assert!(root.annotations().is_empty());
}

#[test]
fn test_word_annotations_follow_edits() {
    let (mut doc, first, _) = story();
    let config = SequenceConfig::new().with_word_annotations(true);
    let mut root = DocumentRoot::new(&mut doc, config).unwrap();
    assert_eq!(root.annotations_of_type("word").len(), 11);

    // Drop "was "
    root.set_chars("", 6, 4).unwrap();
    assert_eq!(root.value_at(1), "beginning");
    let words = root.annotations_of_type("word");
    assert_eq!(words.len(), 10);
    assert!(words.iter().all(|v| v.source != AnnotationSource::Word(first[1])));
    let paragraphs = root.annotations_of_type("paragraph");
    assert_eq!(paragraphs[0].value, "Alice beginning to get very tired");
}

#[test]
fn test_table_annotations() {
    let mut doc = Document::new("table");
    doc.add_page(0, BoundingBox::new(0, 2000, 0, 3000)).unwrap();
    doc.add_region(0, BoundingBox::new(0, 400, 0, 100), "table").unwrap();
    doc.add_region(0, BoundingBox::new(0, 400, 0, 50), "tableRow").unwrap();
    doc.add_region(0, BoundingBox::new(0, 400, 50, 100), "tableRow").unwrap();
    for (left, top) in [(0, 0), (200, 0), (0, 50), (200, 50)] {
        doc.add_region(0, BoundingBox::new(left, left + 200, top, top + 50), "tableCell")
            .unwrap();
    }
    let mut cells = Vec::new();
    for (left, top, text) in [(10, 10, "Name"), (210, 10, "Age"), (10, 60, "Alice"), (210, 60, "7")] {
        cells.push(
            doc.add_word(0, BoundingBox::new(left, left + 80, top, top + 30), text)
                .unwrap(),
        );
    }
    for pair in cells.windows(2) {
        doc.set_next_word(pair[0], Some(pair[1])).unwrap();
    }

    let root = DocumentRoot::new(&mut doc, SequenceConfig::new()).unwrap();
    let tables = root.annotations_of_type("table");
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].attributes.get_u64("rows"), Some(2));
    assert_eq!(tables[0].attributes.get_u64("cols"), Some(2));

    let rows = root.annotations_of_type("tableRow");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].value, "Alice 7");
    assert_eq!(rows[1].attributes.get_u64("rowIndex"), Some(1));

    let cells = root.annotations_of_type("tableCell");
    assert_eq!(cells.len(), 4);
    assert_eq!(cells[3].value, "7");
    assert_eq!(cells[3].attributes.get_u64("colIndex"), Some(1));
    assert_eq!(cells[3].attributes.get_u64("rowIndex"), Some(1));
}

#[test]
fn test_scoped_root_and_refresh() {
    let (mut doc, _, second) = story();
    let mut root = DocumentRoot::for_scope(
        &mut doc,
        SequenceScope::Streams(vec![second[0]]),
        SequenceConfig::new(),
    )
    .unwrap();
    assert_eq!(root.text(), "Down the rabbit hole");

    root.document_mut().set_word_string(second[3], "hole.").unwrap();
    assert_eq!(root.text(), "Down the rabbit hole");
    root.refresh().unwrap();
    assert_eq!(root.text(), "Down the rabbit hole.");
}
