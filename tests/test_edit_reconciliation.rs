//! Integration tests for character edits on the token view
//!
//! Tests how text edits map back onto words: in-word fixes, merges, splits,
//! deletions, hyphenation, annotation endpoint repair and rejected edits.

use image_markup::config::{NormalizationLevel, SequenceConfig};
use image_markup::geometry::BoundingBox;
use image_markup::model::{ChangeEvent, ChangeLog, Document, NextRelation, Target, WordId};
use image_markup::sequence::{DocumentRoot, TokenText};
use image_markup::Error;

fn line(strings: &[&str]) -> (Document, Vec<WordId>) {
    let mut doc = Document::new("edits");
    doc.add_page(0, BoundingBox::new(0, 3000, 0, 3000)).unwrap();
    let mut left = 100;
    let words: Vec<WordId> = strings
        .iter()
        .map(|s| {
            let width = 20 * s.chars().count() as i32;
            let w = doc
                .add_word(0, BoundingBox::new(left, left + width, 100, 140), *s)
                .unwrap();
            left += width + 20;
            w
        })
        .collect();
    for pair in words.windows(2) {
        doc.set_next_word(pair[0], Some(pair[1])).unwrap();
    }
    (doc, words)
}

fn raw() -> SequenceConfig {
    SequenceConfig::new().with_normalization(NormalizationLevel::Raw)
}

fn strings(doc: &Document, words: &[WordId]) -> Vec<String> {
    words
        .iter()
        .map(|w| doc.word(*w).unwrap().string().to_string())
        .collect()
}

#[test]
fn test_fix_inside_word_touches_only_that_word() {
    let (mut doc, words) = line(&["The", "qiuck", "fox"]);
    let log = ChangeLog::new();
    doc.add_listener(Box::new(log.clone()));
    {
        let mut root = DocumentRoot::new(&mut doc, raw()).unwrap();
        root.set_chars("ui", 5, 2).unwrap();
        assert_eq!(root.text(), "The quick fox");
    }
    assert_eq!(strings(&doc, &words), vec!["The", "quick", "fox"]);
    assert_eq!(
        log.events(),
        vec![ChangeEvent::AttributeChanged {
            target: Target::Word(words[1]),
            name: "string".to_string(),
            old_value: Some("qiuck".into()),
        }]
    );
}

#[test]
fn test_unchanged_text_is_a_no_op() {
    let (mut doc, words) = line(&["Hello", "world"]);
    let log = ChangeLog::new();
    doc.add_listener(Box::new(log.clone()));
    let mut root = DocumentRoot::new(&mut doc, raw()).unwrap();
    root.set_chars("world", 6, 5).unwrap();
    root.set_chars("Hello world", 0, 11).unwrap();
    assert_eq!(root.text(), "Hello world");
    assert_eq!(root.tokens().len(), 2);
    drop(root);
    assert!(log.events().is_empty());
    assert_eq!(strings(&doc, &words), vec!["Hello", "world"]);
}

#[test]
fn test_removing_space_merges_tokens() {
    let (mut doc, words) = line(&["Hello", "world"]);
    let mut root = DocumentRoot::new(&mut doc, raw()).unwrap();
    root.set_chars("", 5, 1).unwrap();
    assert_eq!(root.text(), "Helloworld");
    assert_eq!(root.size(), 1);
    assert_eq!(root.tokens()[0].words(), &words[..]);
    drop(root);
    assert_eq!(doc.word(words[0]).unwrap().next_relation(), NextRelation::Continue);
    assert_eq!(strings(&doc, &words), vec!["Hello", "world"]);
}

#[test]
fn test_inserting_space_splits_token() {
    let (mut doc, words) = line(&["Hello", "world"]);
    doc.set_next_relation(words[0], NextRelation::Continue).unwrap();
    let mut root = DocumentRoot::new(&mut doc, raw()).unwrap();
    assert_eq!(root.text(), "Helloworld");
    root.set_chars(" ", 5, 0).unwrap();
    assert_eq!(root.text(), "Hello world");
    assert_eq!(root.size(), 2);
    drop(root);
    assert_eq!(doc.word(words[0]).unwrap().next_relation(), NextRelation::Separate);
}

#[test]
fn test_deleting_word_moves_annotation_endpoint() {
    let (mut doc, words) = line(&["The", "quick", "brown", "fox"]);
    let id = doc.add_annotation(words[1], words[2], "adjectives").unwrap().unwrap();
    let old_uid = doc.annotation(id).unwrap().uid().to_string();
    {
        let mut root = DocumentRoot::new(&mut doc, raw()).unwrap();
        root.set_chars("", 4, 6).unwrap();
        assert_eq!(root.text(), "The brown fox");
        let views = root.annotations_of_type("adjectives");
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].value, "brown");
        assert_eq!(views[0].start_index, 1);
        assert_eq!(views[0].size, 1);
    }
    let annotation = doc.annotation(id).unwrap();
    assert_eq!(annotation.first_word(), words[2]);
    assert_eq!(annotation.last_word(), words[2]);
    assert_ne!(annotation.uid(), old_uid);

    let quick = doc.word(words[1]).unwrap();
    assert!(quick.is_deleted());
    assert_eq!(quick.text_stream_type(), "deleted");
    assert_eq!(doc.stream_words(words[0]), vec![words[0], words[2], words[3]]);
}

#[test]
fn test_deleting_all_words_removes_annotation() {
    let (mut doc, words) = line(&["The", "quick", "brown", "fox"]);
    let id = doc.add_annotation(words[1], words[2], "adjectives").unwrap().unwrap();
    {
        let mut root = DocumentRoot::new(&mut doc, raw()).unwrap();
        root.set_chars("", 4, 12).unwrap();
        assert_eq!(root.text(), "The fox");
        assert!(root.annotations_of_type("adjectives").is_empty());
    }
    assert!(doc.annotation(id).is_none());
    assert_eq!(doc.annotation_count(), 0);
}

#[test]
fn test_too_many_tokens_rejected_without_changes() {
    let (mut doc, words) = line(&["Hello", "world"]);
    let log = ChangeLog::new();
    doc.add_listener(Box::new(log.clone()));
    let mut root = DocumentRoot::new(&mut doc, raw()).unwrap();
    let err = root.set_chars("a b c", 0, 11).unwrap_err();
    assert!(matches!(err, Error::TooManyTokens { tokens: 3, words: 2 }));
    assert_eq!(root.text(), "Hello world");
    drop(root);
    assert!(log.events().is_empty());
    assert_eq!(strings(&doc, &words), vec!["Hello", "world"]);
}

#[test]
fn test_glued_punctuation_counts_as_new_tokens() {
    let (mut doc, words) = line(&["Hello"]);
    let log = ChangeLog::new();
    doc.add_listener(Box::new(log.clone()));
    let mut root = DocumentRoot::new(&mut doc, raw()).unwrap();
    let err = root.set_chars(",world", 5, 0).unwrap_err();
    assert!(matches!(err, Error::TooManyTokens { tokens: 3, words: 1 }));
    assert_eq!(root.text(), "Hello");
    drop(root);
    assert!(log.events().is_empty());
    assert_eq!(strings(&doc, &words), vec!["Hello"]);
}

#[test]
fn test_edit_validation_follows_document_tokenizer() {
    let (mut doc, words) = line(&["Hello"]);
    doc.set_document_property("tokenizer", "whitespace");
    let mut root = DocumentRoot::new(&mut doc, raw()).unwrap();
    root.set_chars(",world", 5, 0).unwrap();
    assert_eq!(root.text(), "Hello,world");
    drop(root);
    assert_eq!(strings(&doc, &words), vec!["Hello,world"]);
}

#[test]
fn test_hyphenated_token_keeps_hyphen_in_words() {
    let mut doc = Document::new("hyphen");
    doc.add_page(0, BoundingBox::new(0, 3000, 0, 3000)).unwrap();
    let wonder = doc
        .add_word(0, BoundingBox::new(100, 240, 100, 140), "wonder-")
        .unwrap();
    let ful = doc.add_word(0, BoundingBox::new(100, 160, 160, 200), "ful").unwrap();
    doc.set_next_word(wonder, Some(ful)).unwrap();
    doc.set_next_relation(wonder, NextRelation::Hyphenated).unwrap();

    let config = SequenceConfig::new().with_normalization(NormalizationLevel::Words);
    let mut root = DocumentRoot::new(&mut doc, config).unwrap();
    assert_eq!(root.text(), "wonderful");
    root.set_chars("ly", 9, 0).unwrap();
    assert_eq!(root.text(), "wonderfully");
    drop(root);
    assert_eq!(doc.word(wonder).unwrap().string(), "wonder-");
    assert_eq!(doc.word(ful).unwrap().string(), "fully");
    assert_eq!(doc.word(wonder).unwrap().next_relation(), NextRelation::Hyphenated);
}

#[test]
fn test_splitting_hyphenated_token_drops_hyphen() {
    let mut doc = Document::new("hyphen");
    doc.add_page(0, BoundingBox::new(0, 3000, 0, 3000)).unwrap();
    let wonder = doc
        .add_word(0, BoundingBox::new(100, 240, 100, 140), "wonder-")
        .unwrap();
    let ful = doc.add_word(0, BoundingBox::new(100, 160, 160, 200), "ful").unwrap();
    doc.set_next_word(wonder, Some(ful)).unwrap();
    doc.set_next_relation(wonder, NextRelation::Hyphenated).unwrap();

    let config = SequenceConfig::new().with_normalization(NormalizationLevel::Words);
    let mut root = DocumentRoot::new(&mut doc, config).unwrap();
    root.set_chars(" ", 6, 0).unwrap();
    assert_eq!(root.text(), "wonder ful");
    drop(root);
    assert_eq!(doc.word(wonder).unwrap().string(), "wonder");
    assert_eq!(doc.word(wonder).unwrap().next_relation(), NextRelation::Separate);
}

#[test]
fn test_replacing_word_text_entirely() {
    let (mut doc, words) = line(&["one", "two", "three"]);
    let mut root = DocumentRoot::new(&mut doc, raw()).unwrap();
    root.set_chars("2", 4, 3).unwrap();
    assert_eq!(root.text(), "one 2 three");
    drop(root);
    assert_eq!(strings(&doc, &words), vec!["one", "2", "three"]);
    assert!(!doc.word(words[1]).unwrap().is_deleted());
}

#[test]
fn test_offset_past_end_is_invalid() {
    let (mut doc, _) = line(&["short"]);
    let mut root = DocumentRoot::new(&mut doc, raw()).unwrap();
    assert!(matches!(root.set_chars("x", 99, 0), Err(Error::InvalidArgument(_))));
}
