//! Integration tests for token sequence construction
//!
//! Tests token grouping and whitespace synthesis at each normalization
//! level, paragraph emulation, stream filtering and scoped sequences.

use image_markup::config::{NormalizationLevel, SequenceConfig};
use image_markup::geometry::BoundingBox;
use image_markup::model::{Document, NextRelation, WordId};
use image_markup::sequence::{SequenceScope, TokenSequence, TokenText};
use image_markup::text::Tokenizer;

struct Page {
    doc: Document,
}

impl Page {
    fn new() -> Self {
        let mut doc = Document::new("tokens");
        doc.add_page(0, BoundingBox::new(0, 2000, 0, 3000)).unwrap();
        doc.add_page(1, BoundingBox::new(0, 2000, 0, 3000)).unwrap();
        Self { doc }
    }

    /// A line of linked words at `top`, continuing `after` when given.
    fn line(&mut self, page: u32, top: i32, strings: &[&str], after: Option<WordId>) -> Vec<WordId> {
        let mut left = 100;
        let words: Vec<WordId> = strings
            .iter()
            .map(|s| {
                let width = 20 * s.chars().count() as i32;
                let w = self
                    .doc
                    .add_word(page, BoundingBox::new(left, left + width, top, top + 40), *s)
                    .unwrap();
                left += width + 20;
                w
            })
            .collect();
        let mut prev = after;
        for &w in &words {
            if let Some(p) = prev {
                self.doc.set_next_word(p, Some(w)).unwrap();
            }
            prev = Some(w);
        }
        words
    }

    fn text(&self, level: NormalizationLevel) -> String {
        let config = SequenceConfig::new()
            .with_normalization(level)
            .with_hyphenation_repair(false);
        TokenSequence::build(&self.doc, &SequenceScope::Document, &config).text()
    }
}

#[test]
fn test_hello_world_two_tokens() {
    let mut page = Page::new();
    page.line(0, 100, &["Hello", "world"], None);
    let config = SequenceConfig::new();
    let seq = TokenSequence::build(&page.doc, &SequenceScope::Document, &config);
    assert_eq!(seq.size(), 2);
    assert_eq!(seq.value_at(0), "Hello");
    assert_eq!(seq.whitespace_after(0), " ");
    assert_eq!(seq.value_at(1), "world");
    assert_eq!(seq.whitespace_after(1), "");
    assert_eq!(seq.text(), "Hello world");
}

#[test]
fn test_hyphenation_by_level() {
    let mut page = Page::new();
    let first = page.line(0, 100, &["a", "wonder-"], None);
    let second = page.line(0, 160, &["ful", "day"], Some(first[1]));
    page.doc
        .set_next_relation(first[1], NextRelation::Hyphenated)
        .unwrap();

    assert_eq!(page.text(NormalizationLevel::Raw), "a wonder- ful day");
    assert_eq!(page.text(NormalizationLevel::Words), "a wonderful day");

    let config = SequenceConfig::new().with_normalization(NormalizationLevel::Words);
    let seq = TokenSequence::build(&page.doc, &SequenceScope::Document, &config);
    assert_eq!(seq.token(1).unwrap().words(), &[first[1], second[0]]);
    assert_eq!(seq.token_of_word(second[0]), Some(1));
}

#[test]
fn test_continue_joins_at_every_level() {
    let mut page = Page::new();
    let words = page.line(0, 100, &["New", "York"], None);
    page.doc
        .set_next_relation(words[0], NextRelation::Continue)
        .unwrap();
    assert_eq!(page.text(NormalizationLevel::Raw), "NewYork");
}

#[test]
fn test_paragraph_level_breaks_streams() {
    let mut page = Page::new();
    let first = page.line(0, 100, &["First", "paragraph."], None);
    page.line(0, 160, &["Still", "first."], Some(first[1]));
    page.line(0, 400, &["Second", "one."], None);

    assert_eq!(
        page.text(NormalizationLevel::Paragraphs),
        "First paragraph. Still first.\nSecond one."
    );
    assert_eq!(
        page.text(NormalizationLevel::Raw),
        "First paragraph. Still first. Second one."
    );
}

#[test]
fn test_paragraph_end_relation_breaks_line() {
    let mut page = Page::new();
    let first = page.line(0, 100, &["End."], None);
    page.line(0, 160, &["Next"], Some(first[0]));
    page.doc
        .set_next_relation(first[0], NextRelation::ParagraphEnd)
        .unwrap();
    assert_eq!(page.text(NormalizationLevel::Paragraphs), "End.\nNext");
    assert_eq!(page.text(NormalizationLevel::Words), "End. Next");
}

#[test]
fn test_punctuation_glued_when_touching() {
    let mut doc = Document::new("punct");
    doc.add_page(0, BoundingBox::new(0, 2000, 0, 3000)).unwrap();
    let word = doc.add_word(0, BoundingBox::new(100, 200, 100, 140), "Hello").unwrap();
    let comma = doc.add_word(0, BoundingBox::new(201, 210, 100, 140), ",").unwrap();
    let next = doc.add_word(0, BoundingBox::new(230, 330, 100, 140), "you").unwrap();
    doc.set_next_word(word, Some(comma)).unwrap();
    doc.set_next_word(comma, Some(next)).unwrap();

    let seq = TokenSequence::build(&doc, &SequenceScope::Document, &SequenceConfig::new());
    assert_eq!(seq.text(), "Hello, you");
    assert_eq!(seq.size(), 3);
}

#[test]
fn test_page_titles_filtered_at_paragraph_level() {
    let mut page = Page::new();
    let title = page.line(0, 20, &["Running", "Title"], None);
    page.line(0, 200, &["Body"], None);
    page.doc.set_text_stream_type(title[0], "pageTitle").unwrap();

    assert_eq!(page.text(NormalizationLevel::Paragraphs), "Body");
    assert_eq!(page.text(NormalizationLevel::Words), "Running Title Body");
}

#[test]
fn test_deleted_words_never_appear() {
    let mut page = Page::new();
    let words = page.line(0, 100, &["keep", "gone"], None);
    page.doc.set_next_word(words[0], None).unwrap();
    page.doc.set_text_stream_type(words[1], "deleted").unwrap();
    assert_eq!(page.text(NormalizationLevel::Raw), "keep");
}

#[test]
fn test_streams_level_keeps_streams_together() {
    let mut page = Page::new();
    let main = page.line(0, 100, &["main", "text"], None);
    page.line(0, 2500, &["footnote"], None);
    page.line(1, 100, &["continues"], Some(main[1]));

    assert_eq!(
        page.text(NormalizationLevel::Paragraphs),
        "main text\nfootnote\ncontinues"
    );
    assert_eq!(
        page.text(NormalizationLevel::Streams),
        "main text continues\nfootnote"
    );
}

#[test]
fn test_annotation_and_range_scopes() {
    let mut page = Page::new();
    let words = page.line(0, 100, &["one", "two", "three", "four"], None);
    let id = page
        .doc
        .add_annotation(words[1], words[2], "pair")
        .unwrap()
        .unwrap();
    let config = SequenceConfig::new();

    let scoped = TokenSequence::build(&page.doc, &SequenceScope::Annotation(id), &config);
    assert_eq!(scoped.text(), "two three");

    let range = TokenSequence::build(&page.doc, &SequenceScope::WordRange(words[2], words[3]), &config);
    assert_eq!(range.text(), "three four");
}

#[test]
fn test_region_scope_follows_streams_inside() {
    let mut page = Page::new();
    let left = page.line(0, 100, &["left", "column"], None);
    let right_top = page
        .doc
        .add_word(0, BoundingBox::new(1200, 1300, 100, 140), "right")
        .unwrap();
    let region = page
        .doc
        .add_region(0, BoundingBox::new(0, 1000, 0, 1000), "column")
        .unwrap();
    let config = SequenceConfig::new();
    let seq = TokenSequence::build(&page.doc, &SequenceScope::Region(region), &config);
    assert_eq!(seq.words().collect::<Vec<_>>(), left);
    assert!(seq.token_of_word(right_top).is_none());
}

#[test]
fn test_offsets_cover_text() {
    let mut page = Page::new();
    let first = page.line(0, 100, &["alpha", "beta"], None);
    page.line(0, 160, &["gamma"], Some(first[1]));
    let config = SequenceConfig::new();
    let seq = TokenSequence::build(&page.doc, &SequenceScope::Document, &config);
    let text = seq.text();
    assert_eq!(seq.char_len(), text.chars().count());
    for (i, token) in seq.tokens().iter().enumerate() {
        let value: String = text
            .chars()
            .skip(token.start_offset())
            .take(token.char_len())
            .collect();
        assert_eq!(value, token.value());
        assert_eq!(seq.token_at_offset(token.start_offset()), Some(i));
    }
}

#[test]
fn test_sequence_text_tokenizes_like_words() {
    let mut page = Page::new();
    let first = page.line(0, 100, &["It's", "a", "test"], None);
    page.line(0, 160, &["of", "tokens"], Some(first[2]));
    let tokenizer = page.doc.tokenizer();
    let config = SequenceConfig::new();
    let seq = TokenSequence::build(&page.doc, &SequenceScope::Document, &config);
    let expected: usize = seq.tokens().iter().map(|t| tokenizer.count(t.value())).sum();
    assert_eq!(tokenizer.count(&seq.text()), expected);
}
