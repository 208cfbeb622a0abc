//! Building the token sequence from the word graph.
//!
//! Construction runs in three steps:
//!
//! 1. collect the words of the scope in reading order (stream heads ordered
//!    by page, then by layout; each head walked along its stream);
//! 2. group chain-linked words joined by `continue` (and `hyphenated` from
//!    the word level up) into tokens;
//! 3. synthesize the whitespace between neighbouring tokens from layout
//!    geometry, next relations and the document's tokenizer.

use crate::config::{NormalizationLevel, Orientation, SequenceConfig};
use crate::error::Result;
use crate::model::order::text_stream_order;
use crate::model::region_types;
use crate::model::{AnnotationId, Document, NextRelation, RegionId, Word, WordId};
use crate::sequence::token::ImToken;
use crate::text::hyphenation::{HyphenDecision, HyphenationHandler};
use std::collections::HashSet;

/// The part of a document a token sequence covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceScope {
    /// Every page
    Document,
    /// The streams starting at the given heads, in the given order
    Streams(Vec<WordId>),
    /// The words of one annotation
    Annotation(AnnotationId),
    /// The words from the first to the second, following the stream
    WordRange(WordId, WordId),
    /// The words inside one region
    Region(RegionId),
}

/// Mark paragraph ends and repair line-end hyphenation.
///
/// The last word (in stream order) of every paragraph region gets a
/// paragraph-end relation unless it already joins its successor. With
/// hyphenation repair enabled, words separated from their successor by a line
/// or page break are re-examined: "wonder-" followed by "ful" becomes
/// hyphenated, a compound prefix such as "self-" is glued with its hyphen.
pub(crate) fn prepare_paragraphs(doc: &mut Document, config: &SequenceConfig) -> Result<()> {
    let mut updates: Vec<(WordId, NextRelation)> = Vec::new();
    for page_id in doc.page_ids() {
        for region in doc.regions_of_type(page_id, region_types::PARAGRAPH) {
            let last = doc
                .region_words(region, true)
                .into_iter()
                .filter(|w| !doc.words[w.index()].is_deleted())
                .max_by(|a, b| text_stream_order(&doc.words, *a, *b));
            if let Some(last) = last {
                if doc.words[last.index()].next_relation == NextRelation::Separate {
                    updates.push((last, NextRelation::ParagraphEnd));
                }
            }
        }
    }

    if config.repair_hyphenation {
        let handler = HyphenationHandler::new();
        for word in doc.words.iter().filter(|w| w.attached && !w.is_deleted()) {
            let Some(next) = word.next else {
                continue;
            };
            if word.next_relation != NextRelation::Separate || updates.iter().any(|(w, _)| *w == word.id) {
                continue;
            }
            let next = &doc.words[next.index()];
            if next.page_id == word.page_id && next.bounds.is_same_line(&word.bounds) {
                continue;
            }
            match handler.decide(&word.string, &next.string) {
                HyphenDecision::Hyphenated => updates.push((word.id, NextRelation::Hyphenated)),
                HyphenDecision::Compound => updates.push((word.id, NextRelation::Continue)),
                HyphenDecision::Separate => {},
            }
        }
    }

    if !updates.is_empty() {
        log::debug!("Paragraph preparation rewrites {} next relations", updates.len());
    }
    for (word, relation) in updates {
        doc.set_next_relation(word, relation)?;
    }
    Ok(())
}

fn is_visible(word: &Word) -> bool {
    word.attached && !word.is_deleted() && !word.string.is_empty()
}

/// Collect the words of a scope in reading order.
pub(crate) fn collect_words(doc: &Document, scope: &SequenceScope, config: &SequenceConfig) -> Vec<WordId> {
    let excluded = config.excluded_stream_types();
    let in_stream_scope = |w: &Word| is_visible(w) && !excluded.contains(&w.text_stream_type());
    match scope {
        SequenceScope::Document => {
            let heads: Vec<WordId> = doc
                .page_ids()
                .into_iter()
                .flat_map(|page_id| doc.text_stream_heads(page_id))
                .filter(|w| in_stream_scope(&doc.words[w.index()]))
                .collect();
            walk_streams(doc, &heads, config, in_stream_scope)
        },
        SequenceScope::Streams(heads) => walk_streams(doc, heads, config, in_stream_scope),
        SequenceScope::Annotation(id) => doc
            .annotation_words(*id)
            .into_iter()
            .filter(|w| is_visible(&doc.words[w.index()]))
            .collect(),
        SequenceScope::WordRange(first, last) => {
            let mut words = Vec::new();
            for w in doc.stream_words(*first) {
                if is_visible(&doc.words[w.index()]) {
                    words.push(w);
                }
                if w == *last {
                    break;
                }
            }
            words
        },
        SequenceScope::Region(region) => {
            let members: Vec<WordId> = doc
                .region_words(*region, true)
                .into_iter()
                .filter(|w| in_stream_scope(&doc.words[w.index()]))
                .collect();
            let member_set: HashSet<WordId> = members.iter().copied().collect();
            let mut visited = HashSet::new();
            let mut words = Vec::new();
            let local_heads = members.iter().filter(|w| {
                doc.words[w.index()]
                    .prev
                    .map_or(true, |p| !member_set.contains(&p))
            });
            for &head in local_heads.chain(members.iter()) {
                let mut current = Some(head);
                while let Some(w) = current {
                    if !member_set.contains(&w) || !visited.insert(w) {
                        break;
                    }
                    words.push(w);
                    current = doc.words[w.index()].next;
                }
            }
            words
        },
    }
}

fn walk_streams<F>(doc: &Document, heads: &[WordId], config: &SequenceConfig, keep: F) -> Vec<WordId>
where
    F: Fn(&Word) -> bool,
{
    let whole_streams = config.normalization >= NormalizationLevel::Streams;
    let mut visited = HashSet::new();
    let mut words = Vec::new();
    for &head in heads {
        if visited.contains(&head) {
            continue;
        }
        let chain = if whole_streams {
            doc.stream_words(head)
        } else {
            doc.page_stream_words(head)
        };
        for w in chain {
            if !visited.insert(w) {
                break;
            }
            if keep(&doc.words[w.index()]) {
                words.push(w);
            }
        }
    }
    words
}

/// Group words into tokens and synthesize the whitespace between them.
///
/// The last token gets empty whitespace.
pub(crate) fn group_tokens(doc: &Document, words: &[WordId], config: &SequenceConfig) -> Vec<ImToken> {
    let join_hyphenation = config.normalization.joins_hyphenation();
    let mut tokens = Vec::new();
    let mut members = Vec::new();
    let mut lens = Vec::new();
    let mut value = String::new();
    for (i, &w) in words.iter().enumerate() {
        let word = &doc.words[w.index()];
        let joins_next = words
            .get(i + 1)
            .is_some_and(|n| word.next == Some(*n) && word.next_relation.joins_token(join_hyphenation));
        let piece = if joins_next && word.next_relation == NextRelation::Hyphenated {
            HyphenationHandler::strip_hyphen(&word.string)
        } else {
            word.string.as_str()
        };
        members.push(w);
        lens.push(piece.chars().count());
        value.push_str(piece);
        if !joins_next {
            tokens.push(ImToken::new(
                std::mem::take(&mut members),
                std::mem::take(&mut lens),
                std::mem::take(&mut value),
            ));
        }
    }
    for i in 1..tokens.len() {
        let whitespace = whitespace_between(doc, &tokens[i - 1], &tokens[i], config);
        tokens[i - 1].whitespace = whitespace;
    }
    tokens
}

/// Whitespace to put between two neighbouring tokens.
pub(crate) fn whitespace_between(doc: &Document, left: &ImToken, right: &ImToken, config: &SequenceConfig) -> String {
    let (Some(a), Some(b)) = (left.last_word(), right.first_word()) else {
        return " ".to_string();
    };
    let (wa, wb) = (&doc.words[a.index()], &doc.words[b.index()]);
    let linked = wa.next == Some(b);
    if config.normalization.emulates_paragraphs() && (!linked || wa.next_relation == NextRelation::ParagraphEnd) {
        return "\n".to_string();
    }
    if wa.page_id != wb.page_id || !wa.bounds.is_same_line(&wb.bounds) {
        return " ".to_string();
    }
    let gap = match doc.orientation() {
        Orientation::LeftRightTopDown => wb.bounds.left - wa.bounds.right,
        Orientation::RightLeftTopDown => wa.bounds.left - wb.bounds.right,
    };
    let line_height = (wa.bounds.height() + wb.bounds.height()) / 2;
    if gap * 8 > line_height {
        return " ".to_string();
    }
    let tokenizer = doc.tokenizer();
    let glued = format!("{}{}", left.value, right.value);
    if tokenizer.count(&glued) == tokenizer.count(&left.value) + tokenizer.count(&right.value) {
        String::new()
    } else {
        " ".to_string()
    }
}
