//! Text-stream linkage.
//!
//! Words form logical text streams through predecessor/successor links. The
//! setters here keep the links symmetric (`prev.next == this`), refuse links
//! that would close a cycle, and re-derive the stream head, position and type
//! of every word whose predecessor changed:
//!
//! - no predecessor: the word heads its own stream at position 0;
//! - predecessor on another page: same stream, position restarts at 0;
//! - predecessor on the same page: same stream, position + 1.
//!
//! Renumbering walks forward from the changed word and stops at the first
//! word that already carries the right values.

use crate::error::{Error, Result};
use crate::model::attributes::AttributeValue;
use crate::model::document::Document;
use crate::model::events::{ChangeEvent, Target};
use crate::model::word::{NextRelation, WordId};

/// A pending link-change notification: word, attribute name, old neighbour.
type LinkChange = (WordId, &'static str, Option<WordId>);

impl Document {
    /// Link `prev` as the predecessor of `word` (or unlink with `None`).
    ///
    /// The old predecessor of `word` loses its successor, and the old
    /// successor of `prev` becomes the head of a new stream.
    ///
    /// # Errors
    ///
    /// [`Error::SelfLink`] when `prev == word`, [`Error::OrderingViolation`]
    /// when `prev` lies downstream of `word`.
    pub fn set_previous_word(&mut self, word: WordId, prev: Option<WordId>) -> Result<()> {
        self.check_word(word)?;
        if let Some(p) = prev {
            self.check_word(p)?;
            if p == word {
                return Err(Error::SelfLink(self.words[word.index()].local_id()));
            }
            if self.is_downstream(word, p) {
                return Err(Error::OrderingViolation {
                    word: self.words[word.index()].local_id(),
                    predecessor: self.words[p.index()].local_id(),
                });
            }
        }
        let old_prev = self.words[word.index()].prev;
        if old_prev == prev {
            return Ok(());
        }

        let mut changes: Vec<LinkChange> = vec![(word, "prevWord", old_prev)];
        let mut cut_loose = None;
        if let Some(op) = old_prev {
            self.words[op.index()].next = None;
            changes.push((op, "nextWord", Some(word)));
        }
        self.words[word.index()].prev = prev;
        if let Some(p) = prev {
            let old_next = self.words[p.index()].next;
            if let Some(successor) = old_next {
                self.words[successor.index()].prev = None;
                changes.push((successor, "prevWord", Some(p)));
                cut_loose = Some(successor);
            }
            self.words[p.index()].next = Some(word);
            changes.push((p, "nextWord", old_next));
        }

        let mut renumbered = Vec::new();
        if let Some(successor) = cut_loose {
            self.renumber_stream_from(successor, &mut renumbered);
        }
        self.renumber_stream_from(word, &mut renumbered);
        if !renumbered.is_empty() {
            log::debug!("Relinking {} renumbered {} words", word, renumbered.len());
        }

        for (w, name, old) in changes {
            if self.words[w.index()].attached {
                let old_value = old.map(|o| AttributeValue::from(self.words[o.index()].local_id()));
                self.emit(ChangeEvent::AttributeChanged {
                    target: Target::Word(w),
                    name: name.to_string(),
                    old_value,
                });
            }
        }
        self.reindex_annotations_for(&renumbered);
        self.flush_events();
        Ok(())
    }

    /// Link `next` as the successor of `word` (or cut the successor with `None`).
    pub fn set_next_word(&mut self, word: WordId, next: Option<WordId>) -> Result<()> {
        self.check_word(word)?;
        match next {
            Some(n) => self.set_previous_word(n, Some(word)),
            None => match self.words[word.index()].next {
                Some(n) => self.set_previous_word(n, None),
                None => Ok(()),
            },
        }
    }

    /// Whether `candidate` is reachable from `word` by following successors.
    fn is_downstream(&self, word: WordId, candidate: WordId) -> bool {
        let mut current = self.words[word.index()].next;
        let mut steps = 0;
        while let Some(w) = current {
            if w == candidate {
                return true;
            }
            steps += 1;
            if steps > self.words.len() {
                break;
            }
            current = self.words[w.index()].next;
        }
        false
    }

    fn renumber_stream_from(&mut self, start: WordId, renumbered: &mut Vec<WordId>) {
        let mut current = Some(start);
        let mut steps = 0;
        while let Some(w) = current {
            steps += 1;
            if steps > self.words.len() {
                log::error!("Cycle detected in text stream at {}", w);
                break;
            }
            let (head, pos, stream_type) = match self.words[w.index()].prev {
                None => (w, 0, self.words[w.index()].stream_type.clone()),
                Some(p) => {
                    let pw = &self.words[p.index()];
                    let pos = if pw.page_id == self.words[w.index()].page_id {
                        pw.stream_pos + 1
                    } else {
                        0
                    };
                    (pw.stream_head, pos, pw.stream_type.clone())
                },
            };
            let word = &mut self.words[w.index()];
            if word.stream_head == head && word.stream_pos == pos && word.stream_type == stream_type {
                break;
            }
            word.stream_head = head;
            word.stream_pos = pos;
            word.stream_type = stream_type;
            renumbered.push(w);
            current = word.next;
        }
    }

    /// Set the stream type of every word in the stream of `word`.
    pub fn set_text_stream_type(&mut self, word: WordId, stream_type: &str) -> Result<()> {
        self.check_word(word)?;
        for w in self.chain_of(word) {
            let entry = &mut self.words[w.index()];
            if entry.stream_type == stream_type {
                continue;
            }
            let attached = entry.attached;
            let old = std::mem::replace(&mut entry.stream_type, stream_type.to_string());
            if attached {
                self.emit(ChangeEvent::AttributeChanged {
                    target: Target::Word(w),
                    name: "textStreamType".to_string(),
                    old_value: Some(old.into()),
                });
            }
        }
        self.flush_events();
        Ok(())
    }

    /// Replace the string of a word.
    pub fn set_word_string(&mut self, word: WordId, string: impl Into<String>) -> Result<()> {
        self.check_word(word)?;
        let string = string.into();
        let entry = &mut self.words[word.index()];
        if entry.string == string {
            return Ok(());
        }
        let old = std::mem::replace(&mut entry.string, string);
        self.emit(ChangeEvent::AttributeChanged {
            target: Target::Word(word),
            name: "string".to_string(),
            old_value: Some(old.into()),
        });
        self.flush_events();
        Ok(())
    }

    /// Set how a word joins its successor.
    pub fn set_next_relation(&mut self, word: WordId, relation: NextRelation) -> Result<()> {
        self.check_word(word)?;
        let entry = &mut self.words[word.index()];
        if entry.next_relation == relation {
            return Ok(());
        }
        let old = std::mem::replace(&mut entry.next_relation, relation);
        self.emit(ChangeEvent::AttributeChanged {
            target: Target::Word(word),
            name: "nextRelation".to_string(),
            old_value: Some(old.to_string().into()),
        });
        self.flush_events();
        Ok(())
    }

    /// Text stream id of a word: the local id of the stream's first word.
    pub fn text_stream_id(&self, word: WordId) -> Option<String> {
        let head = self.word(word)?.stream_head;
        self.word(head).map(|w| w.local_id())
    }

    /// Whether a word starts a stream on its page.
    pub fn is_text_stream_head(&self, word: WordId) -> bool {
        match self.word(word) {
            Some(w) => match w.prev {
                None => true,
                Some(p) => self.words[p.index()].page_id != w.page_id,
            },
            None => false,
        }
    }

    /// Words of a page that start a stream there, in layout order.
    pub fn text_stream_heads(&self, page_id: u32) -> Vec<WordId> {
        let mut heads: Vec<WordId> = self
            .words_on_page(page_id)
            .into_iter()
            .filter(|w| self.is_text_stream_head(*w))
            .collect();
        self.sort_by_layout(&mut heads);
        heads
    }

    /// The words of a stream from `head` onwards, across pages.
    pub fn stream_words(&self, head: WordId) -> Vec<WordId> {
        let mut words = Vec::new();
        let mut current = self.word(head).map(|w| w.id);
        while let Some(w) = current {
            if words.len() > self.words.len() {
                break;
            }
            words.push(w);
            current = self.words[w.index()].next;
        }
        words
    }

    /// The words of a stream from `head` onwards, up to the end of its page.
    pub fn page_stream_words(&self, head: WordId) -> Vec<WordId> {
        let Some(page_id) = self.word(head).map(|w| w.page_id) else {
            return Vec::new();
        };
        let mut words = Vec::new();
        let mut current = Some(head);
        while let Some(w) = current {
            if words.len() > self.words.len() || self.words[w.index()].page_id != page_id {
                break;
            }
            words.push(w);
            current = self.words[w.index()].next;
        }
        words
    }

    /// Every word linked to `word`, from the start of its chain to the end.
    pub(crate) fn chain_of(&self, word: WordId) -> Vec<WordId> {
        let mut first = word;
        let mut steps = 0;
        while let Some(p) = self.words[first.index()].prev {
            steps += 1;
            if steps > self.words.len() {
                break;
            }
            first = p;
        }
        self.stream_words(first)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::geometry::BoundingBox;
    use crate::model::document::Document;
    use crate::model::word::WordId;

    fn doc_with_words(n: i32) -> (Document, Vec<WordId>) {
        let mut doc = Document::new("linkage");
        doc.add_page(0, BoundingBox::new(0, 1000, 0, 1000)).unwrap();
        let words = (0..n)
            .map(|i| {
                doc.add_word(0, BoundingBox::new(10 + i * 60, 60 + i * 60, 10, 30), format!("w{}", i))
                    .unwrap()
            })
            .collect();
        (doc, words)
    }

    #[test]
    fn test_chain_positions() {
        let (mut doc, w) = doc_with_words(3);
        doc.set_next_word(w[0], Some(w[1])).unwrap();
        doc.set_next_word(w[1], Some(w[2])).unwrap();
        assert_eq!(doc.word(w[2]).unwrap().text_stream_pos(), 2);
        assert_eq!(doc.word(w[2]).unwrap().text_stream_head(), w[0]);
        assert_eq!(doc.text_stream_heads(0), vec![w[0]]);
    }

    #[test]
    fn test_self_link_rejected() {
        let (mut doc, w) = doc_with_words(1);
        assert!(matches!(doc.set_next_word(w[0], Some(w[0])), Err(Error::SelfLink(_))));
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut doc, w) = doc_with_words(3);
        doc.set_next_word(w[0], Some(w[1])).unwrap();
        doc.set_next_word(w[1], Some(w[2])).unwrap();
        assert!(matches!(
            doc.set_previous_word(w[0], Some(w[2])),
            Err(Error::OrderingViolation { .. })
        ));
        assert_eq!(doc.word(w[0]).unwrap().previous_word(), None);
    }

    #[test]
    fn test_relinking_cuts_old_successor_loose() {
        let (mut doc, w) = doc_with_words(3);
        doc.set_next_word(w[0], Some(w[1])).unwrap();
        doc.set_next_word(w[0], Some(w[2])).unwrap();
        assert_eq!(doc.word(w[1]).unwrap().previous_word(), None);
        assert_eq!(doc.word(w[1]).unwrap().text_stream_head(), w[1]);
        assert_eq!(doc.word(w[2]).unwrap().text_stream_pos(), 1);
    }

    #[test]
    fn test_stream_type_propagates() {
        let (mut doc, w) = doc_with_words(3);
        doc.set_next_word(w[0], Some(w[1])).unwrap();
        doc.set_next_word(w[1], Some(w[2])).unwrap();
        doc.set_text_stream_type(w[1], "footnote").unwrap();
        for word in &w {
            assert_eq!(doc.word(*word).unwrap().text_stream_type(), "footnote");
        }
    }
}
