//! Synthesized overlay annotations: pages, regions, paragraphs, tables and
//! words.

use crate::config::SequenceConfig;
use crate::model::{region_types, Document, RegionId, WordId};
use crate::sequence::overlay::{AnnotationBase, AnnotationSource};
use crate::sequence::token_sequence::TokenSequence;
use std::collections::BTreeSet;

/// Annotation type of emulated paragraphs.
pub const PARAGRAPH_TYPE: &str = "paragraph";
/// Annotation type of synthesized pages.
pub const PAGE_TYPE: &str = "page";
/// Annotation type of word entries.
pub const WORD_TYPE: &str = "word";

/// Every synthesized entry the configuration asks for.
pub(crate) fn synthesize(doc: &Document, sequence: &TokenSequence, config: &SequenceConfig) -> Vec<AnnotationBase> {
    let mut bases = Vec::new();
    let pages = sequence_pages(doc, sequence);
    if config.normalization.emulates_paragraphs() {
        bases.extend(paragraph_bases(doc, sequence));
    } else if config.synthesize_regions {
        bases.extend(page_bases(doc, sequence, &pages));
        bases.extend(region_bases(doc, sequence, &pages, config.synthesize_tables));
    }
    if config.synthesize_tables {
        for &page_id in &pages {
            for table in doc.regions_of_type(page_id, region_types::TABLE) {
                bases.extend(table_bases(doc, sequence, table));
            }
        }
    }
    if config.show_word_annotations {
        bases.extend(sequence.words().map(|w| word_base(doc, w)));
    }
    bases
}

fn sequence_pages(doc: &Document, sequence: &TokenSequence) -> BTreeSet<u32> {
    sequence
        .words()
        .map(|w| doc.words[w.index()].page_id)
        .collect()
}

/// Region words that are part of the sequence, in sequence order.
fn members_in_sequence(doc: &Document, sequence: &TokenSequence, region: RegionId) -> Vec<WordId> {
    let mut members: Vec<(usize, usize, WordId)> = doc
        .region_words(region, true)
        .into_iter()
        .filter_map(|w| sequence.word_position(w).map(|(t, i)| (t, i, w)))
        .collect();
    members.sort_unstable();
    members.into_iter().map(|(_, _, w)| w).collect()
}

fn spanning(
    doc: &Document,
    source: AnnotationSource,
    annotation_type: &str,
    members: Vec<WordId>,
) -> Option<AnnotationBase> {
    let (first, last) = (*members.first()?, *members.last()?);
    Some(AnnotationBase::new(doc, source, annotation_type, first, last).with_members(members))
}

/// Paragraphs: maximal token runs not broken by a newline.
pub(crate) fn paragraph_bases(doc: &Document, sequence: &TokenSequence) -> Vec<AnnotationBase> {
    let tokens = sequence.tokens();
    let mut bases = Vec::new();
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.whitespace().contains('\n') || i + 1 == tokens.len() {
            if let (Some(first), Some(last)) = (tokens[start].first_word(), token.last_word()) {
                bases.push(AnnotationBase::new(
                    doc,
                    AnnotationSource::Paragraph,
                    PARAGRAPH_TYPE,
                    first,
                    last,
                ));
            }
            start = i + 1;
        }
    }
    bases
}

fn page_bases(doc: &Document, sequence: &TokenSequence, pages: &BTreeSet<u32>) -> Vec<AnnotationBase> {
    pages
        .iter()
        .filter_map(|&page_id| {
            let members: Vec<WordId> = sequence
                .words()
                .filter(|w| doc.words[w.index()].page_id == page_id)
                .collect();
            spanning(doc, AnnotationSource::Page(page_id), PAGE_TYPE, members)
        })
        .collect()
}

fn region_bases(
    doc: &Document,
    sequence: &TokenSequence,
    pages: &BTreeSet<u32>,
    skip_table_parts: bool,
) -> Vec<AnnotationBase> {
    let mut bases = Vec::new();
    for &page_id in pages {
        for region in doc.regions_on_page(page_id) {
            let region_type = doc.regions[region.index()].region_type.as_str();
            if skip_table_parts && region_types::is_table_part(region_type) {
                continue;
            }
            let members = members_in_sequence(doc, sequence, region);
            if let Some(base) = spanning(doc, AnnotationSource::Region(region), region_type, members) {
                let base = base.with_attribute("regionType", region_type);
                bases.push(base);
            }
        }
    }
    bases
}

/// A table with its rows and non-empty cells.
///
/// Rows are the table's row regions ordered top down; cells are the row's
/// cell regions in layout order. A cell spanning several columns carries a
/// `colSpan` attribute (default 1). Empty cells produce no entry but are
/// counted in the `emptyCellsLeft` attribute of the next non-empty cell of
/// the row.
pub(crate) fn table_bases(doc: &Document, sequence: &TokenSequence, table: RegionId) -> Vec<AnnotationBase> {
    let table_members = members_in_sequence(doc, sequence, table);
    if table_members.is_empty() {
        return Vec::new();
    }
    let sub_regions = doc.region_sub_regions(table, true);
    let mut rows: Vec<RegionId> = sub_regions
        .iter()
        .copied()
        .filter(|r| doc.regions[r.index()].region_type == region_types::TABLE_ROW)
        .collect();
    rows.sort_by_key(|r| doc.regions[r.index()].bounds.top);

    let mut bases = Vec::new();
    let mut max_cols = 0u64;
    for (row_index, &row) in rows.iter().enumerate() {
        let cells: Vec<RegionId> = doc
            .region_sub_regions(row, true)
            .into_iter()
            .filter(|r| doc.regions[r.index()].region_type == region_types::TABLE_CELL)
            .collect();
        let mut col = 0u64;
        let mut empty_left = 0u64;
        for cell in cells {
            let span = doc.regions[cell.index()]
                .attributes
                .get_u64("colSpan")
                .unwrap_or(1)
                .max(1);
            let members = members_in_sequence(doc, sequence, cell);
            match spanning(doc, AnnotationSource::TableCell(cell), region_types::TABLE_CELL, members) {
                Some(base) => {
                    bases.push(
                        base.with_attribute("rowIndex", row_index as u64)
                            .with_attribute("colIndex", col)
                            .with_attribute("colSpan", span)
                            .with_attribute("emptyCellsLeft", empty_left),
                    );
                    empty_left = 0;
                },
                None => empty_left += span,
            }
            col += span;
        }
        max_cols = max_cols.max(col);
        let members = members_in_sequence(doc, sequence, row);
        if let Some(base) = spanning(doc, AnnotationSource::TableRow(row), region_types::TABLE_ROW, members) {
            bases.push(
                base.with_attribute("rowIndex", row_index as u64)
                    .with_attribute("cols", col),
            );
        }
    }
    if let Some(base) = spanning(doc, AnnotationSource::Table(table), region_types::TABLE, table_members) {
        bases.push(
            base.with_attribute("rows", rows.len() as u64)
                .with_attribute("cols", max_cols),
        );
    }
    bases
}

/// Entry for a single word.
pub(crate) fn word_base(doc: &Document, word: WordId) -> AnnotationBase {
    AnnotationBase::new(doc, AnnotationSource::Word(word), WORD_TYPE, word, word).with_members(vec![word])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizationLevel;
    use crate::geometry::BoundingBox;
    use crate::model::Target;
    use crate::sequence::SequenceScope;

    fn cell_word(doc: &mut Document, left: i32, top: i32, text: &str) -> WordId {
        doc.add_word(0, BoundingBox::new(left + 5, left + 45, top + 5, top + 25), text)
            .unwrap()
    }

    #[test]
    fn test_table_cells_and_spans() {
        let mut doc = Document::new("t");
        doc.add_page(0, BoundingBox::new(0, 1000, 0, 1000)).unwrap();
        let table = doc.add_region(0, BoundingBox::new(0, 300, 0, 60), "table").unwrap();
        doc.add_region(0, BoundingBox::new(0, 300, 0, 30), "tableRow").unwrap();
        doc.add_region(0, BoundingBox::new(0, 300, 30, 60), "tableRow").unwrap();
        doc.add_region(0, BoundingBox::new(0, 100, 0, 30), "tableCell").unwrap();
        doc.add_region(0, BoundingBox::new(100, 200, 0, 30), "tableCell").unwrap();
        doc.add_region(0, BoundingBox::new(200, 300, 0, 30), "tableCell").unwrap();
        let wide = doc.add_region(0, BoundingBox::new(0, 200, 30, 60), "tableCell").unwrap();
        doc.set_attribute(&Target::Region(wide), "colSpan", 2.into()).unwrap();
        doc.add_region(0, BoundingBox::new(200, 300, 30, 60), "tableCell").unwrap();

        let a = cell_word(&mut doc, 0, 0, "a");
        let c = cell_word(&mut doc, 200, 0, "c");
        let d = cell_word(&mut doc, 200, 30, "d");
        doc.set_next_word(a, Some(c)).unwrap();
        doc.set_next_word(c, Some(d)).unwrap();

        let config = SequenceConfig::new().with_normalization(NormalizationLevel::Raw);
        let sequence = TokenSequence::build(&doc, &SequenceScope::Document, &config);
        let bases = table_bases(&doc, &sequence, table);

        let cells: Vec<&AnnotationBase> = bases.iter().filter(|b| b.annotation_type == "tableCell").collect();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[1].attributes.get_u64("colIndex"), Some(2));
        assert_eq!(cells[1].attributes.get_u64("emptyCellsLeft"), Some(1));
        assert_eq!(cells[2].attributes.get_u64("colIndex"), Some(2));
        assert_eq!(cells[2].attributes.get_u64("emptyCellsLeft"), Some(2));

        let table_base = bases.iter().find(|b| b.annotation_type == "table").unwrap();
        assert_eq!(table_base.attributes.get_u64("rows"), Some(2));
        assert_eq!(table_base.attributes.get_u64("cols"), Some(3));
    }

    #[test]
    fn test_paragraph_bases_split_on_newline() {
        let mut doc = Document::new("p");
        doc.add_page(0, BoundingBox::new(0, 1000, 0, 1000)).unwrap();
        let a = doc.add_word(0, BoundingBox::new(10, 50, 10, 40), "one").unwrap();
        let b = doc.add_word(0, BoundingBox::new(10, 50, 200, 230), "two").unwrap();
        let config = SequenceConfig::new();
        let sequence = TokenSequence::build(&doc, &SequenceScope::Document, &config);
        let bases = paragraph_bases(&doc, &sequence);
        assert_eq!(bases.len(), 2);
        assert_eq!(bases[0].first_word, a);
        assert_eq!(bases[1].last_word, b);
    }
}
