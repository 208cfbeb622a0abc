//! Uniform grid over a page for point and rectangle lookups of words.
//!
//! The cell size is derived from the page box (an eighth of the width or an
//! eleventh of the height, whichever is smaller), so a page holds roughly a
//! letter-sized 8 x 11 grid regardless of its resolution. Each cell lists the
//! words whose boxes touch it.

use crate::geometry::BoundingBox;
use crate::model::word::WordId;

#[derive(Debug, Clone)]
pub(crate) struct WordGrid {
    origin_x: i32,
    origin_y: i32,
    step: i32,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<WordId>>,
}

impl WordGrid {
    pub(crate) fn new(page: BoundingBox) -> Self {
        let step = (page.width() / 8).min(page.height() / 11).max(1);
        let cols = (page.width().max(1) as usize).div_ceil(step as usize).max(1);
        let rows = (page.height().max(1) as usize).div_ceil(step as usize).max(1);
        Self {
            origin_x: page.left,
            origin_y: page.top,
            step,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    fn col_of(&self, x: i32) -> usize {
        let col = (x - self.origin_x).div_euclid(self.step);
        col.clamp(0, self.cols as i32 - 1) as usize
    }

    fn row_of(&self, y: i32) -> usize {
        let row = (y - self.origin_y).div_euclid(self.step);
        row.clamp(0, self.rows as i32 - 1) as usize
    }

    /// Cell indices covered by a box, clipped to the grid.
    fn cells_of(&self, bounds: BoundingBox) -> impl Iterator<Item = usize> + '_ {
        let (c0, c1) = (self.col_of(bounds.left), self.col_of((bounds.right - 1).max(bounds.left)));
        let (r0, r1) = (self.row_of(bounds.top), self.row_of((bounds.bottom - 1).max(bounds.top)));
        (r0..=r1).flat_map(move |row| (c0..=c1).map(move |col| row * self.cols + col))
    }

    pub(crate) fn insert(&mut self, word: WordId, bounds: BoundingBox) {
        let cells: Vec<usize> = self.cells_of(bounds).collect();
        for cell in cells {
            if !self.cells[cell].contains(&word) {
                self.cells[cell].push(word);
            }
        }
    }

    pub(crate) fn remove(&mut self, word: WordId, bounds: BoundingBox) {
        let cells: Vec<usize> = self.cells_of(bounds).collect();
        for cell in cells {
            self.cells[cell].retain(|w| *w != word);
        }
    }

    /// Words registered in the cell containing a point.
    pub(crate) fn candidates_at(&self, x: i32, y: i32) -> &[WordId] {
        &self.cells[self.row_of(y) * self.cols + self.col_of(x)]
    }

    /// Words registered in any cell touched by a box, without duplicates.
    ///
    /// The right and bottom edges count as inside, matching fuzzy inclusion.
    pub(crate) fn candidates_in(&self, bounds: BoundingBox) -> Vec<WordId> {
        let closed = BoundingBox {
            right: bounds.right.saturating_add(1),
            bottom: bounds.bottom.saturating_add(1),
            ..bounds
        };
        let mut out: Vec<WordId> = self.cells_of(closed).flat_map(|cell| self.cells[cell].iter().copied()).collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_step_follows_letter_proportions() {
        let grid = WordGrid::new(BoundingBox::new(0, 800, 0, 1100));
        assert_eq!(grid.step, 100);
        assert_eq!(grid.cols, 8);
        assert_eq!(grid.rows, 11);
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut grid = WordGrid::new(BoundingBox::new(0, 800, 0, 1100));
        let bb = BoundingBox::new(150, 260, 90, 120);
        grid.insert(WordId(1), bb);
        assert_eq!(grid.candidates_at(200, 100), &[WordId(1)]);
        assert_eq!(grid.candidates_at(250, 110), &[WordId(1)]);
        assert!(grid.candidates_at(700, 1000).is_empty());
        assert_eq!(grid.candidates_in(BoundingBox::new(0, 800, 0, 1100)), vec![WordId(1)]);
        grid.remove(WordId(1), bb);
        assert!(grid.candidates_at(200, 100).is_empty());
    }

    #[test]
    fn test_out_of_page_boxes_are_clipped() {
        let mut grid = WordGrid::new(BoundingBox::new(0, 80, 0, 110));
        grid.insert(WordId(0), BoundingBox::new(-50, 500, -20, 5));
        assert_eq!(grid.candidates_at(0, 0), &[WordId(0)]);
        assert_eq!(grid.candidates_at(79, 0), &[WordId(0)]);
    }
}
