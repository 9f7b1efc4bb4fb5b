//! Board: fixed grid of locked cells and the line-clear algorithm.

use super::piece::PieceKind;
use std::collections::VecDeque;

/// Single cell: empty or the kind of the piece that locked there.
pub type Cell = Option<PieceKind>;

/// Board of `height` rows by `width` columns. y=0 is top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    /// rows[y][x] = cell. rows[0] is top.
    rows: VecDeque<Vec<Cell>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        let rows = (0..height).map(|_| vec![None; width]).collect();
        Self {
            width,
            height,
            rows,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at `(x, y)`, or `None` outside the board.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        let (x, y) = self.index(x, y)?;
        Some(self.rows[y][x])
    }

    /// True if `(x, y)` holds a locked block. Out-of-range cells are not occupied here;
    /// bounds belong to the collision rule.
    #[inline]
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), Some(Some(_)))
    }

    /// Write `kind` into each in-bounds cell. Cells outside the board are skipped.
    pub fn lock_cells<I>(&mut self, cells: I, kind: PieceKind)
    where
        I: IntoIterator<Item = (i32, i32)>,
    {
        for (x, y) in cells {
            if let Some((x, y)) = self.index(x, y) {
                self.rows[y][x] = Some(kind);
            }
        }
    }

    /// Indices of rows with no empty cell, top to bottom.
    pub fn full_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(Option::is_some))
            .map(|(y, _)| y)
            .collect()
    }

    /// Remove every full row at once and push the same number of empty rows in at the top.
    /// Returns how many rows were removed.
    pub fn clear_full_lines(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| !row.iter().all(Option::is_some));
        let removed = before - self.rows.len();
        for _ in 0..removed {
            self.rows.push_front(vec![None; self.width]);
        }
        removed
    }

    /// True if no cell is occupied.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.iter().flatten().all(Option::is_none)
    }

    /// Rows top to bottom, for rendering.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    fn index(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then_some((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(grid: &mut Grid, y: i32, kind: PieceKind) {
        let w = grid.width() as i32;
        grid.lock_cells((0..w).map(|x| (x, y)), kind);
    }

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(10, 20);
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 20);
        assert!(grid.is_empty());
        assert_eq!(grid.rows().count(), 20);
    }

    #[test]
    fn test_out_of_range_is_not_occupied() {
        let grid = Grid::new(10, 20);
        assert!(!grid.is_occupied(-1, 0));
        assert!(!grid.is_occupied(0, -1));
        assert!(!grid.is_occupied(10, 0));
        assert!(!grid.is_occupied(0, 20));
        assert_eq!(grid.get(10, 0), None);
        assert_eq!(grid.get(0, 0), Some(None));
    }

    #[test]
    fn test_lock_cells_skips_out_of_range() {
        let mut grid = Grid::new(4, 4);
        grid.lock_cells([(0, -1), (1, 0), (4, 0), (2, 3)], PieceKind::T);
        assert!(grid.is_occupied(1, 0));
        assert!(grid.is_occupied(2, 3));
        assert_eq!(grid.rows().flatten().filter(|c| c.is_some()).count(), 2);
    }

    #[test]
    fn test_clear_without_full_rows_is_noop() {
        let mut grid = Grid::new(4, 4);
        grid.lock_cells([(0, 3), (1, 3), (2, 3)], PieceKind::I);
        let before = grid.clone();
        assert_eq!(grid.clear_full_lines(), 0);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_clear_removes_all_full_rows_at_once() {
        let mut grid = Grid::new(4, 6);
        // Rows 2 and 4 full, with markers in rows 1, 3 and 5.
        fill_row(&mut grid, 2, PieceKind::I);
        fill_row(&mut grid, 4, PieceKind::I);
        grid.lock_cells([(0, 1)], PieceKind::T);
        grid.lock_cells([(1, 3)], PieceKind::S);
        grid.lock_cells([(2, 5)], PieceKind::Z);
        assert_eq!(grid.full_rows(), vec![2, 4]);

        assert_eq!(grid.clear_full_lines(), 2);

        assert_eq!(grid.height(), 6);
        assert_eq!(grid.rows().count(), 6);
        // Two fresh rows on top, then the survivors in their old order.
        for y in 0..3 {
            assert!((0..4).all(|x| !grid.is_occupied(x, y)), "row {y} should be empty");
        }
        assert_eq!(grid.get(0, 3), Some(Some(PieceKind::T)));
        assert_eq!(grid.get(1, 4), Some(Some(PieceKind::S)));
        assert_eq!(grid.get(2, 5), Some(Some(PieceKind::Z)));
        assert!(grid.full_rows().is_empty());
    }

    #[test]
    fn test_clear_adjacent_full_rows() {
        let mut grid = Grid::new(3, 5);
        for y in 1..5 {
            fill_row(&mut grid, y, PieceKind::O);
        }
        grid.lock_cells([(1, 0)], PieceKind::L);
        assert_eq!(grid.clear_full_lines(), 4);
        assert_eq!(grid.get(1, 4), Some(Some(PieceKind::L)));
        assert_eq!(grid.rows().flatten().filter(|c| c.is_some()).count(), 1);
    }

    #[test]
    fn test_clear_entire_board() {
        let mut grid = Grid::new(2, 3);
        for y in 0..3 {
            fill_row(&mut grid, y, PieceKind::J);
        }
        assert_eq!(grid.clear_full_lines(), 3);
        assert!(grid.is_empty());
    }
}
