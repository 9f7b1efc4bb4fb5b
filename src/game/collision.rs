//! Collision rule shared by moves, rotation, locking and the spawn check.

use super::grid::Grid;
use super::piece::ActivePiece;

/// True if any cell of `piece` is left of the board, right of it, below it, or on a locked
/// block. Cells above the board (`y < 0`) never collide, so spawns may overhang the top.
pub fn check_collision(board: &Grid, piece: &ActivePiece) -> bool {
    let width = board.width() as i32;
    let height = board.height() as i32;
    piece.cells().iter().any(|&(x, y)| {
        x < 0 || x >= width || y >= height || (y >= 0 && board.is_occupied(x, y))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::piece::{PieceKind, rotate};

    #[test]
    fn test_empty_board_spawn_is_clear() {
        let board = Grid::new(10, 20);
        for kind in PieceKind::ALL {
            assert!(!check_collision(&board, &ActivePiece::new(kind, 4, 0)));
        }
    }

    #[test]
    fn test_walls_and_floor_collide() {
        let board = Grid::new(10, 20);
        assert!(check_collision(&board, &ActivePiece::new(PieceKind::O, -1, 0)));
        assert!(check_collision(&board, &ActivePiece::new(PieceKind::O, 9, 0)));
        assert!(check_collision(&board, &ActivePiece::new(PieceKind::O, 4, 19)));
        assert!(!check_collision(&board, &ActivePiece::new(PieceKind::O, 8, 18)));
        assert!(!check_collision(&board, &ActivePiece::new(PieceKind::O, 0, 18)));
    }

    #[test]
    fn test_above_board_never_collides() {
        let mut board = Grid::new(10, 20);
        // Fill the whole top row; a piece entirely above it must still be clear.
        board.lock_cells((0..10).map(|x| (x, 0)), PieceKind::Z);
        assert!(!check_collision(&board, &ActivePiece::new(PieceKind::O, 4, -2)));
        // An I rotated once points upwards from its origin.
        let mut piece = ActivePiece::new(PieceKind::I, 4, -1);
        piece.offsets = rotate(&piece.offsets);
        assert!(piece.cells().iter().all(|&(_, y)| y < 0));
        assert!(!check_collision(&board, &piece));
    }

    #[test]
    fn test_above_board_still_checks_columns() {
        let board = Grid::new(10, 20);
        assert!(check_collision(&board, &ActivePiece::new(PieceKind::O, -1, -5)));
        assert!(check_collision(&board, &ActivePiece::new(PieceKind::O, 9, -5)));
    }

    #[test]
    fn test_occupied_cell_collides() {
        let mut board = Grid::new(10, 20);
        board.lock_cells([(5, 1)], PieceKind::T);
        assert!(check_collision(&board, &ActivePiece::new(PieceKind::O, 4, 0)));
        assert!(check_collision(&board, &ActivePiece::new(PieceKind::O, 5, 1)));
        assert!(!check_collision(&board, &ActivePiece::new(PieceKind::O, 6, 0)));
        assert!(!check_collision(&board, &ActivePiece::new(PieceKind::O, 2, 0)));
    }
}
