//! Board rules: pure functions over a 3×3 board snapshot.
//!
//! Everything here is total — any board and any client-supplied position
//! (including negative or oversized ones) produces an answer, never a
//! panic. The authority composes these into its move pipeline.

use crate::state::Board;

/// The eight winning lines of a 3×3 board, as cell indices (row-major).
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2], [3, 4, 5], [6, 7, 8], // rows
    [0, 3, 6], [1, 4, 7], [2, 5, 8], // columns
    [0, 4, 8], [2, 4, 6],            // diagonals
];

/// Returns `true` if `position` names an empty cell.
///
/// `position` arrives straight off the wire as a signed integer, so
/// range-checking happens here and nowhere earlier.
pub fn is_legal_placement(board: &Board, position: i32) -> bool {
    let Ok(index) = usize::try_from(position) else {
        return false;
    };
    index < 9 && board.cell(index).is_none()
}

/// Returns `true` if any winning line holds three equal marks.
pub fn detect_win(board: &Board) -> bool {
    WIN_LINES.iter().any(|line| match board.cell(line[0]) {
        Some(mark) => board.cell(line[1]) == Some(mark) && board.cell(line[2]) == Some(mark),
        None => false,
    })
}

/// Returns `true` if the board is full with no winner.
///
/// Callers check [`detect_win`] first; the win exclusion here keeps the
/// function total regardless.
pub fn is_draw(board: &Board, move_count: u8) -> bool {
    move_count >= 9 && !detect_win(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Mark;

    /// Builds a board from a 9-char sketch: 'X', 'O', or '.' per cell.
    fn board(sketch: &str) -> Board {
        let mut board = Board::default();
        for (index, ch) in sketch.chars().enumerate() {
            match ch {
                'X' => board.set(index, Mark::X),
                'O' => board.set(index, Mark::O),
                _ => {}
            }
        }
        board
    }

    #[test]
    fn test_is_legal_placement_on_empty_board() {
        let b = Board::default();
        for position in 0..9 {
            assert!(is_legal_placement(&b, position), "position {position}");
        }
    }

    #[test]
    fn test_is_legal_placement_rejects_out_of_range() {
        let b = Board::default();
        assert!(!is_legal_placement(&b, -1));
        assert!(!is_legal_placement(&b, 9));
        assert!(!is_legal_placement(&b, 42));
        assert!(!is_legal_placement(&b, i32::MIN));
        assert!(!is_legal_placement(&b, i32::MAX));
    }

    #[test]
    fn test_is_legal_placement_rejects_occupied_cell() {
        let b = board("X........");
        assert!(!is_legal_placement(&b, 0));
        assert!(is_legal_placement(&b, 1));
    }

    #[test]
    fn test_detect_win_empty_board() {
        assert!(!detect_win(&Board::default()));
    }

    #[test]
    fn test_detect_win_all_eight_lines() {
        for line in WIN_LINES {
            let mut b = Board::default();
            for index in line {
                b.set(index, Mark::X);
            }
            assert!(detect_win(&b), "line {line:?}");
        }
    }

    #[test]
    fn test_detect_win_requires_equal_marks() {
        // Three marks on a line, but mixed — not a win.
        let b = board("XOX......");
        assert!(!detect_win(&b));
    }

    #[test]
    fn test_detect_win_for_either_mark() {
        let b = board("...OOO...");
        assert!(detect_win(&b));
    }

    #[test]
    fn test_is_draw_full_board_without_winner() {
        //  X O X
        //  X O O
        //  O X X
        let b = board("XOXXOOOXX");
        assert!(!detect_win(&b));
        assert!(is_draw(&b, 9));
    }

    #[test]
    fn test_is_draw_excludes_wins() {
        //  X X X
        //  O O X
        //  O X O  — full board, but X won.
        let b = board("XXXOOXOXO");
        assert!(detect_win(&b));
        assert!(!is_draw(&b, 9));
    }

    #[test]
    fn test_is_draw_requires_full_board() {
        assert!(!is_draw(&Board::default(), 0));
        assert!(!is_draw(&board("XOXXO...."), 5));
    }
}
