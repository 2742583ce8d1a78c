use std::fmt;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

/// Random moves applied by a default scramble. Tunable, not a correctness
/// requirement; any walk length yields a reachable (hence solvable) grid.
pub const DEFAULT_SHUFFLE_MOVES: usize = 200;

// The empty cell is represented by 0.
const EMPTY: u32 = 0;

/// A 0-indexed (row, col) cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The direction a tile travels when it slides into the empty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    // Offset, relative to the empty cell, of the tile that slides this way.
    // A tile moving up sits one row below the empty slot, and so on.
    fn tile_offset(self) -> (isize, isize) {
        match self {
            Dir::Up => (1, 0),
            Dir::Down => (-1, 0),
            Dir::Left => (0, 1),
            Dir::Right => (0, -1),
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Dir::Up => "up",
            Dir::Down => "down",
            Dir::Left => "left",
            Dir::Right => "right",
        };
        write!(f, "{}", s)
    }
}

/// Final stats carried by a win notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinReport {
    /// Player moves since the last scramble or reset.
    pub moves: u32,
    /// Wall-clock time since the last scramble or reset.
    pub elapsed: Duration,
}

/// What a player move request did to the board.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The position was out of bounds or not adjacent to the empty cell.
    /// Nothing changed.
    Rejected,
    /// The tile at `from` slid into the empty slot at `to`.
    Moved { from: Pos, to: Pos },
    /// The slide completed the puzzle.
    Won(WinReport),
}

#[derive(Clone)]
pub struct Puzzle {
    size: usize,
    board: Vec<Vec<u32>>,
    empty: Pos,
    moves: u32,
    started: Instant,
}

impl Puzzle {
    /// Creates a solved `size` x `size` board with the empty cell at the
    /// bottom-right corner.
    ///
    /// # Panics
    /// Panics if `size < 2`; smaller boards have no legal moves.
    pub fn new(size: usize) -> Self {
        assert!(size >= 2, "board must be at least 2x2");

        let mut board = Vec::with_capacity(size);
        let mut value = 1;
        for row in 0..size {
            let mut cells = Vec::with_capacity(size);
            for col in 0..size {
                if row == size - 1 && col == size - 1 {
                    cells.push(EMPTY);
                } else {
                    cells.push(value);
                    value += 1;
                }
            }
            board.push(cells);
        }

        Self {
            size,
            board,
            empty: Pos::new(size - 1, size - 1),
            moves: 0,
            started: Instant::now(),
        }
    }

    /// Builds a board from an explicit arrangement.
    ///
    /// The grid must be square with side at least 2, hold each value in
    /// `1..size*size` exactly once, and mark exactly one cell empty with 0.
    pub fn from_grid(board: Vec<Vec<u32>>) -> Result<Self, String> {
        let size = board.len();
        if size < 2 {
            return Err(format!("board must be at least 2x2, got {} rows", size));
        }
        if board.iter().any(|row| row.len() != size) {
            return Err(format!("board must be square with {} columns per row", size));
        }

        let cell_count = size * size;
        let mut seen = vec![false; cell_count];
        let mut empty = None;
        for (row, cells) in board.iter().enumerate() {
            for (col, &value) in cells.iter().enumerate() {
                let value = value as usize;
                if value >= cell_count {
                    return Err(format!(
                        "tile {} does not fit a {}x{} board",
                        value, size, size
                    ));
                }
                if seen[value] {
                    return Err(format!("tile {} appears more than once", value));
                }
                seen[value] = true;
                if value == EMPTY as usize {
                    empty = Some(Pos::new(row, col));
                }
            }
        }
        let empty = empty.ok_or_else(|| "board has no empty cell".to_string())?;

        Ok(Self {
            size,
            board,
            empty,
            moves: 0,
            started: Instant::now(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Player moves since the last scramble or reset. Shuffle moves are
    /// never counted.
    pub fn move_count(&self) -> u32 {
        self.moves
    }

    /// Wall-clock time since the last scramble or reset.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn empty_pos(&self) -> Pos {
        self.empty
    }

    /// Tile value at `pos`; 0 marks the empty cell.
    ///
    /// # Panics
    /// Panics if `pos` is out of bounds.
    pub fn tile(&self, pos: Pos) -> u32 {
        self.board[pos.row][pos.col]
    }

    /// Rows of the board, top to bottom, for renderers to walk.
    pub fn rows(&self) -> &[Vec<u32>] {
        &self.board
    }

    /// True iff `pos` is one cell away from the empty slot along a single
    /// axis. Diagonal neighbours and the empty cell itself do not qualify.
    pub fn is_adjacent(&self, pos: Pos) -> bool {
        if pos.row >= self.size || pos.col >= self.size {
            return false;
        }
        pos.row.abs_diff(self.empty.row) + pos.col.abs_diff(self.empty.col) == 1
    }

    /// The position of the tile that would travel in `dir`, if the board
    /// has one there.
    pub fn sliding_tile(&self, dir: Dir) -> Option<Pos> {
        let (dr, dc) = dir.tile_offset();
        let row = self.empty.row as isize + dr;
        let col = self.empty.col as isize + dc;
        if row >= 0 && row < self.size as isize && col >= 0 && col < self.size as isize {
            Some(Pos::new(row as usize, col as usize))
        } else {
            None
        }
    }

    /// In-bounds neighbours of the empty slot, in the fixed order up, down,
    /// left, right (by tile travel direction). A corner yields 2, an edge 3,
    /// the interior 4; never fewer than 2 on a legal board.
    pub fn valid_moves(&self) -> Vec<Pos> {
        Dir::ALL
            .iter()
            .filter_map(|&dir| self.sliding_tile(dir))
            .collect()
    }

    /// Slides the tile at `pos` into the empty slot as a player move.
    ///
    /// A request that is out of bounds or not adjacent to the empty cell is
    /// rejected without touching the board, the empty position, or the move
    /// counter. A successful slide bumps the counter and reports a win when
    /// it produces the solved arrangement.
    pub fn move_tile(&mut self, pos: Pos) -> MoveOutcome {
        if !self.is_adjacent(pos) {
            return MoveOutcome::Rejected;
        }

        let dest = self.empty;
        self.swap_into_empty(pos);
        self.moves += 1;

        if self.is_solved() {
            MoveOutcome::Won(WinReport {
                moves: self.moves,
                elapsed: self.started.elapsed(),
            })
        } else {
            MoveOutcome::Moved { from: pos, to: dest }
        }
    }

    /// Slides whichever tile travels in `dir`, for keyboard-driven callers.
    pub fn move_dir(&mut self, dir: Dir) -> MoveOutcome {
        match self.sliding_tile(dir) {
            Some(pos) => self.move_tile(pos),
            None => MoveOutcome::Rejected,
        }
    }

    // The one mutation primitive: tile at `pos` takes the empty slot, `pos`
    // becomes the empty slot. Caller has already validated adjacency.
    fn swap_into_empty(&mut self, pos: Pos) {
        self.board[self.empty.row][self.empty.col] = self.board[pos.row][pos.col];
        self.board[pos.row][pos.col] = EMPTY;
        self.empty = pos;
    }

    /// Scrambles with the thread-local RNG. See [`Puzzle::shuffle_with`].
    pub fn shuffle(&mut self, steps: usize) {
        self.shuffle_with(&mut thread_rng(), steps);
    }

    /// Scrambles by walking `steps` uniformly random legal moves from the
    /// current arrangement.
    ///
    /// Because every step is a legal slide, the result stays reachable from
    /// the solved state and therefore solvable, which a random permutation
    /// of the tiles would not guarantee. Shuffle moves bypass the move
    /// counter and win detection; the counter and clock are reset up front
    /// so the next game starts clean.
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R, steps: usize) {
        self.reset_stats();
        for _ in 0..steps {
            let moves = self.valid_moves();
            // Non-empty for any board of size >= 2.
            if let Some(&pos) = moves.choose(rng) {
                self.swap_into_empty(pos);
            }
        }
    }

    /// Rebuilds the solved arrangement and resets the counter and clock.
    pub fn reset(&mut self) {
        *self = Puzzle::new(self.size);
    }

    fn reset_stats(&mut self) {
        self.moves = 0;
        self.started = Instant::now();
    }

    /// True iff every tile sits at its home cell, i.e. the value at
    /// (row, col) is `row * size + col + 1` and the empty cell is last.
    pub fn is_solved(&self) -> bool {
        let mut expected = 1;
        for row in 0..self.size {
            for col in 0..self.size {
                if row == self.size - 1 && col == self.size - 1 {
                    return self.board[row][col] == EMPTY;
                }
                if self.board[row][col] != expected {
                    return false;
                }
                expected += 1;
            }
        }
        unreachable!("loop returns at the bottom-right cell")
    }

    /// Inversion-parity test for whether the current arrangement can reach
    /// the solved one. Scrambles produced by [`Puzzle::shuffle_with`] always
    /// pass; arbitrary grids from [`Puzzle::from_grid`] may not.
    pub fn is_solvable(&self) -> bool {
        let flat: Vec<u32> = self
            .board
            .iter()
            .flat_map(|row| row.iter().copied())
            .collect();
        let inversions = count_inversions(&flat);

        if self.size % 2 == 1 {
            // Odd boards: solvable iff the inversion count is even.
            inversions % 2 == 0
        } else {
            // Even boards: the empty cell's row enters the parity.
            (inversions + self.empty.row) % 2 == 1
        }
    }
}

fn count_inversions(flat: &[u32]) -> usize {
    flat.iter()
        .enumerate()
        .filter(|&(_, &value)| value != EMPTY)
        .map(|(i, &value)| {
            flat[i + 1..]
                .iter()
                .filter(|&&later| later != EMPTY && later < value)
                .count()
        })
        .sum()
}

impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.board {
            for &value in row {
                if value == EMPTY {
                    write!(f, " . ")?;
                } else {
                    write!(f, "{:2} ", value)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn near_win_4x4() -> Puzzle {
        // Solved except tile 12 waits below the empty slot.
        Puzzle::from_grid(vec![
            vec![1, 2, 3, 4],
            vec![5, 6, 7, 8],
            vec![9, 10, 11, 0],
            vec![13, 14, 15, 12],
        ])
        .unwrap()
    }

    #[test]
    fn new_board_is_solved() {
        let puzzle = Puzzle::new(4);
        assert!(puzzle.is_solved());
        assert_eq!(puzzle.empty_pos(), Pos::new(3, 3));
        assert_eq!(puzzle.move_count(), 0);
    }

    #[test]
    fn new_board_has_ascending_tiles() {
        let puzzle = Puzzle::new(4);
        for row in 0..4 {
            for col in 0..4 {
                let expected = if row == 3 && col == 3 {
                    0
                } else {
                    (row * 4 + col + 1) as u32
                };
                assert_eq!(puzzle.tile(Pos::new(row, col)), expected);
            }
        }
    }

    #[test]
    fn adjacency_is_orthogonal_distance_one() {
        // Empty in the interior at (1, 1).
        let puzzle =
            Puzzle::from_grid(vec![vec![1, 2, 3], vec![4, 0, 5], vec![6, 7, 8]]).unwrap();

        assert!(puzzle.is_adjacent(Pos::new(0, 1)));
        assert!(puzzle.is_adjacent(Pos::new(2, 1)));
        assert!(puzzle.is_adjacent(Pos::new(1, 0)));
        assert!(puzzle.is_adjacent(Pos::new(1, 2)));

        // Diagonals, self, distance two, out of bounds.
        assert!(!puzzle.is_adjacent(Pos::new(0, 0)));
        assert!(!puzzle.is_adjacent(Pos::new(2, 2)));
        assert!(!puzzle.is_adjacent(Pos::new(1, 1)));
        assert!(!puzzle.is_adjacent(Pos::new(1, 3)));
        assert!(!puzzle.is_adjacent(Pos::new(3, 1)));
    }

    #[test]
    fn valid_moves_at_corner_edge_and_interior() {
        let corner =
            Puzzle::from_grid(vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]]).unwrap();
        let mut moves = corner.valid_moves();
        moves.sort_by_key(|p| (p.row, p.col));
        assert_eq!(moves, vec![Pos::new(0, 1), Pos::new(1, 0)]);

        let edge =
            Puzzle::from_grid(vec![vec![1, 0, 2], vec![3, 4, 5], vec![6, 7, 8]]).unwrap();
        assert_eq!(edge.valid_moves().len(), 3);

        let interior =
            Puzzle::from_grid(vec![vec![1, 2, 3], vec![4, 0, 5], vec![6, 7, 8]]).unwrap();
        assert_eq!(interior.valid_moves().len(), 4);
    }

    #[test]
    fn valid_moves_order_is_stable() {
        let puzzle =
            Puzzle::from_grid(vec![vec![1, 2, 3], vec![4, 0, 5], vec![6, 7, 8]]).unwrap();
        // Up, down, left, right by tile travel direction: the up-travelling
        // tile is below the empty slot.
        assert_eq!(
            puzzle.valid_moves(),
            vec![
                Pos::new(2, 1),
                Pos::new(0, 1),
                Pos::new(1, 2),
                Pos::new(1, 0),
            ]
        );
    }

    #[test]
    fn move_swaps_tile_into_empty_slot() {
        let mut puzzle = Puzzle::new(4);
        let outcome = puzzle.move_tile(Pos::new(2, 3));

        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                from: Pos::new(2, 3),
                to: Pos::new(3, 3),
            }
        );
        assert_eq!(puzzle.empty_pos(), Pos::new(2, 3));
        assert_eq!(puzzle.tile(Pos::new(3, 3)), 12);
        assert!(!puzzle.is_solved());
        assert_eq!(puzzle.move_count(), 1);
    }

    #[test]
    fn move_changes_no_other_cells() {
        let mut puzzle = Puzzle::new(4);
        let before = puzzle.rows().to_vec();
        let _ = puzzle.move_tile(Pos::new(3, 2));

        for row in 0..4 {
            for col in 0..4 {
                if (row, col) == (3, 2) || (row, col) == (3, 3) {
                    continue;
                }
                assert_eq!(puzzle.tile(Pos::new(row, col)), before[row][col]);
            }
        }
    }

    #[test]
    fn rejected_move_changes_nothing() {
        let mut puzzle = Puzzle::new(4);
        let before = puzzle.rows().to_vec();

        // Not adjacent, diagonal, the empty cell itself, out of bounds.
        for pos in [
            Pos::new(0, 0),
            Pos::new(2, 2),
            Pos::new(3, 3),
            Pos::new(4, 3),
            Pos::new(3, 7),
        ] {
            assert_eq!(puzzle.move_tile(pos), MoveOutcome::Rejected);
        }

        assert_eq!(puzzle.rows(), &before[..]);
        assert_eq!(puzzle.empty_pos(), Pos::new(3, 3));
        assert_eq!(puzzle.move_count(), 0);
    }

    #[test]
    fn move_count_tracks_player_moves_only() {
        let mut puzzle = Puzzle::new(4);
        let _ = puzzle.move_tile(Pos::new(3, 2));
        let _ = puzzle.move_tile(Pos::new(3, 3));
        assert_eq!(puzzle.move_count(), 2);

        let mut rng = SmallRng::seed_from_u64(7);
        puzzle.shuffle_with(&mut rng, 50);
        assert_eq!(puzzle.move_count(), 0);
    }

    #[test]
    fn single_shuffle_step_moves_a_neighbour_into_the_corner() {
        let mut rng = SmallRng::seed_from_u64(99);
        for _ in 0..20 {
            let mut puzzle = Puzzle::new(4);
            puzzle.shuffle_with(&mut rng, 1);
            let empty = puzzle.empty_pos();
            assert!(
                empty == Pos::new(2, 3) || empty == Pos::new(3, 2),
                "empty landed at {}",
                empty
            );
            assert_eq!(puzzle.move_count(), 0);
        }
    }

    #[test]
    fn shuffled_boards_stay_solvable() {
        for seed in 0..16 {
            let mut puzzle = Puzzle::new(4);
            let mut rng = SmallRng::seed_from_u64(seed);
            puzzle.shuffle_with(&mut rng, DEFAULT_SHUFFLE_MOVES);
            assert!(puzzle.is_solvable(), "seed {} broke solvability", seed);
        }
    }

    #[test]
    fn odd_walk_on_2x2_stays_silent_and_uncounted() {
        // On a 2x2 board an odd-length walk cannot end solved, but it may
        // pass through the solved grid mid-walk without reporting a win.
        let mut puzzle = Puzzle::new(2);
        let mut rng = SmallRng::seed_from_u64(3);
        puzzle.shuffle_with(&mut rng, 101);
        assert_eq!(puzzle.move_count(), 0);
        assert!(puzzle.is_solvable());
    }

    #[test]
    fn is_solved_rejects_near_misses() {
        assert!(Puzzle::new(4).is_solved());

        // Tiles 14 and 15 swapped.
        let swapped = Puzzle::from_grid(vec![
            vec![1, 2, 3, 4],
            vec![5, 6, 7, 8],
            vec![9, 10, 11, 12],
            vec![13, 15, 14, 0],
        ])
        .unwrap();
        assert!(!swapped.is_solved());

        // Right tile order, empty cell in the wrong place.
        assert!(!near_win_4x4().is_solved());
    }

    #[test]
    fn winning_move_reports_final_stats() {
        let mut puzzle = near_win_4x4();
        match puzzle.move_tile(Pos::new(3, 3)) {
            MoveOutcome::Won(report) => assert_eq!(report.moves, 1),
            other => panic!("expected a win, got {:?}", other),
        }
        assert!(puzzle.is_solved());
    }

    #[test]
    fn move_dir_slides_the_matching_tile() {
        let mut puzzle = Puzzle::new(4);

        // Empty at (3, 3): no tile below it can travel up, none to its
        // right can travel left.
        assert_eq!(puzzle.move_dir(Dir::Up), MoveOutcome::Rejected);
        assert_eq!(puzzle.move_dir(Dir::Left), MoveOutcome::Rejected);

        // The down-travelling tile sits above the empty slot.
        let outcome = puzzle.move_dir(Dir::Down);
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                from: Pos::new(2, 3),
                to: Pos::new(3, 3),
            }
        );
        assert_eq!(puzzle.empty_pos(), Pos::new(2, 3));
    }

    #[test]
    fn reset_restores_the_solved_board() {
        let mut puzzle = Puzzle::new(4);
        let mut rng = SmallRng::seed_from_u64(11);
        puzzle.shuffle_with(&mut rng, DEFAULT_SHUFFLE_MOVES);
        let _ = puzzle.move_dir(Dir::Up);

        puzzle.reset();
        assert!(puzzle.is_solved());
        assert_eq!(puzzle.move_count(), 0);
        assert_eq!(puzzle.empty_pos(), Pos::new(3, 3));
    }

    #[test]
    fn from_grid_rejects_invalid_arrangements() {
        assert!(Puzzle::from_grid(vec![vec![0]]).is_err());
        assert!(Puzzle::from_grid(vec![vec![0, 1], vec![2]]).is_err());
        assert!(Puzzle::from_grid(vec![vec![0, 1], vec![1, 2]]).is_err());
        assert!(Puzzle::from_grid(vec![vec![0, 1], vec![2, 9]]).is_err());
        assert!(Puzzle::from_grid(vec![vec![3, 1], vec![2, 4]]).is_err());
    }

    #[test]
    fn from_grid_finds_the_empty_cell() {
        let puzzle = Puzzle::from_grid(vec![vec![1, 0], vec![3, 2]]).unwrap();
        assert_eq!(puzzle.empty_pos(), Pos::new(0, 1));
    }

    #[test]
    fn solvability_parity_matches_known_cases() {
        assert!(Puzzle::new(4).is_solvable());
        assert!(Puzzle::new(3).is_solvable());

        // The classic unsolvable arrangement: 14 and 15 transposed.
        let swapped = Puzzle::from_grid(vec![
            vec![1, 2, 3, 4],
            vec![5, 6, 7, 8],
            vec![9, 10, 11, 12],
            vec![13, 15, 14, 0],
        ])
        .unwrap();
        assert!(!swapped.is_solvable());
    }

    #[test]
    fn display_marks_the_empty_cell() {
        let rendered = Puzzle::new(2).to_string();
        assert!(rendered.contains('1'));
        assert!(rendered.contains('.'));
        assert_eq!(rendered.lines().count(), 2);
    }
}
