use rand::Rng;
use std::fmt;

/// A tile value. Always a power of two >= 2 when present on a board.
pub type Tile = u32;
pub type Score = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// The order moves are tried in. Earlier moves win ties.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];
}

/// Borrowed, read-only snapshot of a row-major grid.
#[derive(Debug, Clone, Copy)]
pub struct BoardView<'a> {
    cells: &'a [Option<Tile>],
    columns: usize,
}

impl<'a> BoardView<'a> {
    pub fn new(cells: &'a [Option<Tile>], columns: usize) -> Self {
        assert!(
            columns > 0 && !cells.is_empty() && cells.len() % columns == 0,
            "a board of {} cells cannot be laid out in {} columns",
            cells.len(),
            columns
        );
        BoardView { cells, columns }
    }

    pub fn cells(&self) -> &'a [Option<Tile>] {
        self.cells
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.cells.len() / self.columns
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Value at (row, col) with empty cells read as 0.
    #[inline]
    pub fn value(&self, row: usize, col: usize) -> Tile {
        self.cells[row * self.columns + col].unwrap_or(0)
    }

    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_none()).count()
    }

    pub fn highest_tile(&self) -> Tile {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// The board-simulation surface the decision engine works against.
///
/// The search never touches the caller's state: it clones once per node and
/// uses `load_from` to reset that buffer between sibling branches.
pub trait Simulation: Clone {
    fn board(&self) -> &[Option<Tile>];
    fn num_columns(&self) -> usize;
    fn score(&self) -> Score;
    fn best_tile(&self) -> Tile;
    fn is_alive(&self) -> bool;

    /// Slide and merge in `direction` without spawning a tile.
    /// Returns true if the board changed.
    fn shift(&mut self, direction: Move) -> bool;

    /// Overwrite board, score and liveness with a copy of `other`.
    fn load_from(&mut self, other: &Self);

    fn set_tile(&mut self, index: usize, value: Option<Tile>);

    fn num_cells(&self) -> usize {
        self.board().len()
    }

    fn tile(&self, index: usize) -> Option<Tile> {
        self.board()[index]
    }

    fn view(&self) -> BoardView<'_> {
        BoardView::new(self.board(), self.num_columns())
    }
}

/// A rows x columns 2048 game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    cells: Vec<Option<Tile>>,
    columns: usize,
    score: Score,
    alive: bool,
}

impl GameState {
    /// Start a new game with two random tiles.
    pub fn new<R: Rng + ?Sized>(rows: usize, columns: usize, rng: &mut R) -> Self {
        let mut state = GameState::from_cells(vec![None; rows * columns], columns, 0);
        state.insert_random_tile(rng);
        state.insert_random_tile(rng);
        state.alive = state.has_legal_move();
        state
    }

    /// Build a position from explicit cells.
    pub fn from_cells(cells: Vec<Option<Tile>>, columns: usize, score: Score) -> Self {
        BoardView::new(&cells, columns);
        debug_assert!(
            cells.iter().flatten().all(|&t| t >= 2 && t.is_power_of_two()),
            "tiles must be powers of two"
        );
        let mut state = GameState {
            cells,
            columns,
            score,
            alive: false,
        };
        state.alive = state.has_legal_move();
        state
    }

    /// Like [`GameState::from_cells`] but reads 0 as an empty cell.
    pub fn from_values(values: &[Tile], columns: usize, score: Score) -> Self {
        let cells = values
            .iter()
            .map(|&v| if v == 0 { None } else { Some(v) })
            .collect();
        GameState::from_cells(cells, columns, score)
    }

    pub fn rows(&self) -> usize {
        self.cells.len() / self.columns
    }

    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_none()).count()
    }

    /// Play a real move: shift, then spawn a tile if the board changed.
    pub fn make_move<R: Rng + ?Sized>(&mut self, direction: Move, rng: &mut R) -> bool {
        let changed = self.shift(direction);
        if changed {
            self.insert_random_tile(rng);
        }
        self.alive = self.has_legal_move();
        changed
    }

    /// Place a 2 (90%) or 4 (10%) in a uniformly chosen empty cell.
    /// Returns the index filled, or `None` on a full board.
    pub fn insert_random_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        let empty = self.count_empty();
        if empty == 0 {
            return None;
        }
        let index = rng.gen_range(0..empty);
        let tile = generate_random_tile(rng);
        let slot = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .nth(index)
            .map(|(slot, _)| slot)?;
        self.cells[slot] = Some(tile);
        Some(slot)
    }

    pub fn has_legal_move(&self) -> bool {
        Move::ALL.iter().any(|&direction| {
            let mut probe = self.clone();
            probe.shift(direction)
        })
    }

    fn line_count(&self, direction: Move) -> usize {
        match direction {
            Move::Left | Move::Right => self.rows(),
            Move::Up | Move::Down => self.columns,
        }
    }

    // Cell indices of one line, ordered from the edge tiles slide toward.
    fn line_indices(&self, direction: Move, line: usize) -> Vec<usize> {
        let columns = self.columns;
        match direction {
            Move::Left => (0..columns).map(|c| line * columns + c).collect(),
            Move::Right => (0..columns).rev().map(|c| line * columns + c).collect(),
            Move::Up => (0..self.rows()).map(|r| r * columns + line).collect(),
            Move::Down => (0..self.rows()).rev().map(|r| r * columns + line).collect(),
        }
    }

    fn shift_line(&mut self, indices: &[usize]) -> bool {
        let mut tiles: Vec<Option<Tile>> = indices.iter().map(|&i| self.cells[i]).collect();
        let mut gained = 0;
        for i in 0..tiles.len() {
            gained += calculate_left_shift(&mut tiles[i..]);
        }
        let mut changed = false;
        for (&idx, tile) in indices.iter().zip(tiles) {
            if self.cells[idx] != tile {
                self.cells[idx] = tile;
                changed = true;
            }
        }
        self.score += gained;
        changed
    }
}

impl Simulation for GameState {
    fn board(&self) -> &[Option<Tile>] {
        &self.cells
    }

    fn num_columns(&self) -> usize {
        self.columns
    }

    fn score(&self) -> Score {
        self.score
    }

    fn best_tile(&self) -> Tile {
        self.view().highest_tile()
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn shift(&mut self, direction: Move) -> bool {
        let mut changed = false;
        for line in 0..self.line_count(direction) {
            let indices = self.line_indices(direction, line);
            changed |= self.shift_line(&indices);
        }
        changed
    }

    fn load_from(&mut self, other: &Self) {
        self.cells.clone_from(&other.cells);
        self.columns = other.columns;
        self.score = other.score;
        self.alive = other.alive;
    }

    fn set_tile(&mut self, index: usize, value: Option<Tile>) {
        self.cells[index] = value;
    }
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> Tile {
    if rng.gen_range(0..10) < 9 {
        2
    } else {
        4
    }
}

// Pulls the first tile of `slice` to the front, merging it with the next tile
// if they are equal. Returns the value created by a merge, or 0.
fn calculate_left_shift(slice: &mut [Option<Tile>]) -> Score {
    let mut acc = None;
    let mut merged = 0;
    for idx in 0..slice.len() {
        match (acc, slice[idx]) {
            (_, None) => {}
            (None, Some(val)) => {
                slice[idx] = None;
                acc = Some(val);
            }
            (Some(held), Some(val)) if held == val => {
                slice[idx] = None;
                acc = Some(held * 2);
                merged = Score::from(held * 2);
                break;
            }
            (Some(_), Some(_)) => break,
        }
    }
    slice[0] = acc;
    merged
}

fn format_val(val: &Option<Tile>) -> String {
    match val {
        None => String::from("       "),
        Some(x) => {
            let mut x = x.to_string();
            while x.len() < 7 {
                match x.len() {
                    6 => x = format!(" {}", x),
                    _ => x = format!(" {} ", x),
                }
            }
            x
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = "-".repeat(8 * self.columns);
        for (row_idx, row) in self.cells.chunks(self.columns).enumerate() {
            if row_idx > 0 {
                writeln!(f, "{}", separator)?;
            }
            let row: Vec<_> = row.iter().map(format_val).collect();
            writeln!(f, "{}", row.join("|"))?;
        }
        Ok(())
    }
}
