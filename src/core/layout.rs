//! Grid layout engine.
//!
//! Words are placed greedily, longest first, on an unbounded sparse board.
//! Each word tries every perpendicular crossing with letters already on the
//! board and keeps the one with the most intersections. Words that do not
//! fit get one more chance after the rest are placed; after that they are
//! dropped. The board is then cropped to its bounding box and numbered.

use crate::config::toml_config::LayoutConfig;
use crate::domain::model::{Cell, Direction, Grid, LayoutResult, PlacedWord, WordClue};
use crate::utils::error::LayoutError;
use std::collections::BTreeMap;

type Pos = (i32, i32);

#[derive(Debug, Clone, Copy)]
struct Slot {
    letter: char,
    across: bool,
    down: bool,
}

impl Slot {
    fn used_by(&self, direction: Direction) -> bool {
        match direction {
            Direction::Across => self.across,
            Direction::Down => self.down,
        }
    }
}

#[derive(Debug, Clone)]
struct Placement {
    word: WordClue,
    row: i32,
    col: i32,
    direction: Direction,
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_row: i32,
    min_col: i32,
    max_row: i32,
    max_col: i32,
}

impl Bounds {
    fn extend(self, row: i32, col: i32) -> Self {
        Self {
            min_row: self.min_row.min(row),
            min_col: self.min_col.min(col),
            max_row: self.max_row.max(row),
            max_col: self.max_col.max(col),
        }
    }

    fn height(&self) -> usize {
        (self.max_row - self.min_row + 1) as usize
    }

    fn width(&self) -> usize {
        (self.max_col - self.min_col + 1) as usize
    }
}

#[derive(Debug, Default)]
struct Board {
    slots: BTreeMap<Pos, Slot>,
    placements: Vec<Placement>,
    bounds: Option<Bounds>,
}

impl Board {
    fn occupied(&self, pos: Pos) -> bool {
        self.slots.contains_key(&pos)
    }

    /// 檢查能否放置；可放置時回傳交叉格數
    fn check(&self, word: &str, row: i32, col: i32, direction: Direction) -> Option<usize> {
        let (dr, dc) = direction.delta();
        let (pr, pc) = direction.perpendicular().delta();
        let len = word.len() as i32;

        // 字首前與字尾後必須留空
        if self.occupied((row - dr, col - dc)) || self.occupied((row + len * dr, col + len * dc)) {
            return None;
        }

        let mut crossings = 0;
        for (i, ch) in word.chars().enumerate() {
            let i = i as i32;
            let pos = (row + i * dr, col + i * dc);
            match self.slots.get(&pos) {
                Some(slot) => {
                    if slot.letter != ch || slot.used_by(direction) {
                        return None;
                    }
                    crossings += 1;
                }
                None => {
                    if self.occupied((pos.0 + pr, pos.1 + pc))
                        || self.occupied((pos.0 - pr, pos.1 - pc))
                    {
                        return None;
                    }
                }
            }
        }
        Some(crossings)
    }

    fn bounds_with(&self, len: usize, row: i32, col: i32, direction: Direction) -> Bounds {
        let (dr, dc) = direction.delta();
        let last = len as i32 - 1;
        let start = Bounds {
            min_row: row,
            min_col: col,
            max_row: row + last * dr,
            max_col: col + last * dc,
        };
        match self.bounds {
            Some(b) => b.extend(start.min_row, start.min_col).extend(start.max_row, start.max_col),
            None => start,
        }
    }

    fn place(&mut self, word: &WordClue, row: i32, col: i32, direction: Direction) {
        let (dr, dc) = direction.delta();
        for (i, ch) in word.word().chars().enumerate() {
            let i = i as i32;
            let slot = self.slots.entry((row + i * dr, col + i * dc)).or_insert(Slot {
                letter: ch,
                across: false,
                down: false,
            });
            match direction {
                Direction::Across => slot.across = true,
                Direction::Down => slot.down = true,
            }
        }
        self.bounds = Some(self.bounds_with(word.len(), row, col, direction));
        self.placements.push(Placement {
            word: word.clone(),
            row,
            col,
            direction,
        });
    }
}

pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Lays out `words` in the given order; callers sort longest-first.
    pub fn layout(&self, words: &[WordClue]) -> Result<LayoutResult, LayoutError> {
        let mut board = Board::default();
        let mut deferred = Vec::new();

        for word in words {
            if !self.try_place(&mut board, word) {
                tracing::debug!("⏳ Deferring '{}' until more words are placed", word.word());
                deferred.push(word.clone());
            }
        }

        let mut dropped = Vec::new();
        for word in deferred {
            if self.try_place(&mut board, &word) {
                continue;
            }
            if self.config.allow_disjoint && self.place_disjoint(&mut board, &word) {
                continue;
            }
            tracing::warn!("🗑️ Dropping '{}': no valid position on the grid", word.word());
            dropped.push(word);
        }

        if board.placements.len() < self.config.min_words {
            return Err(LayoutError::TooFewWords {
                placed: board.placements.len(),
                required: self.config.min_words,
                dropped: dropped.len(),
            });
        }

        let (grid, placed) = finalize(&board);
        tracing::info!(
            "🧩 Placed {} of {} words on a {}x{} grid",
            placed.len(),
            words.len(),
            grid.rows(),
            grid.cols()
        );

        Ok(LayoutResult {
            grid,
            placed,
            dropped,
        })
    }

    fn within_limits(&self, bounds: &Bounds) -> bool {
        bounds.height() <= self.config.max_rows && bounds.width() <= self.config.max_cols
    }

    fn try_place(&self, board: &mut Board, word: &WordClue) -> bool {
        if board.placements.is_empty() {
            let bounds = board.bounds_with(word.len(), 0, 0, Direction::Across);
            if !self.within_limits(&bounds) {
                return false;
            }
            board.place(word, 0, 0, Direction::Across);
            return true;
        }

        match self.best_crossing(board, word) {
            Some((row, col, direction)) => {
                board.place(word, row, col, direction);
                tracing::debug!("📍 Placed '{}' {} at ({}, {})", word.word(), direction, row, col);
                true
            }
            None => false,
        }
    }

    fn best_crossing(&self, board: &Board, word: &WordClue) -> Option<(i32, i32, Direction)> {
        let mut best: Option<(usize, (i32, i32, Direction))> = None;
        let mut trials = 0;

        for (&(row, col), slot) in &board.slots {
            let direction = match (slot.across, slot.down) {
                (true, false) => Direction::Down,
                (false, true) => Direction::Across,
                _ => continue,
            };
            let (dr, dc) = direction.delta();

            for (i, ch) in word.word().chars().enumerate() {
                if ch != slot.letter {
                    continue;
                }
                if trials >= self.config.max_candidates {
                    return best.map(|(_, candidate)| candidate);
                }
                trials += 1;

                let i = i as i32;
                let (start_row, start_col) = (row - i * dr, col - i * dc);
                let Some(crossings) = board.check(word.word(), start_row, start_col, direction)
                else {
                    continue;
                };
                if crossings == 0 {
                    continue;
                }
                let bounds = board.bounds_with(word.len(), start_row, start_col, direction);
                if !self.within_limits(&bounds) {
                    continue;
                }
                if best.map_or(true, |(count, _)| crossings > count) {
                    best = Some((crossings, (start_row, start_col, direction)));
                }
            }
        }

        best.map(|(_, candidate)| candidate)
    }

    /// 放在目前範圍下方兩列，與其他字不相交
    fn place_disjoint(&self, board: &mut Board, word: &WordClue) -> bool {
        let Some(bounds) = board.bounds else {
            return false;
        };
        let (row, col) = (bounds.max_row + 2, bounds.min_col);
        if board.check(word.word(), row, col, Direction::Across).is_none() {
            return false;
        }
        if !self.within_limits(&board.bounds_with(word.len(), row, col, Direction::Across)) {
            return false;
        }
        board.place(word, row, col, Direction::Across);
        tracing::debug!("📍 Placed '{}' disjoint at ({}, {})", word.word(), row, col);
        true
    }
}

/// Crops the board to its bounding box and assigns clue numbers.
fn finalize(board: &Board) -> (Grid, Vec<PlacedWord>) {
    let Some(bounds) = board.bounds else {
        return (Grid::new(0, 0), Vec::new());
    };

    let mut placed: Vec<PlacedWord> = board
        .placements
        .iter()
        .map(|p| PlacedWord {
            word: p.word.clone(),
            row: (p.row - bounds.min_row) as usize,
            col: (p.col - bounds.min_col) as usize,
            direction: p.direction,
            number: 0,
        })
        .collect();

    // 依起始格由上而下、由左而右編號，同一格的橫向與縱向共用號碼
    let mut numbers: BTreeMap<(usize, usize), u32> = BTreeMap::new();
    for p in &placed {
        numbers.entry((p.row, p.col)).or_insert(0);
    }
    for (n, number) in numbers.values_mut().enumerate() {
        *number = n as u32 + 1;
    }
    for p in &mut placed {
        p.number = numbers[&(p.row, p.col)];
    }
    placed.sort_by_key(|p| (p.number, p.direction));

    let mut grid = Grid::new(bounds.height(), bounds.width());
    for (index, p) in placed.iter().enumerate() {
        for (i, (row, col)) in p.cells().enumerate() {
            let letter = p.word.word().as_bytes()[i] as char;
            if let Some(cell) = grid.get_mut(row, col) {
                let cell = cell.get_or_insert_with(|| Cell {
                    letter,
                    number: None,
                    starts: Vec::new(),
                });
                if i == 0 {
                    cell.number = Some(p.number);
                    cell.starts.push(index);
                }
            }
        }
    }

    (grid, placed)
}
