use serde::{Deserialize, Serialize};
use std::fmt;

/// A (word, clue) pair for one puzzle entry.
///
/// The word is always uppercase ASCII letters; construct through
/// [`WordClue::new`], which normalises and rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordClue {
    word: String,
    clue: String,
}

impl WordClue {
    /// 去除空白與連字號後轉大寫；含非字母字元時回傳 None。
    /// 提示中的換行與連續空白合併成單一空格
    pub fn new(word: &str, clue: &str) -> Option<Self> {
        let word: String = word
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect::<String>()
            .to_ascii_uppercase();

        if word.is_empty() || !word.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        Some(Self {
            word,
            clue: clue.split_whitespace().collect::<Vec<_>>().join(" "),
        })
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn clue(&self) -> &str {
        &self.clue
    }

    pub fn len(&self) -> usize {
        self.word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word.is_empty()
    }
}

/// Unfiltered pair as returned by a clue source.
///
/// Field names match the questions-file format (`question`/`answer`);
/// `word`/`clue` are accepted as well since models use both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawClue {
    #[serde(alias = "word")]
    pub answer: String,
    #[serde(alias = "clue")]
    pub question: String,
}

impl RawClue {
    pub fn new(answer: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            question: question.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    /// (row, col) step for one letter.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Across => (0, 1),
            Direction::Down => (1, 0),
        }
    }

    pub fn perpendicular(self) -> Self {
        match self {
            Direction::Across => Direction::Down,
            Direction::Down => Direction::Across,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => write!(f, "ACROSS"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedWord {
    pub word: WordClue,
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub number: u32,
}

impl PlacedWord {
    /// Grid coordinates covered by this word, in reading order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (dr, dc) = match self.direction {
            Direction::Across => (0, 1),
            Direction::Down => (1, 0),
        };
        (0..self.word.len()).map(move |i| (self.row + i * dr, self.col + i * dc))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub letter: char,
    pub number: Option<u32>,
    /// Indices into the placed-word list of words starting here.
    pub starts: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<Cell>>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells[row * self.cols + col].as_ref()
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Option<Cell>> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get_mut(row * self.cols + col)
    }

    pub fn is_blocked(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_none()
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

#[derive(Debug, Clone)]
pub struct LayoutResult {
    pub grid: Grid,
    pub placed: Vec<PlacedWord>,
    pub dropped: Vec<WordClue>,
}

impl LayoutResult {
    pub fn entries(&self, direction: Direction) -> Vec<&PlacedWord> {
        let mut entries: Vec<&PlacedWord> = self
            .placed
            .iter()
            .filter(|p| p.direction == direction)
            .collect();
        entries.sort_by_key(|p| p.number);
        entries
    }
}

#[derive(Debug, Clone)]
pub struct RenderedPuzzle {
    pub title: String,
    pub topic: String,
    pub grid_text: String,
    pub key_text: String,
    pub clues_text: String,
    pub json: String,
    pub csv: String,
}
