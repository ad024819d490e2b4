use crate::config::toml_config::RenderConfig;
use crate::domain::model::{Direction, LayoutResult, PlacedWord, RenderedPuzzle};
use crate::utils::error::RenderError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::fmt::Write;

const BLOCK: &str = "  #";
const OPEN: &str = "  .";

#[derive(Debug, Serialize)]
struct PuzzleDocument<'a> {
    title: &'a str,
    topic: &'a str,
    generated_at: DateTime<Utc>,
    rows: usize,
    cols: usize,
    solution: Vec<String>,
    entries: Vec<Entry<'a>>,
    dropped: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct Entry<'a> {
    number: u32,
    direction: Direction,
    row: usize,
    col: usize,
    answer: &'a str,
    clue: &'a str,
    length: usize,
}

impl<'a> From<&'a PlacedWord> for Entry<'a> {
    fn from(p: &'a PlacedWord) -> Self {
        Self {
            number: p.number,
            direction: p.direction,
            row: p.row,
            col: p.col,
            answer: p.word.word(),
            clue: p.word.clue(),
            length: p.word.len(),
        }
    }
}

/// A clue line read back from rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClue {
    pub direction: Direction,
    pub number: u32,
    pub clue: String,
}

pub struct TextRenderer {
    config: RenderConfig,
}

impl TextRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, topic: &str, layout: &LayoutResult) -> Result<RenderedPuzzle, RenderError> {
        if layout.placed.is_empty() || layout.grid.filled_count() == 0 {
            return Err(RenderError::EmptyGrid);
        }

        let title = format!("{} - {}", self.config.title, topic);
        let clues_text = self.clue_lists(layout);

        let grid_text = format!(
            "{}\n\n{}\n{}",
            header(&title),
            self.draw(layout, false),
            clues_text
        );
        let key_text = format!(
            "{}\n\n{}",
            header(&format!("{} (answer key)", title)),
            self.draw(layout, true)
        );

        let json = self.json(&title, topic, layout)?;
        let csv = csv_word_list(layout)?;

        tracing::debug!(
            "Rendered {}x{} grid with {} clues",
            layout.grid.rows(),
            layout.grid.cols(),
            layout.placed.len()
        );

        Ok(RenderedPuzzle {
            title,
            topic: topic.to_string(),
            grid_text,
            key_text,
            clues_text,
            json,
            csv,
        })
    }

    fn draw(&self, layout: &LayoutResult, solution: bool) -> String {
        let grid = &layout.grid;
        let margin = self.config.margin;
        let width = grid.cols() + 2 * margin;
        let blocked_row = BLOCK.repeat(width);

        let mut out = String::new();
        for _ in 0..margin {
            out.push_str(&blocked_row);
            out.push('\n');
        }
        for row in 0..grid.rows() {
            out.push_str(&BLOCK.repeat(margin));
            for col in 0..grid.cols() {
                match grid.get(row, col) {
                    None => out.push_str(BLOCK),
                    Some(cell) if solution => {
                        let _ = write!(out, "{:>3}", cell.letter);
                    }
                    Some(cell) => match cell.number {
                        Some(n) => {
                            let _ = write!(out, "{:>3}", n);
                        }
                        None => out.push_str(OPEN),
                    },
                }
            }
            out.push_str(&BLOCK.repeat(margin));
            out.push('\n');
        }
        for _ in 0..margin {
            out.push_str(&blocked_row);
            out.push('\n');
        }
        out
    }

    fn clue_lists(&self, layout: &LayoutResult) -> String {
        let mut out = String::new();
        for direction in [Direction::Across, Direction::Down] {
            let entries = layout.entries(direction);
            if entries.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{}", direction);
            for p in entries {
                if self.config.show_lengths {
                    let _ = writeln!(out, "{:>4}. {} ({})", p.number, p.word.clue(), p.word.len());
                } else {
                    let _ = writeln!(out, "{:>4}. {}", p.number, p.word.clue());
                }
            }
            out.push('\n');
        }
        out
    }

    fn json(&self, title: &str, topic: &str, layout: &LayoutResult) -> Result<String, RenderError> {
        let grid = &layout.grid;
        let solution = (0..grid.rows())
            .map(|row| {
                (0..grid.cols())
                    .map(|col| grid.get(row, col).map_or('#', |c| c.letter))
                    .collect()
            })
            .collect();

        let document = PuzzleDocument {
            title,
            topic,
            generated_at: Utc::now(),
            rows: grid.rows(),
            cols: grid.cols(),
            solution,
            entries: layout.placed.iter().map(Entry::from).collect(),
            dropped: layout.dropped.iter().map(|w| w.word()).collect(),
        };

        serde_json::to_string_pretty(&document).map_err(|e| RenderError::Encoding(e.to_string()))
    }
}

fn header(title: &str) -> String {
    format!("{}\n{}", title, "=".repeat(title.chars().count()))
}

fn csv_word_list(layout: &LayoutResult) -> Result<String, RenderError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for p in &layout.placed {
        writer
            .serialize(Entry::from(p))
            .map_err(|e| RenderError::Encoding(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| RenderError::Encoding(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| RenderError::Encoding(e.to_string()))
}

/// Reads ACROSS/DOWN clue lists back into numbered entries, in text order.
pub fn parse_clue_list(text: &str) -> Vec<ParsedClue> {
    let Ok(entry) = Regex::new(r"^\s*(\d+)\.\s+(.*?)(?:\s+\(\d+\))?\s*$") else {
        return Vec::new();
    };

    let mut direction = None;
    let mut clues = Vec::new();
    for line in text.lines() {
        match line.trim() {
            "ACROSS" => direction = Some(Direction::Across),
            "DOWN" => direction = Some(Direction::Down),
            _ => {
                let (Some(dir), Some(caps)) = (direction, entry.captures(line)) else {
                    continue;
                };
                let Ok(number) = caps[1].parse() else {
                    continue;
                };
                clues.push(ParsedClue {
                    direction: dir,
                    number,
                    clue: caps[2].to_string(),
                });
            }
        }
    }
    clues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::LayoutConfig;
    use crate::core::layout::LayoutEngine;
    use crate::domain::model::{Grid, WordClue};

    fn sample_layout() -> LayoutResult {
        let words: Vec<WordClue> = [
            ("OCEAN", "A vast body of salt water."),
            ("CORAL", "Reef-building animal."),
            ("REEF", "Ridge near the surface of the sea."),
        ]
        .iter()
        .map(|(w, c)| WordClue::new(w, c).unwrap())
        .collect();

        LayoutEngine::new(LayoutConfig {
            min_words: 2,
            ..LayoutConfig::default()
        })
        .layout(&words)
        .unwrap()
    }

    #[test]
    fn test_render_empty_grid_fails() {
        let empty = LayoutResult {
            grid: Grid::new(0, 0),
            placed: vec![],
            dropped: vec![],
        };
        let err = TextRenderer::new(RenderConfig::default())
            .render("nothing", &empty)
            .unwrap_err();
        assert!(matches!(err, RenderError::EmptyGrid));
    }

    #[test]
    fn test_grid_dimensions_include_margin() {
        let layout = sample_layout();
        let puzzle = TextRenderer::new(RenderConfig::default())
            .render("ocean", &layout)
            .unwrap();

        let key_rows: Vec<&str> = puzzle.key_text.lines().skip(3).collect();
        assert_eq!(key_rows.len(), layout.grid.rows() + 2);
        assert_eq!(key_rows[0].len(), (layout.grid.cols() + 2) * 3);
        assert!(key_rows[0].chars().all(|c| c == '#' || c == ' '));
        assert!(puzzle.key_text.contains('O'));
        assert!(!puzzle.grid_text.contains("OCEAN"));
        assert_eq!(puzzle.title, "AI Crossword Generator - ocean");
    }

    #[test]
    fn test_numbers_appear_at_word_starts() {
        let layout = sample_layout();
        let config = RenderConfig {
            margin: 0,
            ..RenderConfig::default()
        };
        let puzzle = TextRenderer::new(config).render("ocean", &layout).unwrap();

        let rows: Vec<&str> = puzzle.grid_text.lines().skip(3).take(layout.grid.rows()).collect();
        for p in &layout.placed {
            let token = &rows[p.row][p.col * 3..p.col * 3 + 3];
            assert_eq!(token.trim(), p.number.to_string());
        }
    }

    #[test]
    fn test_clue_list_round_trip() {
        let layout = sample_layout();
        let puzzle = TextRenderer::new(RenderConfig::default())
            .render("ocean", &layout)
            .unwrap();

        let parsed = parse_clue_list(&puzzle.clues_text);
        let expected: Vec<ParsedClue> = [Direction::Across, Direction::Down]
            .into_iter()
            .flat_map(|d| layout.entries(d))
            .map(|p| ParsedClue {
                direction: p.direction,
                number: p.number,
                clue: p.word.clue().to_string(),
            })
            .collect();
        assert_eq!(parsed, expected);

        let mut reordered: Vec<(u32, Direction)> =
            parsed.iter().map(|c| (c.number, c.direction)).collect();
        reordered.sort();
        let placed: Vec<(u32, Direction)> =
            layout.placed.iter().map(|p| (p.number, p.direction)).collect();
        assert_eq!(reordered, placed);
    }

    #[test]
    fn test_json_and_csv_outputs() {
        let layout = sample_layout();
        let puzzle = TextRenderer::new(RenderConfig::default())
            .render("ocean", &layout)
            .unwrap();

        let doc: serde_json::Value = serde_json::from_str(&puzzle.json).unwrap();
        assert_eq!(doc["topic"], "ocean");
        assert_eq!(doc["rows"], layout.grid.rows());
        assert_eq!(doc["entries"].as_array().unwrap().len(), layout.placed.len());
        assert_eq!(doc["entries"][0]["direction"], "down");

        let mut reader = csv::Reader::from_reader(puzzle.csv.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["number", "direction", "row", "col", "answer", "clue", "length"]
        );
        assert_eq!(reader.records().count(), layout.placed.len());
    }

    #[test]
    fn test_multiline_clue_survives_round_trip() {
        let words: Vec<WordClue> = [
            ("OCEAN", "A vast body\nof salt water"),
            ("CORAL", "Reef-building\r\nanimal"),
        ]
        .iter()
        .map(|(w, c)| WordClue::new(w, c).unwrap())
        .collect();
        let layout = LayoutEngine::new(LayoutConfig {
            min_words: 2,
            ..LayoutConfig::default()
        })
        .layout(&words)
        .unwrap();

        let puzzle = TextRenderer::new(RenderConfig::default())
            .render("ocean", &layout)
            .unwrap();
        let parsed = parse_clue_list(&puzzle.clues_text);

        let clues: Vec<&str> = parsed.iter().map(|c| c.clue.as_str()).collect();
        assert_eq!(clues.len(), 2);
        assert!(clues.contains(&"A vast body of salt water"));
        assert!(clues.contains(&"Reef-building animal"));
    }
}
