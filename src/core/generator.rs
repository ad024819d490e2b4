use crate::config::toml_config::GeneratorConfig;
use crate::domain::model::{RawClue, WordClue};
use crate::domain::ports::ClueSource;
use crate::utils::error::GenerationError;
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;

/// Turns a topic into filtered `WordClue`s using an injected source.
pub struct ClueGenerator {
    source: Box<dyn ClueSource>,
    config: GeneratorConfig,
}

impl ClueGenerator {
    pub fn new(source: Box<dyn ClueSource>, config: GeneratorConfig) -> Self {
        Self { source, config }
    }

    /// Single attempt, bounded by `timeout_seconds`.
    pub async fn generate(
        &self,
        topic: &str,
        count: usize,
    ) -> Result<Vec<WordClue>, GenerationError> {
        tracing::info!(
            "🤖 Requesting {} words about '{}' from {}",
            count,
            topic,
            self.source.name()
        );

        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let raw = tokio::time::timeout(timeout, self.source.generate(topic, count))
            .await
            .map_err(|_| GenerationError::Timeout {
                seconds: self.config.timeout_seconds,
            })??;

        tracing::debug!("Received {} raw pairs", raw.len());
        let words = self.filter(raw, count);

        if words.len() < self.config.min_words {
            return Err(GenerationError::InsufficientWords {
                found: words.len(),
                required: self.config.min_words,
            });
        }

        tracing::info!("✅ {} usable words after filtering", words.len());
        Ok(words)
    }

    /// 正規化並過濾候選字詞，保留先出現者
    pub fn filter(&self, raw: Vec<RawClue>, count: usize) -> Vec<WordClue> {
        let mut seen = HashSet::new();
        let mut words = Vec::new();

        for pair in raw {
            let Some(candidate) = WordClue::new(&pair.answer, &first_sentence(&pair.question))
            else {
                tracing::debug!("Skipping non-alphabetic answer '{}'", pair.answer);
                continue;
            };

            let len = candidate.len();
            if len < self.config.min_length || len > self.config.max_length {
                tracing::debug!("Skipping '{}': length {}", candidate.word(), len);
                continue;
            }
            if candidate.clue().is_empty() {
                tracing::debug!("Skipping '{}': empty clue", candidate.word());
                continue;
            }
            if mentions_word(candidate.clue(), candidate.word()) {
                tracing::debug!("Skipping '{}': clue gives the answer away", candidate.word());
                continue;
            }
            if !seen.insert(candidate.word().to_string()) {
                continue;
            }

            words.push(candidate);
            if words.len() == count {
                break;
            }
        }

        words
    }
}

/// Whole-word, case-insensitive match; "importANT" does not give away ANT.
fn mentions_word(clue: &str, word: &str) -> bool {
    match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))) {
        Ok(re) => re.is_match(clue),
        Err(_) => false,
    }
}

/// First sentence of a clue, terminator included.
///
/// A period only ends a sentence when the next word starts with an uppercase
/// letter and the word before it is not a short abbreviation such as "St" or
/// "Dr". "Mrs. Smith" is still cut after "Mrs.".
fn first_sentence(text: &str) -> String {
    let text = text.trim();
    let mut chars = text.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if !matches!(ch, '.' | '?' | '!') {
            continue;
        }
        let rest = &text[i + ch.len_utf8()..];
        let at_boundary = match rest.chars().next() {
            None => true,
            Some(next) if !next.is_whitespace() => false,
            Some(_) if ch != '.' => true,
            Some(_) => {
                let next_upper = rest
                    .trim_start()
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_uppercase());
                next_upper && !is_abbreviation(&text[..i])
            }
        };
        if at_boundary {
            return text[..i + ch.len_utf8()].to_string();
        }
    }
    text.to_string()
}

// 兩個字母以內、首字大寫的字視為縮寫（St. / Dr. / Mt.）
fn is_abbreviation(before: &str) -> bool {
    let word = before
        .rsplit(|c: char| !c.is_alphabetic())
        .next()
        .unwrap_or_default();
    let len = word.chars().count();
    (1..=2).contains(&len) && word.chars().next().is_some_and(|c| c.is_uppercase())
}
