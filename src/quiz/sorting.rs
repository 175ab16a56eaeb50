use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::SortingError;
use crate::quiz::Bin;

/// Words waiting in the pool plus the boxes the learner has filled so far.
///
/// A word always lives in exactly one place: either the pool or one bin.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SortingBoard {
    pub pool: Vec<String>,
    pub bins: Vec<Bin>,
}

impl SortingBoard {
    pub fn new<R: Rng + ?Sized>(expected: &[Bin], rng: &mut R) -> Self {
        let mut pool = expected
            .iter()
            .flat_map(|b| b.words.iter().cloned())
            .collect::<Vec<_>>();
        pool.shuffle(rng);

        let bins = expected
            .iter()
            .map(|b| Bin::new(b.name.clone(), Vec::new()))
            .collect();

        Self { pool, bins }
    }

    /// Moves `word` (from the pool or from another bin) into `bin`.
    /// Returns the word as it is spelled on the board.
    pub fn place(&mut self, word: &str, bin: &str) -> Result<String, SortingError> {
        let target = position_of(self.bins.iter().map(|b| b.name.as_str()), bin)
            .ok_or_else(|| SortingError::UnknownBin(bin.to_string()))?;

        let word = self.lift(word)?;
        self.bins[target].words.push(word.clone());
        Ok(word)
    }

    /// Sends a placed word back to the pool.
    pub fn take_back(&mut self, word: &str) -> Result<String, SortingError> {
        if position_of(self.pool.iter().map(String::as_str), word).is_some() {
            return Err(SortingError::NotPlaced(word.to_string()));
        }
        let word = self.lift(word)?;
        self.pool.push(word.clone());
        Ok(word)
    }

    pub fn reset(&mut self) {
        for bin in self.bins.iter_mut() {
            self.pool.append(&mut bin.words);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pool.is_empty()
    }

    /// Every expected bin holds exactly its words, order ignored.
    pub fn matches(&self, expected: &[Bin]) -> bool {
        if !self.is_complete() || self.bins.len() != expected.len() {
            return false;
        }
        expected.iter().all(|want| {
            self.bin(&want.name)
                .map(|got| word_set(&got.words) == word_set(&want.words))
                .unwrap_or(false)
        })
    }

    pub fn misplaced(&self, expected: &[Bin]) -> Vec<String> {
        self.bins
            .iter()
            .flat_map(|got| {
                let want = expected
                    .iter()
                    .find(|b| b.name.eq_ignore_ascii_case(&got.name))
                    .map(|b| word_set(&b.words))
                    .unwrap_or_default();
                got.words
                    .iter()
                    .filter(move |w| !want.contains(&w.to_lowercase()))
                    .cloned()
            })
            .collect()
    }

    pub fn bin(&self, name: &str) -> Option<&Bin> {
        self.bins.iter().find(|b| b.name.eq_ignore_ascii_case(name))
    }

    pub fn contains_word(&self, word: &str) -> bool {
        position_of(self.pool.iter().map(String::as_str), word).is_some()
            || self
                .bins
                .iter()
                .any(|b| position_of(b.words.iter().map(String::as_str), word).is_some())
    }

    // Removes the word from wherever it is and hands it back.
    fn lift(&mut self, word: &str) -> Result<String, SortingError> {
        if let Some(i) = position_of(self.pool.iter().map(String::as_str), word) {
            return Ok(self.pool.remove(i));
        }
        for bin in self.bins.iter_mut() {
            if let Some(i) = position_of(bin.words.iter().map(String::as_str), word) {
                return Ok(bin.words.remove(i));
            }
        }
        Err(SortingError::UnknownWord(word.to_string()))
    }
}

fn word_set(words: &[String]) -> HashSet<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

// Exact spelling wins; otherwise fall back to a case-insensitive match.
fn position_of<'a>(mut items: impl Iterator<Item = &'a str> + Clone, needle: &str) -> Option<usize> {
    let needle = needle.trim();
    items
        .clone()
        .position(|i| i == needle)
        .or_else(|| items.position(|i| i.to_lowercase() == needle.to_lowercase()))
}
