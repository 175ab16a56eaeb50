use std::collections::HashSet;

/// How well a read-aloud transcript covers the passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ReadingGrade {
    Excellent,
    Good,
    KeepPracticing,
}

impl ReadingGrade {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.8 {
            ReadingGrade::Excellent
        } else if ratio >= 0.5 {
            ReadingGrade::Good
        } else {
            ReadingGrade::KeepPracticing
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ReadingGrade::Excellent => "🌟 Wonderful reading! You read almost every word.",
            ReadingGrade::Good => "👍 Good reading! A few words got away, let's look at them.",
            ReadingGrade::KeepPracticing => "🐢 Nice try! Let's read it slowly together once more.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReadingResult {
    pub ratio: f64,
    pub grade: ReadingGrade,
    pub missed: Vec<String>,
}

impl ReadingResult {
    pub fn score(transcript: &str, passage: &str) -> Self {
        let ratio = similarity(transcript, passage);
        Self {
            ratio,
            grade: ReadingGrade::from_ratio(ratio),
            missed: missed_words(transcript, passage),
        }
    }

    pub fn percent(&self) -> u32 {
        (self.ratio * 100.0).round() as u32
    }
}

/// Share of the passage's distinct words that show up in the spoken text.
pub fn similarity(spoken: &str, passage: &str) -> f64 {
    let target = words(passage).into_iter().collect::<HashSet<_>>();
    if target.is_empty() {
        return 0.0;
    }
    let heard = words(spoken).into_iter().collect::<HashSet<_>>();
    let matched = target.intersection(&heard).count();
    matched as f64 / target.len() as f64
}

/// Passage words that were not heard, first occurrence only, in reading order.
pub fn missed_words(spoken: &str, passage: &str) -> Vec<String> {
    let heard = words(spoken).into_iter().collect::<HashSet<_>>();
    let mut seen = HashSet::new();
    words(passage)
        .into_iter()
        .filter(|w| !heard.contains(w))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            '’' | '\'' => '\'',
            c if c.is_alphanumeric() || c.is_whitespace() => c,
            _ => ' ',
        })
        .collect::<String>()
        .split_whitespace()
        .map(|w| w.trim_matches('\'').to_string())
        .filter(|w| !w.is_empty())
        .collect()
}
