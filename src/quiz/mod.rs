pub mod ai_helper;
pub mod bank;
pub mod reading;
pub mod session;
pub mod sorting;

use crate::error::QuizError;
use sorting::SortingBoard;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub prompt: String,
    #[serde(default)]
    pub explanation: Option<String>,
    /// What the narrator says out loud for this question.
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<String>,
        correct: usize,
    },
    FillBlank {
        answer: String,
    },
    Sorting {
        bins: Vec<Bin>,
    },
    Reading {
        passage: String,
        question: String,
        options: Vec<String>,
        correct: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bin {
    pub name: String,
    pub words: Vec<String>,
}
impl Bin {
    pub fn new(name: String, words: Vec<String>) -> Self {
        Self { name, words }
    }
}

/// What the learner handed in for a question.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Choice(usize),
    Typed(String),
    Board(SortingBoard),
}

impl QuestionKind {
    pub fn name(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple choice",
            QuestionKind::FillBlank { .. } => "fill in the blank",
            QuestionKind::Sorting { .. } => "sorting",
            QuestionKind::Reading { .. } => "reading",
        }
    }
}

impl Question {
    #[cfg(test)]
    pub fn new(prompt: String, kind: QuestionKind) -> Self {
        Self {
            prompt,
            explanation: None,
            audio: None,
            hint: None,
            kind,
        }
    }

    pub fn check(&self, response: &Response) -> Result<bool, QuizError> {
        match (&self.kind, response) {
            (QuestionKind::MultipleChoice { correct, .. }, Response::Choice(i))
            | (QuestionKind::Reading { correct, .. }, Response::Choice(i)) => Ok(i == correct),
            (QuestionKind::FillBlank { answer }, Response::Typed(typed)) => {
                Ok(normalize_typed(typed) == normalize_typed(answer))
            }
            (QuestionKind::Sorting { bins }, Response::Board(board)) => Ok(board.matches(bins)),
            (kind, _) => Err(QuizError::ResponseMismatch(kind.name())),
        }
    }

    /// Option labels for the kinds answered by tapping a button.
    pub fn options(&self) -> &[String] {
        match &self.kind {
            QuestionKind::MultipleChoice { options, .. } | QuestionKind::Reading { options, .. } => {
                options.as_slice()
            }
            _ => &[],
        }
    }

    pub fn choice_index(&self, label: &str) -> Option<usize> {
        let label = label.trim();
        let options = self.options();
        options
            .iter()
            .position(|o| o == label)
            .or_else(|| options.iter().position(|o| o.to_lowercase() == label.to_lowercase()))
    }

    pub fn expected_answer(&self) -> String {
        match &self.kind {
            QuestionKind::MultipleChoice { options, correct }
            | QuestionKind::Reading {
                options, correct, ..
            } => options.get(*correct).cloned().unwrap_or_default(),
            QuestionKind::FillBlank { answer } => answer.clone(),
            QuestionKind::Sorting { bins } => bins
                .iter()
                .map(|b| format!("{}: {}", b.name, b.words.join(", ")))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn passage(&self) -> Option<&str> {
        match &self.kind {
            QuestionKind::Reading { passage, .. } => Some(passage),
            _ => None,
        }
    }
}

fn normalize_typed(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn choice() -> Question {
        Question::new(
            "Which word has the short e sound?".to_string(),
            QuestionKind::MultipleChoice {
                options: vec!["bed".to_string(), "bead".to_string(), "bike".to_string()],
                correct: 0,
            },
        )
    }

    #[test]
    fn choice_is_checked_by_index() {
        let q = choice();
        assert!(q.check(&Response::Choice(0)).unwrap());
        assert!(!q.check(&Response::Choice(2)).unwrap());
        assert_eq!(q.expected_answer(), "bed");
    }

    #[test]
    fn choice_labels_map_back_to_indexes() {
        let q = choice();
        assert_eq!(q.choice_index("bead"), Some(1));
        assert_eq!(q.choice_index(" BIKE "), Some(2));
        assert_eq!(q.choice_index("boat"), None);
    }

    #[test]
    fn fill_blank_ignores_case_and_spaces() {
        let q = Question::new(
            "The d_g barks.".to_string(),
            QuestionKind::FillBlank {
                answer: "o".to_string(),
            },
        );
        assert!(q.check(&Response::Typed("  O ".to_string())).unwrap());
        assert!(!q.check(&Response::Typed("a".to_string())).unwrap());
        assert!(q.options().is_empty());
    }

    #[test]
    fn wrong_response_shape_is_an_error() {
        let q = choice();
        assert!(matches!(
            q.check(&Response::Typed("bed".to_string())),
            Err(QuizError::ResponseMismatch("multiple choice"))
        ));
    }

    #[test]
    fn sorting_is_checked_against_the_board() {
        let bins = vec![
            Bin::new("sh".to_string(), vec!["ship".to_string()]),
            Bin::new("ch".to_string(), vec!["chip".to_string()]),
        ];
        let q = Question::new("Sort the words".to_string(), QuestionKind::Sorting { bins: bins.clone() });

        let mut board = SortingBoard::new(&bins, &mut StdRng::seed_from_u64(1));
        board.place("ship", "sh").unwrap();
        board.place("chip", "ch").unwrap();
        assert!(q.check(&Response::Board(board.clone())).unwrap());

        board.place("ship", "ch").unwrap();
        board.place("chip", "sh").unwrap();
        assert!(!q.check(&Response::Board(board)).unwrap());
        assert_eq!(q.expected_answer(), "sh: ship\nch: chip");
    }

    #[test]
    fn questions_read_from_tagged_yaml() {
        let yaml = r#"
prompt: "Read the story."
kind: reading
passage: "The sun is hot."
question: "What is hot?"
options: ["the sun", "the moon"]
correct: 0
"#;
        let q: Question = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(q.passage(), Some("The sun is hot."));
        assert!(q.check(&Response::Choice(0)).unwrap());
        assert_eq!(q.explanation, None);
    }
}
