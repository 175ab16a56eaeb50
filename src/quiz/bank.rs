use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::BankError;
use crate::quiz::{Question, QuestionKind};

const EMBEDDED_BANK: &str = include_str!("../data/question_bank.yaml");

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct QuestionBank {
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Topic {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub emoji: String,
    pub questions: Vec<Question>,
}

impl Topic {
    /// Text on the menu button for this topic.
    pub fn label(&self) -> String {
        if self.emoji.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.emoji, self.title)
        }
    }
}

impl QuestionBank {
    pub fn embedded() -> Result<Self, BankError> {
        Self::from_yaml(EMBEDDED_BANK)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let bank: Self = serde_yaml::from_reader(File::open(path)?)?;
        bank.validate()?;
        Ok(bank)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, BankError> {
        let bank: Self = serde_yaml::from_str(yaml)?;
        bank.validate()?;
        Ok(bank)
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Finds a topic by id, title or menu label.
    pub fn topic(&self, query: &str) -> Option<&Topic> {
        let query = query.trim().to_lowercase();
        self.topics.iter().find(|t| {
            t.id.to_lowercase() == query
                || t.title.to_lowercase() == query
                || t.label().to_lowercase() == query
        })
    }

    /// Up to `amount` distinct questions of the topic, in random order.
    pub fn draw<R: Rng + ?Sized>(&self, topic: &Topic, amount: usize, rng: &mut R) -> Vec<Question> {
        let mut questions = topic
            .questions
            .choose_multiple(rng, amount)
            .cloned()
            .collect::<Vec<_>>();
        questions.shuffle(rng);
        questions
    }

    pub fn question_count(&self) -> usize {
        self.topics.iter().map(|t| t.questions.len()).sum()
    }

    fn validate(&self) -> Result<(), BankError> {
        if self.topics.is_empty() {
            return Err(BankError::NoTopics);
        }
        let mut ids = HashSet::new();
        for topic in &self.topics {
            if !ids.insert(topic.id.to_lowercase()) {
                return Err(BankError::DuplicateTopic(topic.id.clone()));
            }
            if topic.questions.is_empty() {
                return Err(BankError::InvalidQuestion {
                    topic: topic.id.clone(),
                    question: 0,
                    reason: "topic has no questions".to_string(),
                });
            }
            for (i, question) in topic.questions.iter().enumerate() {
                validate_question(question).map_err(|reason| BankError::InvalidQuestion {
                    topic: topic.id.clone(),
                    question: i + 1,
                    reason,
                })?;
            }
        }
        Ok(())
    }
}

fn validate_question(question: &Question) -> Result<(), String> {
    if question.prompt.trim().is_empty() {
        return Err("prompt is empty".to_string());
    }
    match &question.kind {
        QuestionKind::MultipleChoice { options, correct } => validate_options(options, *correct),
        QuestionKind::Reading {
            passage,
            question,
            options,
            correct,
        } => {
            if passage.trim().is_empty() {
                return Err("reading passage is empty".to_string());
            }
            if question.trim().is_empty() {
                return Err("reading question is empty".to_string());
            }
            validate_options(options, *correct)
        }
        QuestionKind::FillBlank { answer } => {
            if answer.trim().is_empty() {
                return Err("fill-in answer is empty".to_string());
            }
            Ok(())
        }
        QuestionKind::Sorting { bins } => {
            if bins.len() < 2 {
                return Err("sorting needs at least 2 boxes".to_string());
            }
            let mut names = HashSet::new();
            let mut words = HashSet::new();
            for bin in bins {
                if !names.insert(bin.name.to_lowercase()) {
                    return Err(format!("box \"{}\" appears twice", bin.name));
                }
                if bin.words.is_empty() {
                    return Err(format!("box \"{}\" has no words", bin.name));
                }
                for word in &bin.words {
                    if !words.insert(word.to_lowercase()) {
                        return Err(format!("word \"{}\" appears more than once", word));
                    }
                }
            }
            Ok(())
        }
    }
}

fn validate_options(options: &[String], correct: usize) -> Result<(), String> {
    if options.len() < 2 {
        return Err("needs at least 2 options".to_string());
    }
    if correct >= options.len() {
        return Err(format!(
            "correct option {} is out of range (there are {})",
            correct,
            options.len()
        ));
    }
    let distinct = options.iter().map(|o| o.to_lowercase()).collect::<HashSet<_>>();
    if distinct.len() != options.len() {
        return Err("options repeat".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SMALL_BANK: &str = r#"
topics:
  - id: rhymes
    title: Rhymes
    emoji: "🎵"
    questions:
      - kind: multiple_choice
        prompt: "Which word rhymes with sun?"
        options: ["fun", "sit"]
        correct: 0
      - kind: fill_blank
        prompt: "The b_g bug."
        answer: "u"
      - kind: multiple_choice
        prompt: "Which word rhymes with cake?"
        options: ["lake", "cat"]
        correct: 0
"#;

    #[test]
    fn embedded_bank_is_valid() {
        let bank = QuestionBank::embedded().unwrap();
        assert!(bank.topics().len() >= 4);
        let kinds = bank
            .topics()
            .iter()
            .flat_map(|t| t.questions.iter().map(|q| q.kind.name()))
            .collect::<HashSet<_>>();
        assert_eq!(kinds.len(), 4, "every question kind is represented");
    }

    #[test]
    fn topics_are_found_by_id_title_or_label() {
        let bank = QuestionBank::from_yaml(SMALL_BANK).unwrap();
        assert!(bank.topic("rhymes").is_some());
        assert!(bank.topic("RHYMES").is_some());
        assert!(bank.topic("🎵 Rhymes").is_some());
        assert!(bank.topic("vowels").is_none());
        assert_eq!(bank.question_count(), 3);
    }

    #[test]
    fn draw_returns_distinct_questions_up_to_the_topic_size() {
        let bank = QuestionBank::from_yaml(SMALL_BANK).unwrap();
        let topic = bank.topic("rhymes").unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(bank.draw(topic, 2, &mut rng).len(), 2);
        let all = bank.draw(topic, 10, &mut rng);
        assert_eq!(all.len(), 3);
        let prompts = all.iter().map(|q| q.prompt.as_str()).collect::<HashSet<_>>();
        assert_eq!(prompts.len(), 3);
    }

    #[test]
    fn out_of_range_answer_is_rejected() {
        let yaml = SMALL_BANK.replace("correct: 0\n      - kind: fill_blank", "correct: 5\n      - kind: fill_blank");
        match QuestionBank::from_yaml(&yaml) {
            Err(BankError::InvalidQuestion { topic, question, .. }) => {
                assert_eq!(topic, "rhymes");
                assert_eq!(question, 1);
            }
            other => panic!("unexpected: {:?}", other.map(|b| b.question_count())),
        }
    }

    #[test]
    fn sorting_words_must_be_unique() {
        let yaml = r#"
topics:
  - id: digraphs
    title: Digraphs
    questions:
      - kind: sorting
        prompt: "Sort them"
        bins:
          - name: sh
            words: [ship, shop]
          - name: ch
            words: [chip, Ship]
"#;
        assert!(matches!(
            QuestionBank::from_yaml(yaml),
            Err(BankError::InvalidQuestion { .. })
        ));
    }

    #[test]
    fn empty_and_duplicate_topics_are_rejected() {
        assert!(matches!(
            QuestionBank::from_yaml("topics: []"),
            Err(BankError::NoTopics)
        ));
        let twice = format!("{}{}", SMALL_BANK, SMALL_BANK.replace("topics:\n", ""));
        assert!(matches!(
            QuestionBank::from_yaml(&twice),
            Err(BankError::DuplicateTopic(_))
        ));
    }

    #[test]
    fn broken_yaml_is_a_parse_error() {
        assert!(matches!(
            QuestionBank::from_yaml("topics: [ {"),
            Err(BankError::Yaml(_))
        ));
    }

    // Wraps one question in a topic and returns why the bank refused it.
    fn rejection(question: &str) -> String {
        let yaml = format!("topics:\n  - id: checks\n    title: Checks\n    questions:\n{}", question);
        match QuestionBank::from_yaml(&yaml) {
            Err(BankError::InvalidQuestion { topic, question, reason }) => {
                assert_eq!((topic.as_str(), question), ("checks", 1));
                reason
            }
            other => panic!("unexpected: {:?}", other.map(|b| b.question_count())),
        }
    }

    #[test]
    fn choice_questions_need_two_distinct_options() {
        let one_option = r#"
      - kind: multiple_choice
        prompt: "Which word rhymes with sun?"
        options: ["fun"]
        correct: 0
"#;
        assert_eq!(rejection(one_option), "needs at least 2 options");

        let repeated = r#"
      - kind: multiple_choice
        prompt: "Which word rhymes with sun?"
        options: ["fun", "sit", "Fun"]
        correct: 0
"#;
        assert_eq!(rejection(repeated), "options repeat");
    }

    #[test]
    fn sorting_needs_two_boxes_with_words() {
        let one_box = r#"
      - kind: sorting
        prompt: "Sort them"
        bins:
          - name: sh
            words: [ship, shop]
"#;
        assert_eq!(rejection(one_box), "sorting needs at least 2 boxes");

        let empty_box = r#"
      - kind: sorting
        prompt: "Sort them"
        bins:
          - name: sh
            words: [ship, shop]
          - name: ch
            words: []
"#;
        assert_eq!(rejection(empty_box), "box \"ch\" has no words");
    }

    #[test]
    fn blank_fill_in_answer_is_rejected() {
        let blank = r#"
      - kind: fill_blank
        prompt: "The b_g bug."
        answer: "  "
"#;
        assert_eq!(rejection(blank), "fill-in answer is empty");
    }

    #[test]
    fn reading_needs_a_passage() {
        let no_passage = r#"
      - kind: reading
        prompt: "Read the story"
        passage: ""
        question: "What can the pig do?"
        options: ["dig", "fly"]
        correct: 0
"#;
        assert_eq!(rejection(no_passage), "reading passage is empty");
    }

    #[test]
    fn bank_file_is_loaded_and_validated() {
        let path = std::env::temp_dir().join(format!("phonics-bank-{}.yaml", std::process::id()));
        std::fs::write(&path, SMALL_BANK).unwrap();
        let loaded = QuestionBank::load(&path);
        std::fs::remove_file(&path).unwrap();

        let bank = loaded.unwrap();
        assert_eq!(bank.question_count(), 3);
        assert!(bank.topic("rhymes").is_some());
    }

    #[test]
    fn missing_bank_file_is_an_io_error() {
        let path = std::env::temp_dir().join("phonics-bank-that-does-not-exist.yaml");
        assert!(matches!(QuestionBank::load(&path), Err(BankError::Io(_))));
    }
}
