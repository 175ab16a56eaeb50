//! Message texts and reply keyboards shown to the learner.

use teloxide::types::{KeyboardButton, KeyboardMarkup};
use teloxide::utils::html::escape;

use crate::quiz::bank::QuestionBank;
use crate::quiz::reading::ReadingResult;
use crate::quiz::session::Summary;
use crate::quiz::sorting::SortingBoard;
use crate::quiz::{Question, QuestionKind};

pub const SKIP_ADVENTURE: &str = "⏭️ Skip";
pub const NEW_ADVENTURE: &str = "🗺️ New adventure";
pub const LISTEN: &str = "🔊 Listen";
pub const HINT: &str = "💡 Hint";
pub const STOP: &str = "🏠 Stop";
pub const NEXT: &str = "➡️ Next";
pub const READ_ALOUD: &str = "🎤 Read it aloud";
pub const CHECK_BOARD: &str = "✅ Check";
pub const RESTART_BOARD: &str = "🔄 Start over";
pub const BACK_TO_PILE: &str = "↩️ Back to the pile";

pub const QUESTION_AMOUNTS: [&str; 3] = ["3", "5", "10"];

const WORDS_PER_ROW: usize = 3;

pub fn topic_menu(bank: &QuestionBank) -> KeyboardMarkup {
    let mut rows = bank
        .topics()
        .iter()
        .map(|t| vec![KeyboardButton::new(t.label())])
        .collect::<Vec<_>>();
    rows.push(vec![KeyboardButton::new(NEW_ADVENTURE)]);
    KeyboardMarkup::new(rows)
}

pub fn amount_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(
        QUESTION_AMOUNTS
            .iter()
            .map(|a| vec![KeyboardButton::new(*a)])
            .collect::<Vec<_>>(),
    )
}

pub fn single_button(label: &str) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(label)]])
}

/// Buttons while a question waits for an answer.
pub fn question_keyboard(question: &Question) -> KeyboardMarkup {
    let mut rows = question
        .options()
        .iter()
        .map(|o| vec![KeyboardButton::new(o.clone())])
        .collect::<Vec<_>>();

    let mut extras = Vec::new();
    if question.hint.is_some() {
        extras.push(KeyboardButton::new(HINT));
    }
    if question.audio.is_some() {
        extras.push(KeyboardButton::new(LISTEN));
    }
    extras.push(KeyboardButton::new(STOP));
    rows.push(extras);

    KeyboardMarkup::new(rows)
}

pub fn sorting_keyboard(board: &SortingBoard, picked: Option<&str>, has_audio: bool) -> KeyboardMarkup {
    let mut rows: Vec<Vec<KeyboardButton>> = Vec::new();
    match picked {
        Some(_) => {
            rows.extend(board.bins.iter().map(|b| vec![KeyboardButton::new(b.name.clone())]));
            rows.push(vec![KeyboardButton::new(BACK_TO_PILE)]);
        }
        None => {
            rows.extend(
                board
                    .pool
                    .chunks(WORDS_PER_ROW)
                    .map(|words| words.iter().map(|w| KeyboardButton::new(w.clone())).collect()),
            );
            if board.is_complete() {
                rows.push(vec![KeyboardButton::new(CHECK_BOARD)]);
            }
            let mut extras = vec![KeyboardButton::new(RESTART_BOARD)];
            if has_audio {
                extras.push(KeyboardButton::new(LISTEN));
            }
            extras.push(KeyboardButton::new(STOP));
            rows.push(extras);
        }
    }
    KeyboardMarkup::new(rows)
}

pub fn feedback_keyboard(can_read_aloud: bool) -> KeyboardMarkup {
    let mut row = Vec::new();
    if can_read_aloud {
        row.push(KeyboardButton::new(READ_ALOUD));
    }
    row.push(KeyboardButton::new(NEXT));
    KeyboardMarkup::new(vec![row, vec![KeyboardButton::new(STOP)]])
}

/// Full HTML text of a question. `prompt` may be the adventure version.
pub fn question_text(question: &Question, prompt: &str, number: usize, total: usize) -> String {
    let mut text = format!("<b>Question {} of {}</b>\n{}", number, total, escape(prompt));
    match &question.kind {
        QuestionKind::Reading {
            passage, question, ..
        } => {
            text.push_str(&format!(
                "\n\n📖 <i>{}</i>\n\n❓ {}",
                escape(passage),
                escape(question)
            ));
        }
        QuestionKind::FillBlank { .. } => {
            text.push_str("\n\n✏️ Type your answer.");
        }
        QuestionKind::Sorting { .. } => {
            text.push_str("\n\n👆 Tap a word, then tap the box it belongs in.");
        }
        QuestionKind::MultipleChoice { .. } => {}
    }
    text
}

pub fn board_status(board: &SortingBoard) -> String {
    let mut lines = board
        .bins
        .iter()
        .map(|b| {
            let words = if b.words.is_empty() {
                "…".to_string()
            } else {
                b.words.join(", ")
            };
            format!("📦 <b>{}</b>: {}", escape(&b.name), escape(&words))
        })
        .collect::<Vec<_>>();
    if !board.pool.is_empty() {
        lines.push(format!("🧺 Still to sort: {}", escape(&board.pool.join(", "))));
    }
    lines.join("\n")
}

pub fn reading_text(result: &ReadingResult) -> String {
    let mut text = format!("{}\nYou read {}% of the words.", result.grade.message(), result.percent());
    if !result.missed.is_empty() {
        text.push_str(&format!("\nWords to practise: {}", result.missed.join(", ")));
    }
    text
}

pub fn summary_text(name: &str, summary: &Summary) -> String {
    let stars = (0..3)
        .map(|i| if i < summary.stars { "⭐" } else { "☆" })
        .collect::<String>();
    let mut text = format!(
        "🏁 All done, {}! You got {} of {} right.\n{}",
        name, summary.score, summary.total, stars
    );
    if let Some(reading) = summary.reading_average {
        text.push_str(&format!(
            "\n📖 Reading aloud: {}%",
            (reading * 100.0).round() as u32
        ));
    }
    if summary.is_perfect() {
        text.push_str("\n\n🎉🎊✨ PERFECT SCORE! ✨🎊🎉");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Bin;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn labels(markup: &KeyboardMarkup) -> Vec<Vec<String>> {
        markup
            .keyboard
            .iter()
            .map(|row| row.iter().map(|b| b.text.clone()).collect())
            .collect()
    }

    #[test]
    fn choice_questions_get_one_row_per_option() {
        let mut question = Question::new(
            "Pick one".to_string(),
            QuestionKind::MultipleChoice {
                options: vec!["cat".to_string(), "cake".to_string()],
                correct: 0,
            },
        );
        question.audio = Some("cat".to_string());

        assert_eq!(
            labels(&question_keyboard(&question)),
            vec![vec!["cat"], vec!["cake"], vec![LISTEN, STOP]]
        );
    }

    #[test]
    fn sorting_keyboard_switches_to_boxes_after_a_pick() {
        let bins = vec![
            Bin::new("sh".to_string(), vec!["ship".to_string()]),
            Bin::new("ch".to_string(), vec!["chip".to_string()]),
        ];
        let mut board = SortingBoard::new(&bins, &mut StdRng::seed_from_u64(9));

        let picking = labels(&sorting_keyboard(&board, None, false));
        assert_eq!(picking[0].len(), 2);
        assert_eq!(picking[1], vec![RESTART_BOARD, STOP]);

        assert_eq!(
            labels(&sorting_keyboard(&board, Some("ship"), false)),
            vec![vec!["sh"], vec!["ch"], vec![BACK_TO_PILE]]
        );

        board.place("ship", "sh").unwrap();
        board.place("chip", "ch").unwrap();
        let done = labels(&sorting_keyboard(&board, None, true));
        assert_eq!(done[0], vec![CHECK_BOARD]);
        assert_eq!(done[1], vec![RESTART_BOARD, LISTEN, STOP]);
    }

    #[test]
    fn question_text_escapes_html() {
        let question = Question::new(
            "Is 2 < 3?".to_string(),
            QuestionKind::FillBlank {
                answer: "yes".to_string(),
            },
        );
        let text = question_text(&question, &question.prompt, 1, 5);
        assert!(text.starts_with("<b>Question 1 of 5</b>\nIs 2 &lt; 3?"));
    }

    #[test]
    fn summary_shows_stars_and_celebrates_perfect_runs() {
        let summary = Summary {
            score: 3,
            total: 3,
            stars: 3,
            reading_average: Some(0.875),
        };
        let text = summary_text("Mia", &summary);
        assert!(text.contains("You got 3 of 3 right.\n⭐⭐⭐"));
        assert!(text.contains("Reading aloud: 88%"));
        assert!(text.contains("PERFECT"));

        let summary = Summary {
            score: 1,
            total: 3,
            stars: 1,
            reading_average: None,
        };
        let text = summary_text("Mia", &summary);
        assert!(text.contains("⭐☆☆"));
        assert!(!text.contains("PERFECT"));
    }
}
