use rand::Rng;

use crate::error::{QuizError, SortingError};
use crate::quiz::reading::ReadingResult;
use crate::quiz::sorting::SortingBoard;
use crate::quiz::{Question, QuestionKind, Response};

/// Where the learner is within the current question.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    Asking,
    Sorting {
        board: SortingBoard,
        picked: Option<String>,
    },
    Reviewing {
        correct: bool,
    },
    ReadingAloud {
        correct: bool,
    },
    Finished,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Asking => "waiting for an answer",
            Phase::Sorting { .. } => "sorting words",
            Phase::Reviewing { .. } => "showing feedback",
            Phase::ReadingAloud { .. } => "listening to reading",
            Phase::Finished => "finished",
        }
    }

    fn for_question<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Self {
        match &question.kind {
            QuestionKind::Sorting { bins } => Phase::Sorting {
                board: SortingBoard::new(bins, rng),
                picked: None,
            },
            _ => Phase::Asking,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Feedback {
    pub correct: bool,
    pub expected: String,
    pub explanation: Option<String>,
    pub misplaced: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReadingAttempt {
    pub question: usize,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub score: usize,
    pub total: usize,
    pub stars: u8,
    pub reading_average: Option<f64>,
}

impl Summary {
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.score == self.total
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub topic: String,
    pub questions: Vec<Question>,
    pub current: usize,
    pub score: usize,
    pub phase: Phase,
    #[serde(default)]
    pub readings: Vec<ReadingAttempt>,
}

impl Session {
    pub fn new<R: Rng + ?Sized>(
        topic: String,
        questions: Vec<Question>,
        rng: &mut R,
    ) -> Result<Self, QuizError> {
        let phase = Phase::for_question(questions.first().ok_or(QuizError::EmptySession)?, rng);
        Ok(Self {
            topic,
            questions,
            current: 0,
            score: 0,
            phase,
            readings: Vec::new(),
        })
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::Finished => None,
            _ => self.questions.get(self.current),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Grades an answer and switches to feedback.
    pub fn submit(&mut self, response: Response) -> Result<Feedback, QuizError> {
        match &self.phase {
            Phase::Asking => {}
            Phase::Sorting { .. } if matches!(response, Response::Board(_)) => {}
            other => return Err(self.wrong_phase("answer", other)),
        }
        let question = self.questions.get(self.current).ok_or(QuizError::Finished)?;
        let correct = question.check(&response)?;
        let misplaced = match (&question.kind, &response) {
            (QuestionKind::Sorting { bins }, Response::Board(board)) => board.misplaced(bins),
            _ => Vec::new(),
        };
        let feedback = Feedback {
            correct,
            expected: question.expected_answer(),
            explanation: question.explanation.clone(),
            misplaced,
        };

        if correct {
            self.score += 1;
        }
        self.phase = Phase::Reviewing { correct };
        Ok(feedback)
    }

    /// Grades the board built so far; every word must be in a box.
    pub fn check_board(&mut self) -> Result<Feedback, QuizError> {
        let board = match &self.phase {
            Phase::Sorting { board, .. } => board.clone(),
            other => return Err(self.wrong_phase("check the boxes", other)),
        };
        if !board.is_complete() {
            return Err(SortingError::Incomplete(board.pool.len()).into());
        }
        self.submit(Response::Board(board))
    }

    pub fn board(&self) -> Option<(&SortingBoard, Option<&str>)> {
        match &self.phase {
            Phase::Sorting { board, picked } => Some((board, picked.as_deref())),
            _ => None,
        }
    }

    /// True for a word of the current board that is not also a box name, so
    /// tapping it while holding another word picks it up instead.
    pub fn is_word_on_board(&self, text: &str) -> bool {
        match self.board() {
            Some((board, _)) => board.contains_word(text) && board.bin(text.trim()).is_none(),
            None => false,
        }
    }

    /// Picks up a word from the pile or from a box.
    pub fn pick(&mut self, word: &str) -> Result<(), QuizError> {
        let (board, picked) = self.sorting_mut("pick a word")?;
        if !board.contains_word(word) {
            return Err(SortingError::UnknownWord(word.to_string()).into());
        }
        *picked = Some(word.trim().to_string());
        Ok(())
    }

    /// Drops the picked word into a box; returns the word as placed.
    pub fn drop_into(&mut self, bin: &str) -> Result<String, QuizError> {
        let (board, picked) = self.sorting_mut("drop a word")?;
        let word = picked.as_deref().ok_or(SortingError::NothingPicked)?;
        let placed = board.place(word, bin)?;
        *picked = None;
        Ok(placed)
    }

    /// Puts the picked word back on the pile.
    pub fn return_picked(&mut self) -> Result<String, QuizError> {
        let (board, picked) = self.sorting_mut("put a word back")?;
        let word = picked.take().ok_or(SortingError::NothingPicked)?;
        match board.take_back(&word) {
            // Already on the pile: just let go of it.
            Err(SortingError::NotPlaced(_)) => Ok(word),
            other => Ok(other?),
        }
    }

    pub fn restart_board(&mut self) -> Result<(), QuizError> {
        let (board, picked) = self.sorting_mut("start over")?;
        board.reset();
        *picked = None;
        Ok(())
    }

    pub fn can_read_aloud(&self) -> bool {
        matches!(self.phase, Phase::Reviewing { .. })
            && self
                .questions
                .get(self.current)
                .and_then(Question::passage)
                .is_some()
    }

    pub fn start_reading_aloud(&mut self) -> Result<&str, QuizError> {
        let correct = match self.phase {
            Phase::Reviewing { correct } if self.can_read_aloud() => correct,
            ref other => return Err(self.wrong_phase("read aloud", other)),
        };
        self.phase = Phase::ReadingAloud { correct };
        self.questions[self.current]
            .passage()
            .ok_or(QuizError::ResponseMismatch("reading"))
    }

    /// Scores a read-aloud transcript and goes back to feedback.
    /// The best attempt per question is kept.
    pub fn record_reading(&mut self, transcript: &str) -> Result<ReadingResult, QuizError> {
        let correct = match self.phase {
            Phase::ReadingAloud { correct } => correct,
            ref other => return Err(self.wrong_phase("listen to reading", other)),
        };
        let passage = self.questions[self.current]
            .passage()
            .ok_or(QuizError::ResponseMismatch("reading"))?;
        let result = ReadingResult::score(transcript, passage);

        match self.readings.iter_mut().find(|r| r.question == self.current) {
            Some(attempt) => attempt.ratio = attempt.ratio.max(result.ratio),
            None => self.readings.push(ReadingAttempt {
                question: self.current,
                ratio: result.ratio,
            }),
        }
        self.phase = Phase::Reviewing { correct };
        Ok(result)
    }

    /// Moves past the feedback to the next question, if any.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Option<&Question>, QuizError> {
        match self.phase {
            Phase::Reviewing { .. } | Phase::ReadingAloud { .. } => {}
            ref other => return Err(self.wrong_phase("go to the next question", other)),
        }
        self.current += 1;
        match self.questions.get(self.current) {
            Some(question) => {
                self.phase = Phase::for_question(question, rng);
                Ok(Some(question))
            }
            None => {
                self.phase = Phase::Finished;
                Ok(None)
            }
        }
    }

    pub fn summary(&self) -> Summary {
        let total = self.questions.len();
        let percent = if total == 0 {
            0
        } else {
            self.score * 100 / total
        };
        let stars = match percent {
            90.. => 3,
            60.. => 2,
            30.. => 1,
            _ => 0,
        };
        let reading_average = if self.readings.is_empty() {
            None
        } else {
            Some(self.readings.iter().map(|r| r.ratio).sum::<f64>() / self.readings.len() as f64)
        };
        Summary {
            score: self.score,
            total,
            stars,
            reading_average,
        }
    }

    fn sorting_mut(
        &mut self,
        action: &'static str,
    ) -> Result<(&mut SortingBoard, &mut Option<String>), QuizError> {
        let phase_name = self.phase.name();
        match &mut self.phase {
            Phase::Sorting { board, picked } => Ok((board, picked)),
            _ => Err(QuizError::WrongPhase {
                action,
                phase: phase_name,
            }),
        }
    }

    fn wrong_phase(&self, action: &'static str, phase: &Phase) -> QuizError {
        QuizError::WrongPhase {
            action,
            phase: phase.name(),
        }
    }
}
