use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("this answer does not fit a {0} question")]
    ResponseMismatch(&'static str),

    #[error("can't {action} right now (quiz is {phase})")]
    WrongPhase {
        action: &'static str,
        phase: &'static str,
    },

    #[error("a quiz needs at least one question")]
    EmptySession,

    #[error("the quiz is already over")]
    Finished,

    #[error(transparent)]
    Sorting(#[from] SortingError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SortingError {
    #[error("there is no word \"{0}\" on the board")]
    UnknownWord(String),

    #[error("there is no box called \"{0}\"")]
    UnknownBin(String),

    #[error("\"{0}\" is not in a box yet")]
    NotPlaced(String),

    #[error("pick a word first")]
    NothingPicked,

    #[error("{0} word(s) still need a box")]
    Incomplete(usize),
}

#[derive(Error, Debug)]
pub enum BankError {
    #[error("Unable to read the question bank: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to parse the question bank: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("The question bank has no topics")]
    NoTopics,

    #[error("Topic id \"{0}\" is used more than once")]
    DuplicateTopic(String),

    #[error("Topic \"{topic}\", question {question}: {reason}")]
    InvalidQuestion {
        topic: String,
        question: usize,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI helper is disabled (no API key)")]
    Disabled,

    #[error(transparent)]
    ChatGpt(#[from] chatgpt::err::Error),

    #[error("AI reply was rejected: {0}")]
    Rejected(&'static str),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a whole number of seconds, got \"{value}\"")]
    InvalidTimeout { name: &'static str, value: String },

    #[error("Unknown reading buddy \"{0}\" (expected owl, dragon or robot)")]
    UnknownBuddy(String),
}
