use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::quiz::ai_helper::Personality;

const DEFAULT_DB_PATH: &str = "db.sqlite";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 15;

/// Runtime settings, read from the environment (and `.env`).
/// The Telegram token itself is picked up by teloxide from `TELOXIDE_TOKEN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub chatgpt_api_key: Option<String>,
    pub ai_timeout: Duration,
    pub db_path: PathBuf,
    pub question_bank: Option<PathBuf>,
    pub buddy: Personality,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let ai_timeout = match get("CHATGPT_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidTimeout {
                    name: "CHATGPT_TIMEOUT_SECS",
                    value,
                })?,
            None => Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
        };

        let buddy = match get("PHONICS_BUDDY") {
            Some(value) => value.parse::<Personality>()?,
            None => Personality::default(),
        };

        Ok(Self {
            chatgpt_api_key: get("CHATGPT_API_KEY"),
            ai_timeout,
            db_path: get("PHONICS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            question_bank: get("PHONICS_QUESTION_BANK").map(PathBuf::from),
            buddy,
        })
    }
}
