use std::str::FromStr;

use chatgpt::client::ChatGPT;
use chatgpt::config::{ChatGPTEngine, ModelConfiguration};
use chatgpt::types::CompletionResponse;

use crate::config::Config;
use crate::error::{AiError, ConfigError};
use crate::profile::Profile;
use crate::quiz::{Question, QuestionKind};

const MAX_CONTEXTUAL_PROMPT_CHARS: usize = 280;

pub struct QuizHelper {
    personality: Personality,
    chat_gpt: Option<ChatGPT>,
}

impl QuizHelper {
    pub fn new(chat_gpt: Option<ChatGPT>, personality: Personality) -> Self {
        Self {
            personality,
            chat_gpt,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AiError> {
        let chat_gpt = match &config.chatgpt_api_key {
            Some(key) => Some(ChatGPT::new_with_config(key, model_config(config))?),
            None => None,
        };
        Ok(Self::new(chat_gpt, config.buddy))
    }

    pub fn is_enabled(&self) -> bool {
        self.chat_gpt.is_some()
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }

    /// The question prompt woven into the learner's adventure, or the
    /// static prompt whenever that can't be done.
    pub async fn prompt_for(&self, question: &Question, profile: &Profile) -> String {
        if !self.is_enabled() || profile.recent_adventure().is_none() {
            return question.prompt.clone();
        }
        match self.contextual_prompt(question, profile).await {
            Ok(prompt) => prompt,
            Err(e) => {
                log::warn!("Using the static prompt: {}", e);
                question.prompt.clone()
            }
        }
    }

    /// A kind explanation after a wrong answer, falling back to the
    /// explanation stored with the question.
    pub async fn explain_mistake(&self, question: &Question, given: &str, profile: &Profile) -> String {
        if !self.is_enabled() {
            return fallback_explanation(question);
        }
        match self.encourage_after_wrong_answer(question, given, profile).await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("Using the static explanation: {}", e);
                fallback_explanation(question)
            }
        }
    }

    pub async fn contextual_prompt(
        &self,
        question: &Question,
        profile: &Profile,
    ) -> Result<String, AiError> {
        let adventure = profile
            .recent_adventure()
            .ok_or(AiError::Rejected("learner has no adventure yet"))?;
        let prompt = contextual_request(question, &profile.name, &adventure, self.personality);
        let reply = self.complete(&prompt).await?;
        accept_contextual_prompt(&question.prompt, &reply)
    }

    pub async fn encourage_after_wrong_answer(
        &self,
        question: &Question,
        given: &str,
        profile: &Profile,
    ) -> Result<String, AiError> {
        let prompt = format!(
            "You are a friendly reading buddy for a 5 to 7 year old child named {}.
        The child answered a {} question: \"{}\".
        The child answered \"{}\", but the right answer is \"{}\".
        Explain the sound or the word in one or two very short, happy sentences a young child can understand. Never say the child is bad at this.
        Talk like {}.",
            profile.name,
            question.kind.name(),
            question_text(question),
            given,
            question.expected_answer(),
            self.personality.get_personality()
        );
        let reply = self.complete(&prompt).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(AiError::Rejected("empty reply"));
        }
        Ok(reply.to_string())
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let chat_gpt = self.chat_gpt.as_ref().ok_or(AiError::Disabled)?;
        log::debug!("Sending prompt: {:?}", prompt);

        let response: CompletionResponse = chat_gpt.send_message(prompt).await?;
        let content = response.message().clone().content;

        log::debug!("Completion: {:?}", content);
        Ok(content)
    }
}

// The timeout is baked into the HTTP client, so it must be set before the
// client is built.
fn model_config(config: &Config) -> ModelConfiguration {
    ModelConfiguration {
        engine: ChatGPTEngine::Gpt35Turbo,
        timeout: config.ai_timeout,
        ..Default::default()
    }
}

fn contextual_request(question: &Question, name: &str, adventure: &str, personality: Personality) -> String {
    format!(
        "You are a reading buddy who helps young children learn phonics.
        The child, {}, told you about their adventure: \"{}\".
        Rewrite this quiz question so it happens inside that adventure: \"{}\".
        Keep every word the question asks about exactly as written, keep any _ blanks, do not give away the answer, and do not list the answer options.
        Use at most two short sentences. Talk like {}.",
        name,
        adventure,
        question.prompt,
        personality.get_personality()
    )
}

/// Checks a rewritten prompt before it is shown to a child.
pub fn accept_contextual_prompt(original: &str, reply: &str) -> Result<String, AiError> {
    let reply = reply.trim().trim_matches('"').trim();
    if reply.is_empty() {
        return Err(AiError::Rejected("empty reply"));
    }
    if reply.chars().count() > MAX_CONTEXTUAL_PROMPT_CHARS {
        return Err(AiError::Rejected("reply is too long"));
    }
    if original.contains('_') && !reply.contains('_') {
        return Err(AiError::Rejected("reply lost the blank"));
    }
    Ok(reply.to_string())
}

pub fn fallback_explanation(question: &Question) -> String {
    let expected = match question.kind {
        QuestionKind::Sorting { .. } => format!("Here is where the words go:\n{}", question.expected_answer()),
        _ => format!("The right answer is \"{}\".", question.expected_answer()),
    };
    match &question.explanation {
        Some(explanation) => format!("{}\n{}", expected, explanation),
        None => expected,
    }
}

fn question_text(question: &Question) -> &str {
    match &question.kind {
        QuestionKind::Reading { question, .. } => question,
        _ => &question.prompt,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Personality {
    #[default]
    Owl,
    Dragon,
    Robot,
}
impl Personality {
    pub fn get_personality(&self) -> String {
        match self {
            Personality::Owl => "Ollie, a wise and gentle owl who loves books",
            Personality::Dragon => "Dot, a silly little dragon who giggles a lot",
            Personality::Robot => "Beep, a cheerful robot who loves letters and sounds",
        }
        .to_string()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Personality::Owl => "Ollie the Owl 🦉",
            Personality::Dragon => "Dot the Dragon 🐉",
            Personality::Robot => "Beep the Robot 🤖",
        }
    }
}

impl FromStr for Personality {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owl" => Ok(Personality::Owl),
            "dragon" => Ok(Personality::Dragon),
            "robot" => Ok(Personality::Robot),
            _ => Err(ConfigError::UnknownBuddy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_question() -> Question {
        let mut q = Question::new(
            "The c_t naps. Which vowel is missing?".to_string(),
            QuestionKind::FillBlank {
                answer: "a".to_string(),
            },
        );
        q.explanation = Some("Cat has a short a.".to_string());
        q
    }

    #[test]
    fn contextual_prompt_is_trimmed_and_unquoted() {
        let accepted =
            accept_contextual_prompt("Which word rhymes with hat?", "  \"On the pirate ship, which word rhymes with hat?\" ")
                .unwrap();
        assert_eq!(accepted, "On the pirate ship, which word rhymes with hat?");
    }

    #[test]
    fn contextual_prompt_must_keep_the_blank() {
        assert!(matches!(
            accept_contextual_prompt(&blank_question().prompt, "The cat naps on the ship!"),
            Err(AiError::Rejected(_))
        ));
        assert!(accept_contextual_prompt(&blank_question().prompt, "Captain Mia's c_t naps. Which vowel is missing?").is_ok());
    }

    #[test]
    fn empty_or_long_replies_are_rejected() {
        assert!(accept_contextual_prompt("Pick one", "   ").is_err());
        assert!(accept_contextual_prompt("Pick one", &"a".repeat(281)).is_err());
        assert!(accept_contextual_prompt("Pick one", &"a".repeat(280)).is_ok());
    }

    #[test]
    fn fallback_explanation_names_the_answer() {
        assert_eq!(
            fallback_explanation(&blank_question()),
            "The right answer is \"a\".\nCat has a short a."
        );
    }

    #[test]
    fn contextual_request_mentions_the_adventure() {
        let request = contextual_request(&blank_question(), "Mia", "I sail a pirate ship.", Personality::Robot);
        assert!(request.contains("I sail a pirate ship."));
        assert!(request.contains("The c_t naps."));
        assert!(request.contains("Beep"));
    }

    #[test]
    fn buddy_names_parse() {
        assert_eq!("Owl".parse::<Personality>(), Ok(Personality::Owl));
        assert_eq!(" robot ".parse::<Personality>(), Ok(Personality::Robot));
        assert!("cat".parse::<Personality>().is_err());
    }

    fn config_with_timeout(secs: u64) -> Config {
        Config {
            chatgpt_api_key: Some("sk-test".to_string()),
            ai_timeout: std::time::Duration::from_secs(secs),
            db_path: "db.sqlite".into(),
            question_bank: None,
            buddy: Personality::Owl,
        }
    }

    #[test]
    fn model_config_carries_the_timeout() {
        let model = model_config(&config_with_timeout(3));
        assert_eq!(model.timeout, std::time::Duration::from_secs(3));
        assert_eq!(model.engine, ChatGPTEngine::Gpt35Turbo);
        assert!(QuizHelper::from_config(&config_with_timeout(3)).unwrap().is_enabled());
    }

    #[tokio::test]
    async fn silent_server_times_out_at_the_configured_limit() {
        // Accepts connections (through the backlog) but never answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut model = model_config(&config_with_timeout(1));
        model.api_url = format!("http://127.0.0.1:{}/v1/chat/completions", port)
            .parse()
            .unwrap();
        let gpt = ChatGPT::new_with_config("sk-test", model).unwrap();
        let helper = QuizHelper::new(Some(gpt), Personality::Owl);

        let started = std::time::Instant::now();
        let reply = helper.complete("Say hi").await;
        let elapsed = started.elapsed();

        assert!(matches!(reply, Err(AiError::ChatGpt(_))));
        assert!(elapsed >= std::time::Duration::from_millis(900), "gave up too early: {:?}", elapsed);
        assert!(elapsed < std::time::Duration::from_secs(5), "timeout ignored: {:?}", elapsed);
        drop(listener);
    }

    #[tokio::test]
    async fn disabled_helper_falls_back_to_static_text() {
        let helper = QuizHelper::new(None, Personality::Owl);
        let mut profile = Profile::new("Mia".to_string());
        profile.add_adventure("I fly a rocket.");

        assert!(!helper.is_enabled());
        assert_eq!(helper.prompt_for(&blank_question(), &profile).await, blank_question().prompt);
        assert_eq!(
            helper.explain_mistake(&blank_question(), "o", &profile).await,
            fallback_explanation(&blank_question())
        );
        assert!(matches!(
            helper.contextual_prompt(&blank_question(), &profile).await,
            Err(AiError::Disabled)
        ));
    }
}
