mod config;
mod error;
mod handlers;
mod profile;
mod quiz;
mod render;

use std::sync::Arc;

use dotenv::dotenv;
use teloxide::{
    dispatching::{
        dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
        UpdateHandler,
    },
    prelude::*,
};

use config::Config;
use profile::Profile;
use quiz::{ai_helper::QuizHelper, bank::QuestionBank, session::Session};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerError = Box<dyn std::error::Error + Send + Sync>;
type HandlerResult = Result<(), HandlerError>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveName,
    ReceiveAdventure {
        profile: Profile,
    },
    ReceiveTopicChoice {
        profile: Profile,
    },
    ReceiveAmountOfQuestions {
        profile: Profile,
        topic: String,
    },
    InQuiz {
        profile: Profile,
        session: Session,
    },
}

type UserInfoStorage = std::sync::Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() {
    // A missing .env is fine, the variables may come from the environment.
    let _ = dotenv();
    pretty_env_logger::init();

    if let Err(e) = run().await {
        log::error!("Phonics bot stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> HandlerResult {
    let config = Config::from_env()?;
    log::info!("Starting phonics bot...");

    let bank = match &config.question_bank {
        Some(path) => {
            log::info!("Loading the question bank from {}", path.display());
            QuestionBank::load(path)?
        }
        None => QuestionBank::embedded()?,
    };
    log::info!(
        "Question bank loaded: {} topics, {} questions",
        bank.topics().len(),
        bank.question_count()
    );

    let quiz_helper = QuizHelper::from_config(&config)?;
    if quiz_helper.is_enabled() {
        log::info!("AI helper enabled ({})", quiz_helper.personality().name());
    } else {
        log::info!("CHATGPT_API_KEY is not set, using the static questions only");
    }

    let bot = Bot::from_env();

    log::info!("Opening dialogue storage at {}", config.db_path.display());
    let storage: UserInfoStorage = SqliteStorage::open(&config.db_path.to_string_lossy(), Json)
        .await?
        .erase();

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![storage, Arc::new(bank), Arc::new(quiz_helper)])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    Ok(())
}

fn schema() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .enter_dialogue::<Message, ErasedStorage<State>, State>()
        .branch(dptree::filter(|msg: Message| msg.text() == Some("/start")).endpoint(handlers::start))
        .branch(dptree::case![State::Start].endpoint(handlers::start))
        .branch(dptree::case![State::ReceiveName].endpoint(handlers::receive_name))
        .branch(dptree::case![State::ReceiveAdventure { profile }].endpoint(handlers::receive_adventure))
        .branch(
            dptree::case![State::ReceiveTopicChoice { profile }]
                .endpoint(handlers::receive_topic_choice),
        )
        .branch(
            dptree::case![State::ReceiveAmountOfQuestions { profile, topic }]
                .endpoint(handlers::receive_amount_of_questions),
        )
        .branch(dptree::case![State::InQuiz { profile, session }].endpoint(handlers::quiz_step))
}
