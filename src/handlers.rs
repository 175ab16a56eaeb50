use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{ChatAction, KeyboardRemove, ParseMode},
    utils::html::escape,
};

use crate::error::{QuizError, SortingError};
use crate::profile::Profile;
use crate::quiz::ai_helper::QuizHelper;
use crate::quiz::bank::QuestionBank;
use crate::quiz::session::{Feedback, Phase, Session};
use crate::quiz::{QuestionKind, Response};
use crate::render;
use crate::{HandlerResult, QuizDialogue, State};

const MAX_NAME_CHARS: usize = 32;

pub async fn start(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    quiz_helper: Arc<QuizHelper>,
) -> HandlerResult {
    let greeting = format!(
        "Hi! I am {}. Let's play with letters and sounds! What is your name?",
        quiz_helper.personality().name()
    );
    bot.send_message(msg.chat.id, greeting)
        .reply_markup(KeyboardRemove::new())
        .await?;

    dialogue.update(State::ReceiveName).await?;
    Ok(())
}

pub async fn receive_name(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    let name = match msg.text().map(str::trim).filter(|t| !t.is_empty()) {
        Some(name) => name.chars().take(MAX_NAME_CHARS).collect::<String>(),
        None => {
            bot.send_message(msg.chat.id, "Please type your name.").await?;
            return Ok(());
        }
    };

    bot.send_message(
        msg.chat.id,
        format!(
            "Nice to meet you, {}! 👋\nTell me about an adventure you would like to go on. \
             (For example: \"I sail a pirate ship with my cat.\")",
            name
        ),
    )
    .reply_markup(render::single_button(render::SKIP_ADVENTURE))
    .await?;

    dialogue
        .update(State::ReceiveAdventure {
            profile: Profile::new(name),
        })
        .await?;
    Ok(())
}

pub async fn receive_adventure(
    bot: Bot,
    dialogue: QuizDialogue,
    mut profile: Profile,
    msg: Message,
    bank: Arc<QuestionBank>,
) -> HandlerResult {
    let reply = match msg.text() {
        Some(render::SKIP_ADVENTURE) => "Okay! Maybe next time.".to_string(),
        Some(line) if !line.trim().is_empty() => {
            profile.add_adventure(line);
            log::debug!("{} has {} adventure lines", profile.name, profile.adventure.len());
            "What a great adventure! 🚀 I will bring it into our questions.".to_string()
        }
        _ => {
            bot.send_message(msg.chat.id, "Please tell me your adventure with words.")
                .await?;
            return Ok(());
        }
    };

    bot.send_message(msg.chat.id, format!("{}\nWhat would you like to practise?", reply))
        .reply_markup(render::topic_menu(&bank))
        .await?;

    dialogue.update(State::ReceiveTopicChoice { profile }).await?;
    Ok(())
}

pub async fn receive_topic_choice(
    bot: Bot,
    dialogue: QuizDialogue,
    profile: Profile,
    msg: Message,
    bank: Arc<QuestionBank>,
) -> HandlerResult {
    match msg.text() {
        Some(render::NEW_ADVENTURE) => {
            bot.send_message(msg.chat.id, "Where is your adventure taking you now?")
                .reply_markup(render::single_button(render::SKIP_ADVENTURE))
                .await?;
            dialogue.update(State::ReceiveAdventure { profile }).await?;
        }
        Some(text) => match bank.topic(text) {
            Some(topic) => {
                bot.send_message(
                    msg.chat.id,
                    format!("{}! How many questions?", topic.label()),
                )
                .reply_markup(render::amount_menu())
                .await?;
                dialogue
                    .update(State::ReceiveAmountOfQuestions {
                        profile,
                        topic: topic.id.clone(),
                    })
                    .await?;
            }
            None => {
                bot.send_message(msg.chat.id, "Please pick one of the buttons.")
                    .reply_markup(render::topic_menu(&bank))
                    .await?;
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Please pick one of the buttons.")
                .await?;
        }
    }
    Ok(())
}

pub async fn receive_amount_of_questions(
    bot: Bot,
    dialogue: QuizDialogue,
    (profile, topic_id): (Profile, String),
    msg: Message,
    bank: Arc<QuestionBank>,
    quiz_helper: Arc<QuizHelper>,
) -> HandlerResult {
    let amount = match msg.text().map(|t| t.trim().parse::<usize>()) {
        Some(Ok(amount)) if amount > 0 => amount,
        Some(Ok(_)) => {
            bot.send_message(msg.chat.id, "We need at least one question!")
                .await?;
            return Ok(());
        }
        _ => {
            bot.send_message(msg.chat.id, "Please tap a number.")
                .reply_markup(render::amount_menu())
                .await?;
            return Ok(());
        }
    };

    let topic = match bank.topic(&topic_id) {
        Some(topic) => topic,
        None => {
            log::warn!("Topic {} disappeared from the question bank", topic_id);
            return back_to_menu(bot, dialogue, profile, &bank, "Let's pick a topic again.").await;
        }
    };

    let questions = bank.draw(topic, amount, &mut rand::thread_rng());
    let session = Session::new(topic.title.clone(), questions, &mut rand::thread_rng())?;
    log::info!(
        "{} started \"{}\" with {} questions",
        profile.name,
        session.topic,
        session.questions.len()
    );

    let mut intro = "Great! Let's start! 🚀".to_string();
    if session.questions.len() < amount {
        intro = format!(
            "This topic has {} questions, so we will do all of them. Let's start! 🚀",
            session.questions.len()
        );
    }
    bot.send_message(msg.chat.id, intro).await?;

    present_question(&bot, msg.chat.id, &session, &profile, &quiz_helper).await?;
    dialogue.update(State::InQuiz { profile, session }).await?;
    Ok(())
}

/// Everything that happens while a quiz is running.
pub async fn quiz_step(
    bot: Bot,
    dialogue: QuizDialogue,
    (profile, mut session): (Profile, Session),
    msg: Message,
    bank: Arc<QuestionBank>,
    quiz_helper: Arc<QuizHelper>,
) -> HandlerResult {
    let text = match msg.text() {
        Some(text) => text.trim().to_string(),
        None if msg.voice().is_some() => {
            bot.send_message(
                msg.chat.id,
                "I can't listen to voice notes yet. Tap the 🎤 on your keyboard to turn your voice into text!",
            )
            .await?;
            return Ok(());
        }
        None => {
            bot.send_message(msg.chat.id, "Please answer with the buttons or by typing.")
                .await?;
            return Ok(());
        }
    };

    if text == render::STOP || text == "/stop" {
        log::info!("{} stopped \"{}\" early", profile.name, session.topic);
        let summary = session.summary();
        let goodbye = format!(
            "Let's stop here. You got {} right so far. See you soon! 👋",
            summary.score
        );
        return back_to_menu(bot, dialogue, profile, &bank, &goodbye).await;
    }

    if text == render::LISTEN {
        if let Some(audio) = session.current_question().and_then(|q| q.audio.clone()) {
            bot.send_message(msg.chat.id, format!("🔊 {}", audio)).await?;
        }
        return Ok(());
    }

    match session.phase.clone() {
        Phase::Asking => {
            let question = match session.current_question().cloned() {
                Some(question) => question,
                None => return finish(bot, dialogue, profile, session, &bank).await,
            };
            if text == render::HINT {
                let hint = question.hint.as_deref().unwrap_or("Say the word slowly, sound by sound.");
                bot.send_message(msg.chat.id, format!("💡 {}", hint)).await?;
                return Ok(());
            }

            let response = match &question.kind {
                QuestionKind::FillBlank { .. } => Response::Typed(text.clone()),
                _ => match question.choice_index(&text) {
                    Some(index) => Response::Choice(index),
                    None => {
                        bot.send_message(msg.chat.id, "Please tap one of the answers.")
                            .reply_markup(render::question_keyboard(&question))
                            .await?;
                        return Ok(());
                    }
                },
            };
            let feedback = session.submit(response)?;
            send_feedback(&bot, msg.chat.id, &session, &profile, &quiz_helper, &feedback, &text).await?;
        }
        Phase::Sorting { picked, .. } => {
            sorting_step(&bot, msg.chat.id, &mut session, &profile, &quiz_helper, &text, picked).await?;
        }
        Phase::Reviewing { .. } | Phase::ReadingAloud { .. } if text == render::NEXT => {
            session.advance(&mut rand::thread_rng())?;
            if session.is_finished() {
                return finish(bot, dialogue, profile, session, &bank).await;
            }
            present_question(&bot, msg.chat.id, &session, &profile, &quiz_helper).await?;
        }
        Phase::Reviewing { .. } if text == render::READ_ALOUD && session.can_read_aloud() => {
            let passage = session.start_reading_aloud()?.to_string();
            bot.send_message(
                msg.chat.id,
                format!(
                    "🎤 Read the story out loud. Tap the microphone on your keyboard so I can see your words, then send them.\n\n📖 <i>{}</i>",
                    escape(&passage)
                ),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(render::single_button(render::NEXT))
            .await?;
        }
        Phase::Reviewing { .. } => {
            bot.send_message(msg.chat.id, "Tap ➡️ Next when you are ready.")
                .reply_markup(render::feedback_keyboard(session.can_read_aloud()))
                .await?;
            return Ok(());
        }
        Phase::ReadingAloud { .. } => {
            let result = session.record_reading(&text)?;
            log::info!("{} read aloud with {}% of the words", profile.name, result.percent());
            bot.send_message(msg.chat.id, render::reading_text(&result))
                .reply_markup(render::feedback_keyboard(session.can_read_aloud()))
                .await?;
        }
        Phase::Finished => return finish(bot, dialogue, profile, session, &bank).await,
    }

    dialogue.update(State::InQuiz { profile, session }).await?;
    Ok(())
}

async fn sorting_step(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut Session,
    profile: &Profile,
    quiz_helper: &QuizHelper,
    text: &str,
    picked: Option<String>,
) -> HandlerResult {
    let outcome = match text {
        render::RESTART_BOARD => session.restart_board().map(|_| "Everything is back on the pile.".to_string()),
        render::BACK_TO_PILE => session
            .return_picked()
            .map(|word| format!("\"{}\" is back on the pile.", word)),
        render::CHECK_BOARD => match session.check_board() {
            Ok(feedback) => {
                let given = if feedback.misplaced.is_empty() {
                    String::new()
                } else {
                    format!("put {} in the wrong box", feedback.misplaced.join(", "))
                };
                return send_feedback(bot, chat_id, session, profile, quiz_helper, &feedback, &given).await;
            }
            Err(e) => Err(e),
        },
        _ if picked.is_some() && !session.is_word_on_board(text) => session
            .drop_into(text)
            .map(|word| format!("\"{}\" goes into {}.", word, text)),
        _ => session
            .pick(text)
            .map(|_| format!("Where does \"{}\" go?", text)),
    };

    let reply = match outcome {
        Ok(reply) => reply,
        Err(QuizError::Sorting(e)) => {
            log::debug!("Sorting move refused: {}", e);
            match e {
                SortingError::Incomplete(_) => format!("Almost! {}.", e),
                _ => format!("Oops, {}. Try the buttons.", e),
            }
        }
        Err(e) => return Err(e.into()),
    };

    let (board, picked) = match session.board() {
        Some(board) => board,
        None => return Ok(()),
    };
    let has_audio = session
        .current_question()
        .map(|q| q.audio.is_some())
        .unwrap_or(false);
    bot.send_message(chat_id, format!("{}\n\n{}", escape(&reply), render::board_status(board)))
        .parse_mode(ParseMode::Html)
        .reply_markup(render::sorting_keyboard(board, picked, has_audio))
        .await?;
    Ok(())
}

async fn present_question(
    bot: &Bot,
    chat_id: ChatId,
    session: &Session,
    profile: &Profile,
    quiz_helper: &QuizHelper,
) -> HandlerResult {
    let question = match session.current_question() {
        Some(question) => question,
        None => return Ok(()),
    };

    if quiz_helper.is_enabled() {
        // Only cosmetic, so a failure here doesn't matter.
        let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;
    }
    let prompt = quiz_helper.prompt_for(question, profile).await;
    let mut text = render::question_text(
        question,
        &prompt,
        session.current + 1,
        session.questions.len(),
    );

    let keyboard = match session.board() {
        Some((board, picked)) => {
            text.push_str("\n\n");
            text.push_str(&render::board_status(board));
            render::sorting_keyboard(board, picked, question.audio.is_some())
        }
        None => render::question_keyboard(question),
    };

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

async fn send_feedback(
    bot: &Bot,
    chat_id: ChatId,
    session: &Session,
    profile: &Profile,
    quiz_helper: &QuizHelper,
    feedback: &Feedback,
    given: &str,
) -> HandlerResult {
    let text = if feedback.correct {
        let mut text = format!("✅ Yes! Well done, {}!", profile.name);
        if let Some(explanation) = &feedback.explanation {
            text.push_str(&format!("\n{}", explanation));
        }
        text
    } else {
        let question = match session.current_question() {
            Some(question) => question,
            None => return Ok(()),
        };
        if quiz_helper.is_enabled() {
            let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;
        }
        let explanation = quiz_helper.explain_mistake(question, given, profile).await;
        format!("❌ Not quite!\n\n{}", explanation)
    };

    bot.send_message(chat_id, text)
        .reply_markup(render::feedback_keyboard(session.can_read_aloud()))
        .await?;
    Ok(())
}

async fn finish(
    bot: Bot,
    dialogue: QuizDialogue,
    profile: Profile,
    session: Session,
    bank: &QuestionBank,
) -> HandlerResult {
    let summary = session.summary();
    log::info!(
        "{} finished \"{}\": {}/{}",
        profile.name,
        session.topic,
        summary.score,
        summary.total
    );
    let text = format!(
        "{}\n\nWhat would you like to practise next?",
        render::summary_text(&profile.name, &summary)
    );
    back_to_menu(bot, dialogue, profile, bank, &text).await
}

async fn back_to_menu(
    bot: Bot,
    dialogue: QuizDialogue,
    profile: Profile,
    bank: &QuestionBank,
    text: &str,
) -> HandlerResult {
    bot.send_message(dialogue.chat_id(), text)
        .reply_markup(render::topic_menu(bank))
        .await?;
    dialogue.update(State::ReceiveTopicChoice { profile }).await?;
    Ok(())
}
