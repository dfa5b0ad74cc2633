//! Vacancy drafting conversation built on `ChatController`.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{info, warn};

use crate::bot::controller::{CallbackAnswer, ChatController, Outgoing};
use crate::bot::database::Database;
use crate::bot::error::BotError;
use crate::bot::event::Incoming;
use crate::bot::format::html_escape;
use crate::bot::keyboard::InlineKeyboard;
use crate::bot::messages::messages;
use crate::bot::steps::{BotUserStep, CallbackData, VacancyStatus};
use crate::bot::telegram::BotApi;

/// Longest text kept for a single vacancy field.
const MAX_FIELD_CHARS: usize = 1000;

/// Callbacks edit the message the button was on; typed messages get a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Respond {
    Send,
    Edit,
}

/// Handle one inbound event to completion.
pub async fn handle<A: BotApi>(api: &A, db: &Database, event: Incoming) -> Result<(), BotError> {
    let mut ctl = ChatController::new(api, db, event)?;
    ctl.sync_user()?;

    if ctl.event().is_callback() {
        handle_callback(&mut ctl).await
    } else {
        handle_text(&mut ctl).await
    }
}

async fn handle_callback<A: BotApi>(ctl: &mut ChatController<'_, A>) -> Result<(), BotError> {
    let Some(action) = ctl.callback() else {
        warn!("Unknown callback data {:?} from {}", ctl.callback_data(), ctl.chat_id());
        return ctl.answer_callback(CallbackAnswer::code("unknown_command")).await;
    };

    // Answer before editing so the button spinner stops even if the edit fails.
    let refused = action == CallbackData::PublishVacancy && ctl.step() != BotUserStep::VacancyPreview;
    let answer = if refused {
        CallbackAnswer::code("unknown_command").alert()
    } else {
        CallbackAnswer::silent()
    };
    if let Err(e) = ctl.answer_callback(answer).await {
        warn!("Failed to answer callback from {}: {e}", ctl.chat_id());
    }
    if refused {
        return Ok(());
    }

    match action {
        CallbackData::MainMenuButton => {
            ctl.set_step(BotUserStep::MainMenu)?;
            show_main_menu(ctl, Respond::Edit).await
        }
        CallbackData::NewVacancy => {
            ctl.vacancy()?;
            ctl.set_step(BotUserStep::VacancyTitle)?;
            prompt(ctl, Respond::Edit).await
        }
        CallbackData::BackButton => back(ctl, Respond::Edit).await,
        CallbackData::CancelButton => cancel(ctl, Respond::Edit).await,
        CallbackData::PublishVacancy => publish(ctl).await,
    }
}

async fn handle_text<A: BotApi>(ctl: &mut ChatController<'_, A>) -> Result<(), BotError> {
    let text = ctl.message_text().unwrap_or("").trim().to_string();

    if command(&text) == Some("/start") {
        ctl.set_step(BotUserStep::MainMenu)?;
        let name = html_escape(&ctl.event().sender.first_name);
        let keyboard = main_menu_keyboard();
        ctl.send_message(Outgoing::code("start").arg(name).markup(keyboard)).await?;
        return Ok(());
    }

    if text == ctl.main_menu_reply_button().text {
        ctl.set_step(BotUserStep::MainMenu)?;
        return show_main_menu(ctl, Respond::Send).await;
    }

    if text == ctl.cancel_reply_button().text {
        return cancel(ctl, Respond::Send).await;
    }

    if text == ctl.back_reply_button().text {
        return back(ctl, Respond::Send).await;
    }

    let step = ctl.step();
    if step.collects_text() && !text.is_empty() {
        let value: String = text.chars().take(MAX_FIELD_CHARS).collect();
        let mut vacancy = ctl.vacancy()?;
        match step {
            BotUserStep::VacancyTitle => vacancy.title = Some(value),
            BotUserStep::VacancyDescription => vacancy.description = Some(value),
            BotUserStep::VacancySalary => vacancy.salary = Some(value),
            BotUserStep::VacancyContacts => vacancy.contacts = Some(value),
            BotUserStep::MainMenu | BotUserStep::VacancyPreview => {}
        }
        ctl.save_vacancy(&vacancy)?;
        ctl.set_step(step.next())?;
        return prompt(ctl, Respond::Send).await;
    }

    let keyboard = main_menu_keyboard();
    ctl.send_message(Outgoing::code("unknown_command").markup(keyboard)).await?;
    Ok(())
}

/// The command word of a message: `/start ref` and `/start@vacancybot` both give `/start`.
fn command(text: &str) -> Option<&str> {
    let word = text.split_whitespace().next()?;
    if !word.starts_with('/') {
        return None;
    }
    Some(word.split_once('@').map_or(word, |(cmd, _)| cmd))
}

async fn respond<A: BotApi>(ctl: &ChatController<'_, A>, out: Outgoing, mode: Respond) -> Result<(), BotError> {
    match mode {
        Respond::Send => ctl.send_message(out).await.map(|_| ()),
        Respond::Edit => ctl.edit_message(out).await.map(|_| ()),
    }
}

async fn show_main_menu<A: BotApi>(ctl: &ChatController<'_, A>, mode: Respond) -> Result<(), BotError> {
    let keyboard = main_menu_keyboard();
    respond(ctl, Outgoing::code("main_menu_text").markup(keyboard), mode).await
}

async fn back<A: BotApi>(ctl: &mut ChatController<'_, A>, mode: Respond) -> Result<(), BotError> {
    let step = ctl.step().previous();
    ctl.set_step(step)?;
    prompt(ctl, mode).await
}

async fn cancel<A: BotApi>(ctl: &mut ChatController<'_, A>, mode: Respond) -> Result<(), BotError> {
    ctl.set_step(BotUserStep::MainMenu)?;
    let keyboard = main_menu_keyboard();
    respond(ctl, Outgoing::code("cancelled").markup(keyboard), mode).await
}

/// Ask for whatever the current step needs.
async fn prompt<A: BotApi>(ctl: &ChatController<'_, A>, mode: Respond) -> Result<(), BotError> {
    let code = match ctl.step() {
        BotUserStep::MainMenu => return show_main_menu(ctl, mode).await,
        BotUserStep::VacancyPreview => return preview(ctl, mode).await,
        BotUserStep::VacancyTitle => "ask_title",
        BotUserStep::VacancyDescription => "ask_description",
        BotUserStep::VacancySalary => "ask_salary",
        BotUserStep::VacancyContacts => "ask_contacts",
    };

    let keyboard = InlineKeyboard::new(2)
        .add([ctl.back_inline_button(), ctl.cancel_inline_button()])
        .build();
    respond(ctl, Outgoing::code(code).markup(keyboard), mode).await
}

async fn preview<A: BotApi>(ctl: &ChatController<'_, A>, mode: Respond) -> Result<(), BotError> {
    let vacancy = ctl.vacancy()?;
    let fields = [&vacancy.title, &vacancy.description, &vacancy.salary, &vacancy.contacts]
        .map(|field| html_escape(field.as_deref().unwrap_or("—")));

    let label = messages("publish_button").unwrap_or("publish_button");
    let keyboard = InlineKeyboard::new(2)
        .row([InlineKeyboardButton::callback(label, CallbackData::PublishVacancy.as_str())])
        .add([ctl.back_inline_button(), ctl.cancel_inline_button()])
        .build();

    respond(ctl, Outgoing::code("vacancy_preview").args(fields).markup(keyboard), mode).await
}

async fn publish<A: BotApi>(ctl: &mut ChatController<'_, A>) -> Result<(), BotError> {
    let mut vacancy = ctl.vacancy()?;
    vacancy.status = VacancyStatus::Moderation;
    ctl.save_vacancy(&vacancy)?;
    ctl.set_step(BotUserStep::MainMenu)?;
    info!("📨 Vacancy {} from user {} sent to moderation", vacancy.id, ctl.chat_id());

    let keyboard = main_menu_keyboard();
    respond(ctl, Outgoing::code("vacancy_sent").markup(keyboard), Respond::Edit).await
}

fn main_menu_keyboard() -> InlineKeyboardMarkup {
    let label = messages("new_vacancy_button").unwrap_or("new_vacancy_button");
    InlineKeyboard::new(1)
        .add([InlineKeyboardButton::callback(label, CallbackData::NewVacancy.as_str())])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::event::{EventKind, Sender};
    use crate::bot::testing::{ApiCall, RecordingApi};

    const CHAT: i64 = 42;

    fn sender() -> Sender {
        Sender { id: CHAT, first_name: "Ann <3".to_string(), username: Some("ann".to_string()) }
    }

    fn text(text: &str) -> Incoming {
        Incoming {
            sender: sender(),
            message_id: Some(7),
            kind: EventKind::Message { text: Some(text.to_string()) },
        }
    }

    fn press(data: CallbackData) -> Incoming {
        Incoming {
            sender: sender(),
            message_id: Some(9),
            kind: EventKind::Callback { id: "cbq".to_string(), data: Some(data.as_str().to_string()) },
        }
    }

    fn step(db: &Database) -> BotUserStep {
        db.find_user(CHAT).unwrap().unwrap().step
    }

    #[tokio::test]
    async fn test_start_greets_and_resets_step() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();
        db.get_or_create_user(CHAT).unwrap();
        db.set_user_step(CHAT, BotUserStep::VacancySalary).unwrap();

        handle(&api, &db, text("/start")).await.unwrap();

        assert_eq!(step(&db), BotUserStep::MainMenu);
        let texts = api.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("Ann &lt;3"));

        let user = db.find_user(CHAT).unwrap().unwrap();
        assert_eq!(user.name.as_deref(), Some("Ann <3"));
    }

    #[tokio::test]
    async fn test_full_vacancy_flow() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();

        handle(&api, &db, text("/start")).await.unwrap();
        handle(&api, &db, press(CallbackData::NewVacancy)).await.unwrap();
        assert_eq!(step(&db), BotUserStep::VacancyTitle);

        handle(&api, &db, text("Rust <developer>")).await.unwrap();
        assert_eq!(step(&db), BotUserStep::VacancyDescription);
        handle(&api, &db, text("Write services")).await.unwrap();
        handle(&api, &db, text("5000 EUR")).await.unwrap();
        handle(&api, &db, text("@hr")).await.unwrap();
        assert_eq!(step(&db), BotUserStep::VacancyPreview);

        let preview = api.texts().last().cloned().unwrap();
        assert!(preview.contains("<b>Rust &lt;developer&gt;</b>"));
        assert!(preview.contains("5000 EUR"));
        assert!(preview.contains("@hr"));

        handle(&api, &db, press(CallbackData::PublishVacancy)).await.unwrap();
        assert_eq!(step(&db), BotUserStep::MainMenu);
        assert_eq!(api.texts().last().map(String::as_str), messages("vacancy_sent"));

        let vacancies = db.vacancies_for_user(CHAT).unwrap();
        assert_eq!(vacancies.len(), 1);
        assert_eq!(vacancies[0].status, VacancyStatus::Moderation);
        assert_eq!(vacancies[0].title.as_deref(), Some("Rust <developer>"));
        assert_eq!(vacancies[0].contacts.as_deref(), Some("@hr"));
    }

    #[tokio::test]
    async fn test_callbacks_are_answered_and_edit_in_place() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();

        handle(&api, &db, press(CallbackData::NewVacancy)).await.unwrap();

        let calls = api.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], ApiCall::AnswerCallback { id, .. } if id == "cbq"));
        assert!(matches!(&calls[1], ApiCall::Edit { message_id: 9, .. }));
    }

    #[tokio::test]
    async fn test_back_returns_to_previous_prompt() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();
        db.get_or_create_user(CHAT).unwrap();
        db.set_user_step(CHAT, BotUserStep::VacancySalary).unwrap();

        handle(&api, &db, press(CallbackData::BackButton)).await.unwrap();
        assert_eq!(step(&db), BotUserStep::VacancyDescription);
        assert_eq!(api.texts()[0], messages("ask_description").unwrap());

        handle(&api, &db, press(CallbackData::BackButton)).await.unwrap();
        handle(&api, &db, press(CallbackData::BackButton)).await.unwrap();
        assert_eq!(step(&db), BotUserStep::MainMenu);
        assert_eq!(api.texts().last().map(String::as_str), messages("main_menu_text"));
    }

    #[tokio::test]
    async fn test_cancel_by_button_and_by_label() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();
        db.get_or_create_user(CHAT).unwrap();

        db.set_user_step(CHAT, BotUserStep::VacancyTitle).unwrap();
        handle(&api, &db, press(CallbackData::CancelButton)).await.unwrap();
        assert_eq!(step(&db), BotUserStep::MainMenu);

        db.set_user_step(CHAT, BotUserStep::VacancyContacts).unwrap();
        handle(&api, &db, text(messages("cancel").unwrap())).await.unwrap();
        assert_eq!(step(&db), BotUserStep::MainMenu);

        let cancelled = messages("cancelled").unwrap();
        assert_eq!(api.texts().iter().filter(|t| t.as_str() == cancelled).count(), 2);
    }

    #[tokio::test]
    async fn test_main_menu_label_from_any_step() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();
        db.get_or_create_user(CHAT).unwrap();
        db.set_user_step(CHAT, BotUserStep::VacancyDescription).unwrap();

        handle(&api, &db, text(messages("main menu").unwrap())).await.unwrap();
        assert_eq!(step(&db), BotUserStep::MainMenu);
        assert!(db.vacancies_for_user(CHAT).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_text_in_main_menu_is_unknown() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();

        handle(&api, &db, text("hello?")).await.unwrap();
        assert_eq!(api.texts(), vec![messages("unknown_command").unwrap().to_string()]);
        assert!(db.vacancies_for_user(CHAT).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_outside_preview_is_refused() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();

        handle(&api, &db, press(CallbackData::PublishVacancy)).await.unwrap();

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], ApiCall::AnswerCallback { show_alert: true, .. }));
        assert!(db.vacancies_for_user(CHAT).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_callback_is_answered() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();
        let event = Incoming {
            sender: sender(),
            message_id: Some(9),
            kind: EventKind::Callback { id: "cbq".to_string(), data: Some("stale".to_string()) },
        };

        handle(&api, &db, event).await.unwrap();
        assert!(matches!(api.last(), Some(ApiCall::AnswerCallback { text: Some(_), show_alert: false, .. })));
    }

    #[tokio::test]
    async fn test_long_field_is_truncated() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();
        db.get_or_create_user(CHAT).unwrap();
        db.set_user_step(CHAT, BotUserStep::VacancyDescription).unwrap();

        handle(&api, &db, text(&"ж".repeat(MAX_FIELD_CHARS + 50))).await.unwrap();

        let vacancy = db.vacancies_for_user(CHAT).unwrap().remove(0);
        assert_eq!(vacancy.description.unwrap().chars().count(), MAX_FIELD_CHARS);
    }

    #[tokio::test]
    async fn test_failed_edit_still_answers_callback() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();

        // The answer is call 0, the edit is call 1.
        api.fail_call(1);
        let err = handle(&api, &db, press(CallbackData::NewVacancy)).await.unwrap_err();
        assert!(matches!(err, BotError::Transport(_)));
        assert_eq!(step(&db), BotUserStep::VacancyTitle);

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], ApiCall::AnswerCallback { id, .. } if id == "cbq"));
    }

    #[tokio::test]
    async fn test_main_menu_answered_when_edit_fails() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();
        db.get_or_create_user(CHAT).unwrap();
        db.set_user_step(CHAT, BotUserStep::VacancySalary).unwrap();

        api.fail_call(1);
        assert!(handle(&api, &db, press(CallbackData::MainMenuButton)).await.is_err());
        assert_eq!(step(&db), BotUserStep::MainMenu);
        assert!(matches!(api.last(), Some(ApiCall::AnswerCallback { .. })));
    }

    #[tokio::test]
    async fn test_failed_answer_does_not_stop_callback() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();

        api.fail_next();
        handle(&api, &db, press(CallbackData::NewVacancy)).await.unwrap();

        assert_eq!(step(&db), BotUserStep::VacancyTitle);
        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], ApiCall::Edit { message_id: 9, .. }));
    }

    #[test]
    fn test_command_word() {
        assert_eq!(command("/start"), Some("/start"));
        assert_eq!(command("/start ref123"), Some("/start"));
        assert_eq!(command("/start@vacancybot"), Some("/start"));
        assert_eq!(command("/start@vacancybot payload"), Some("/start"));
        assert_eq!(command("start"), None);
        assert_eq!(command(""), None);
    }

    #[tokio::test]
    async fn test_start_with_deep_link_payload() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();
        db.get_or_create_user(CHAT).unwrap();
        db.set_user_step(CHAT, BotUserStep::VacancyTitle).unwrap();

        handle(&api, &db, text("/start ref123")).await.unwrap();
        handle(&api, &db, text("/start@vacancybot")).await.unwrap();

        assert_eq!(step(&db), BotUserStep::MainMenu);
        let texts = api.texts();
        assert_eq!(texts.len(), 2);
        assert!(texts.iter().all(|t| t.contains("Ann &lt;3")));
        assert!(db.vacancies_for_user(CHAT).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_back_label_is_not_stored_as_field() {
        let api = RecordingApi::new();
        let db = Database::in_memory().unwrap();
        db.get_or_create_user(CHAT).unwrap();
        db.set_user_step(CHAT, BotUserStep::VacancySalary).unwrap();

        handle(&api, &db, text(messages("back_button").unwrap())).await.unwrap();

        assert_eq!(step(&db), BotUserStep::VacancyDescription);
        assert_eq!(api.texts(), vec![messages("ask_description").unwrap().to_string()]);
        assert!(matches!(api.last(), Some(ApiCall::Send { .. })));
        assert!(db.vacancies_for_user(CHAT).unwrap().is_empty());
    }
}
