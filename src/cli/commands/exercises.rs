//! Exercises command implementation.

use super::ask::print_outcome;
use crate::app::App;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Build the chat request for fixation exercises.
fn exercise_request(topic: Option<&str>) -> String {
    match topic.map(str::trim).filter(|t| !t.is_empty()) {
        Some(topic) => format!(
            "Crie exercícios de fixação para os participantes sobre: {}",
            topic
        ),
        None => "Crie exercícios de fixação para os participantes sobre a discussão dos artigos."
            .to_string(),
    }
}

/// Run the exercises command.
pub async fn run_exercises(topic: Option<&str>, user: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let app = App::new(settings)?;
    let room = app.chat_room(app.language_model()?)?;

    let spinner = Output::spinner("Preparing exercises...");
    let outcome = room.ask(user, &exercise_request(topic)).await;
    spinner.finish_and_clear();

    print_outcome(&outcome?);
    Ok(())
}
