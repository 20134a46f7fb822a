//! Ask command implementation.

use crate::app::App;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::session::PostOutcome;
use anyhow::Result;
use console::style;

/// Run the ask command. The question and answer both land in the shared log.
pub async fn run_ask(question: &str, user: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let app = App::new(settings)?;
    let room = app.chat_room(app.language_model()?)?;

    let spinner = Output::spinner("Consulting the assistant...");
    let outcome = room.ask(user, question).await;
    spinner.finish_and_clear();

    print_outcome(&outcome?);
    Ok(())
}

/// Print the assistant's reply with the tools it used.
pub(super) fn print_outcome(outcome: &PostOutcome) {
    if let PostOutcome::Answered { reply, response } = outcome {
        if let Some(response) = response {
            for call in &response.tool_calls {
                println!("{}", style(format!("  [{}] {}", call.name, call.arguments)).dim());
            }
            if response.hit_turn_limit {
                Output::warning("The assistant stopped at the turn limit.");
            }
        }
        Output::assistant(reply);
    }
}
