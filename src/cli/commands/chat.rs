//! Interactive collaborative chat.

use super::ask::print_outcome;
use crate::app::App;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Empty,
    Exit,
    SwitchUser(&'a str),
    Message(&'a str),
}

fn parse_input(input: &str) -> ChatInput<'_> {
    let input = input.trim();
    if input.is_empty() {
        return ChatInput::Empty;
    }
    if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
        return ChatInput::Exit;
    }
    match input.strip_prefix("/user") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
            match rest.trim() {
                "" => ChatInput::Empty,
                name => ChatInput::SwitchUser(name),
            }
        }
        _ => ChatInput::Message(input),
    }
}

/// Run the interactive chat command.
pub async fn run_chat(user: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let mut username = user
        .or_else(|| settings.conversation.participants.first().cloned())
        .unwrap_or_else(|| "Participante".to_string());
    let mention = settings.conversation.mention.clone();
    let participants = settings.conversation.participants.join(", ");

    let app = App::new(settings)?;
    let room = app.chat_room(app.language_model()?)?;

    println!("\n{}", style("ColabAI Chat").bold().cyan());
    println!(
        "{}",
        style(format!(
            "Mention {} to ask the assistant. '/user <name>' switches speaker, 'exit' quits.",
            mention
        ))
        .dim()
    );
    if !participants.is_empty() {
        println!("{}\n", style(format!("Participants: {}", participants)).dim());
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style(format!("{}:", username)).green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        match parse_input(&input) {
            ChatInput::Empty => continue,
            ChatInput::Exit => {
                Output::info("Até logo!");
                break;
            }
            ChatInput::SwitchUser(name) => {
                username = name.to_string();
                Output::info(&format!("Now speaking as {}", username));
            }
            ChatInput::Message(text) => {
                let outcome = if room.mentions_assistant(text) {
                    let spinner = Output::spinner("Consulting the assistant...");
                    let outcome = room.post(&username, text).await;
                    spinner.finish_and_clear();
                    outcome
                } else {
                    room.post(&username, text).await
                };

                match outcome {
                    Ok(outcome) => print_outcome(&outcome),
                    Err(e) => Output::error(&format!("Error: {}", e)),
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("   "), ChatInput::Empty);
        assert_eq!(parse_input("EXIT"), ChatInput::Exit);
        assert_eq!(parse_input("/user Rebeca"), ChatInput::SwitchUser("Rebeca"));
        assert_eq!(parse_input("/user"), ChatInput::Empty);
        assert_eq!(parse_input("/username"), ChatInput::Message("/username"));
        assert_eq!(
            parse_input(" @colaborai o que é X? "),
            ChatInput::Message("@colaborai o que é X?")
        );
    }
}
