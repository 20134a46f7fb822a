//! Search command implementation.

use crate::agent::ToolKind;
use crate::app::App;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the search command through the retriever tool, filters included.
pub async fn run_search(query: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let app = App::new(settings)?;
    let tools = app.tool_context();

    let spinner = Output::spinner("Searching articles...");
    let result = tools.execute(ToolKind::Retriever, query).await;
    spinner.finish_and_clear();

    match result {
        Ok(text) => {
            Output::header(&format!("Results for \"{}\"", query));
            println!("\n{}", text);
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
