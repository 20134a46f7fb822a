//! History command implementation.

use crate::agent::ToolKind;
use crate::app::App;
use crate::cli::preflight::{self, Operation};
use crate::config::Settings;
use anyhow::Result;

/// Print the end of the shared conversation log, as the history tool sees it.
pub async fn run_history(lines: &str, settings: Settings) -> Result<()> {
    preflight::check(Operation::Local, &settings)?;

    let app = App::new(settings)?;
    let text = app.tool_context().execute(ToolKind::History, lines).await?;
    println!("{}", text);
    Ok(())
}
