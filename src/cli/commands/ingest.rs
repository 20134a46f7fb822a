//! Ingest command implementation.

use crate::app::App;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Run the ingest command.
pub async fn run_ingest(
    files: &[String],
    name: Option<&str>,
    force: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if name.is_some() && files.len() > 1 {
        anyhow::bail!("--name can only be used when ingesting a single file");
    }

    let app = App::new(settings)?;
    let ingestor = app.ingestor()?;

    let pb = Output::progress_bar(files.len() as u64, "Indexing documents");
    let mut indexed = 0usize;
    let mut failed = 0usize;

    for file in files {
        let path = Path::new(file);
        pb.set_message(file.clone());

        match ingestor.ingest_file(path, name, force).await {
            Ok(result) if result.skipped => {
                pb.suspend(|| {
                    Output::info(&format!(
                        "{} already indexed (use --force to re-index)",
                        result.source_name
                    ))
                });
            }
            Ok(result) => {
                indexed += result.chunks_indexed;
                pb.suspend(|| {
                    Output::success(&format!(
                        "{}: {} chunks from {} pages",
                        result.source_name, result.chunks_indexed, result.pages
                    ))
                });
            }
            Err(e) => {
                failed += 1;
                pb.suspend(|| Output::error(&format!("Failed to ingest {}: {}", file, e)));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    Output::kv("Chunks indexed", &indexed.to_string());
    if failed > 0 {
        anyhow::bail!("{} of {} documents failed to ingest", failed, files.len());
    }

    Ok(())
}
