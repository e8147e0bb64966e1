//! Command implementations

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::app::container::AppContainer;
use crate::app::CutInput;
use crate::cli::args::{CutArgs, ProbeArgs, ThumbnailArgs};
use crate::domain::errors::PathError;
use crate::domain::model::TimeSpec;
use crate::engine::cancel::CancelHandle;
use crate::utils::format_duration;

/// Execute the cut command; Ctrl-C cancels the running tool
pub async fn cut(container: &dyn AppContainer, args: CutArgs) -> Result<()> {
    let input = CutInput {
        input: args.input,
        start: args.start,
        end: args.end,
        output: args.output,
        overwrite: args.overwrite,
        cleanup: args.cleanup,
    };

    let cancel = CancelHandle::new();
    let interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling cut");
            interrupt.cancel();
        }
    });

    let result = container
        .cut_interactor()
        .execute(&input, cancel.signal())
        .await;
    watcher.abort();

    let response = result.context("cut failed")?;
    let outcome = &response.outcome;
    info!(
        mode = %outcome.mode_used,
        elapsed = %format_duration(outcome.elapsed),
        "cut completed"
    );

    if outcome.fell_back {
        println!(
            "Clip written to {} (re-encoded after stream copy failed)",
            outcome.destination.display()
        );
    } else {
        println!("Clip written to {}", outcome.destination.display());
    }
    Ok(())
}

/// Execute the probe command
pub async fn probe(container: &dyn AppContainer, args: ProbeArgs) -> Result<()> {
    let summary = container
        .inspect_interactor()
        .inspect(&args.input)
        .await
        .context("probe failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .context("Failed to serialize media info to JSON")?;
        println!("{}", json);
    } else {
        println!("File:     {}", summary.path.display());
        println!("Duration: {} ({:.3} s)", summary.duration, summary.duration_seconds);
        println!("Size:     {} bytes", summary.size_bytes);
    }
    Ok(())
}

/// Execute the thumbnail command
pub async fn thumbnail(container: &dyn AppContainer, args: ThumbnailArgs) -> Result<()> {
    let timestamp = TimeSpec::parse(&args.timestamp)?;
    if !args.input.is_file() {
        return Err(PathError::SourceNotFound { path: args.input }.into());
    }

    let frame = container
        .thumbnail_generator()
        .extract_exact(&args.input, timestamp)
        .await
        .context("thumbnail extraction failed")?;

    std::fs::write(&args.output, &frame.image_data)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "Frame at {} written to {}",
        frame.timestamp,
        args.output.display()
    );
    Ok(())
}
