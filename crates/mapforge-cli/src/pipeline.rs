//! Per-definition step sequencing
//!
//! Steps run strictly in order: render tasks, marker generation, remote
//! upload, webhook push. A failing step aborts the rest of the current
//! definition; completed external effects are not rolled back.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use mapforge_core::{Definition, Notifier, RemoteSink, SpreadsheetSource};

use crate::renderer;
use crate::settings::RunSettings;

/// Run every configured step for one definition
pub async fn process(path: &Path, defi: &Definition, settings: &RunSettings) -> Result<()> {
    let label = definition_label(path, defi);
    info!("Current definition: {}", label);

    run_tasks(defi, settings, &label).await?;
    write_markers(defi, settings, &label).await?;
    upload(defi, settings, &label).await?;
    notify(defi, settings, &label).await?;

    Ok(())
}

fn definition_label(path: &Path, defi: &Definition) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    match &defi.doc().name {
        Some(name) => format!("{} ({})", name, file_name),
        None => file_name,
    }
}

async fn run_tasks(defi: &Definition, settings: &RunSettings, label: &str) -> Result<()> {
    if settings.skip_map {
        debug!("Skipping map generation.");
        return Ok(());
    }

    info!("Running renderer");
    if !defi.doc().has_tasks() {
        warn!("No tasks listed!");
        return Ok(());
    }

    let commands = defi
        .commands()
        .with_context(|| format!("definition '{}': invalid task options", label))?;
    for command in commands {
        info!("  - {} {}", settings.renderer.display(), command.join(" "));
        if !settings.dry_run {
            renderer::invoke(&settings.renderer, &command)
                .await
                .with_context(|| format!("definition '{}': map generation failed", label))?;
        }
    }
    Ok(())
}

async fn write_markers(defi: &Definition, settings: &RunSettings, label: &str) -> Result<()> {
    if settings.skip_sheet {
        debug!("Skipping spreadsheet conversion");
        return Ok(());
    }
    let Some(sheet) = defi.spreadsheet() else {
        debug!("No spreadsheet entry; skipping.");
        return Ok(());
    };

    info!("Setting playermarkers...");
    if settings.dry_run {
        debug!("dry run: markers not fetched or written");
    } else {
        sheet
            .write_markers(None)
            .await
            .with_context(|| format!("definition '{}': marker generation failed", label))?;
        info!("Playermarkers written.");
    }
    Ok(())
}

async fn upload(defi: &Definition, settings: &RunSettings, label: &str) -> Result<()> {
    if settings.skip_remote {
        debug!("Skipping remote upload");
        return Ok(());
    }
    let Some(remote) = defi.remote() else {
        debug!("No remote entry; skipping.");
        return Ok(());
    };

    info!("Uploading to remote...");
    if settings.dry_run {
        debug!("dry run: nothing transferred");
    } else if settings.sheet_only {
        remote
            .upload_markers(None)
            .await
            .with_context(|| format!("definition '{}': marker upload failed", label))?;
        info!("Upload complete.");
    } else {
        remote
            .upload(None)
            .await
            .with_context(|| format!("definition '{}': remote upload failed", label))?;
        info!("Upload complete.");
    }
    Ok(())
}

async fn notify(defi: &Definition, settings: &RunSettings, label: &str) -> Result<()> {
    if settings.skip_webhook {
        debug!("Skipping webhook push");
        return Ok(());
    }
    let Some(webhook) = defi.webhook() else {
        debug!("No webhook entry; skipping.");
        return Ok(());
    };

    info!("Pushing to webhook...");
    if settings.dry_run {
        debug!("dry run: nothing pushed");
    } else {
        webhook
            .push(None)
            .await
            .with_context(|| format!("definition '{}': webhook push failed", label))?;
        info!("Webhook pushed.");
    }
    Ok(())
}
