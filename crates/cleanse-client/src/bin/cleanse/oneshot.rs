//! Non-interactive `recommend` and `generate` commands.

use std::path::Path;
use std::sync::Arc;

use cleanse_client::config::ClientConfig;
use cleanse_client::render;
use cleanse_client::{SubmitOutcome, WorkflowController};
use cleanse_core::DatasetFile;
use tracing::info;

use crate::console::ConsoleNotifier;

pub fn run_recommend(config: &ClientConfig, file: &Path, json: bool) -> anyhow::Result<()> {
    let mut controller = upload(config, file)?;
    if json {
        println!("{}", controller.raw_response());
    } else {
        print!("{}", render::recommendations(controller.review()));
    }
    controller.end_session()?;
    Ok(())
}

pub fn run_generate(
    config: &ClientConfig,
    file: &Path,
    select: &[String],
    code: Option<&Path>,
) -> anyhow::Result<()> {
    let mut controller = upload(config, file)?;
    for reference in select {
        let id = render::resolve_step(controller.review().recommendations(), reference)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "no recommended step '{reference}' (run `cleanse recommend` to list them)"
                )
            })?;
        if !controller.review().is_selected(&id) {
            controller.toggle_step(id)?;
        }
    }
    if let Some(path) = code {
        let text = std::fs::read_to_string(path)
            .map_err(|err| anyhow::anyhow!("failed to read {}: {err}", path.display()))?;
        controller.load_code(&text);
    }

    if !matches!(controller.submit_choices(), SubmitOutcome::Started(_)) {
        anyhow::bail!("code generation was not started");
    }
    wait(&mut controller, config)?;
    print!("{}", controller.review().code().to_text());
    if !controller.review().code().is_empty() {
        println!();
    }
    controller.end_session()?;
    Ok(())
}

fn upload(config: &ClientConfig, path: &Path) -> anyhow::Result<WorkflowController> {
    let file = DatasetFile::read(path)
        .map_err(|err| anyhow::anyhow!("failed to read {}: {err}", path.display()))?;
    let mut controller = WorkflowController::from_config(config, Arc::new(ConsoleNotifier));
    if !matches!(controller.submit_upload(Some(file)), SubmitOutcome::Started(_)) {
        anyhow::bail!("upload was not started");
    }
    wait(&mut controller, config)?;
    if controller.review().recommendations().is_empty() {
        anyhow::bail!("backend returned no recommendations for {}", path.display());
    }
    info!(
        "{} steps recommended for {}",
        controller.review().recommendations().step_count(),
        path.display()
    );
    Ok(controller)
}

fn wait(controller: &mut WorkflowController, config: &ClientConfig) -> anyhow::Result<()> {
    let limit = config.backend.connect_timeout + config.backend.request_timeout;
    if !controller.wait_idle(limit) {
        anyhow::bail!("timed out waiting for {}", config.backend.base_url);
    }
    match controller.last_failure() {
        Some((_, err)) => Err(err.clone().into()),
        None => Ok(()),
    }
}
