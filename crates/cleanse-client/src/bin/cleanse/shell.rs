//! Interactive upload, review and generate session.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cleanse_client::clipboard::Osc52Clipboard;
use cleanse_client::config::ClientConfig;
use cleanse_client::render;
use cleanse_client::workflow::Phase;
use cleanse_client::{notice, SubmitOutcome, WorkflowController};
use cleanse_core::session::{is_accepted_dataset, ACCEPTED_EXTENSIONS};
use cleanse_core::{DatasetFile, EditTarget};
use tracing::{debug, warn};

use crate::console::ConsoleNotifier;
use crate::{prompt, style};

const HELP: &str = "\
Commands:
  upload <path>     upload a dataset (.csv, .xlsx, .xls) and fetch recommendations
  list              show recommendations
  toggle <n>...     select or deselect steps (number or category/step)
  edit <n>          edit a step description
  submit            generate code for the selected steps
  code              show the generated code
  edit-line <n>     edit one line of the generated code
  copy              copy the generated code to the clipboard
  raw               show the last recommendations response
  status            show session status
  wait              wait for outstanding requests
  help              show this help
  quit              end the session";

const WAIT_POLL: Duration = Duration::from_millis(50);

pub fn run_shell(config: &ClientConfig) -> anyhow::Result<()> {
    let mut controller = WorkflowController::from_config(config, Arc::new(ConsoleNotifier));
    println!(
        "{}",
        style::accent(format!("cleanse: backend {}", config.backend.base_url))
    );
    println!("{}", style::dim("Type `help` for commands."));

    loop {
        drain(&mut controller);
        let label = if controller.is_loading() {
            "cleanse (generating)"
        } else {
            "cleanse"
        };
        let Some(line) = prompt::read_command(label)? else {
            break;
        };
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();
        let result = match command {
            "upload" => {
                upload(&mut controller, &line);
                Ok(())
            }
            "list" | "ls" => {
                print!("{}", render::recommendations(controller.review()));
                Ok(())
            }
            "toggle" | "t" => toggle(&mut controller, &args),
            "edit" | "e" => edit_step(&mut controller, &args),
            "submit" => {
                submit(&mut controller);
                Ok(())
            }
            "code" => {
                print!("{}", render::code(controller.review()));
                Ok(())
            }
            "edit-line" => edit_line(&mut controller, &args),
            "copy" => copy(&mut controller),
            "raw" => {
                raw(&controller);
                Ok(())
            }
            "wait" => {
                wait(&mut controller, config);
                Ok(())
            }
            "status" => {
                status(&controller, config);
                Ok(())
            }
            "help" | "?" => {
                println!("{HELP}");
                Ok(())
            }
            "quit" | "exit" | "q" => {
                if confirm_quit(&controller)? {
                    break;
                }
                Ok(())
            }
            other => {
                println!(
                    "{}",
                    style::warning(format!("Unknown command '{other}'. Type `help`."))
                );
                Ok(())
            }
        };
        if let Err(err) = result {
            eprintln!("{}", style::error(format!("Error: {err}")));
        }
    }

    controller.end_session()?;
    debug!("session ended");
    Ok(())
}

/// Applies completions that arrived while the prompt was open and shows what
/// each one changed.
fn drain(controller: &mut WorkflowController) {
    for applied in controller.process_events() {
        match (applied.failure, applied.phase) {
            (Some(err), _) => {
                eprintln!("{}", style::error(format!("Request failed: {err}")));
            }
            (None, Phase::Upload) => print!("{}", render::recommendations(controller.review())),
            (None, Phase::Generate) => print!("{}", render::code(controller.review())),
        }
    }
}

/// File picker: the rest of the command line names the file. Anything that
/// is not a readable dataset counts as no file chosen.
fn pick_file(line: &str) -> Option<DatasetFile> {
    let path = line.trim().strip_prefix("upload")?.trim();
    if path.is_empty() {
        return None;
    }
    let path = Path::new(path);
    let name = path.file_name()?.to_string_lossy();
    if !is_accepted_dataset(&name) {
        println!(
            "{}",
            style::warning(format!(
                "'{name}' is not a dataset; accepted extensions: {}",
                ACCEPTED_EXTENSIONS.join(", ")
            ))
        );
        return None;
    }
    match DatasetFile::read(path) {
        Ok(file) => Some(file),
        Err(err) => {
            warn!("could not read {}: {err}", path.display());
            println!(
                "{}",
                style::warning(format!("Could not read {}: {err}", path.display()))
            );
            None
        }
    }
}

fn upload(controller: &mut WorkflowController, line: &str) {
    let file = pick_file(line);
    if let SubmitOutcome::Started(_) = controller.submit_upload(file) {
        println!("{}", style::dim("Fetching recommendations..."));
    }
}

fn submit(controller: &mut WorkflowController) {
    // Busy and Aborted were already reported by the notifier.
    if let SubmitOutcome::Started(_) = controller.submit_choices() {
        println!("{}", style::dim(notice::GENERATING));
    }
}

/// Blocks the prompt until outstanding requests finish; `drain` shows them.
fn wait(controller: &mut WorkflowController, config: &ClientConfig) {
    let deadline =
        Instant::now() + config.backend.connect_timeout + config.backend.request_timeout;
    while controller.in_flight() > 0 && Instant::now() < deadline {
        std::thread::sleep(WAIT_POLL);
        drain(controller);
    }
    if controller.in_flight() > 0 {
        println!(
            "{}",
            style::warning("Still waiting on the backend; results will show when they arrive.")
        );
    }
}

fn toggle(controller: &mut WorkflowController, args: &[&str]) -> anyhow::Result<()> {
    if args.is_empty() {
        anyhow::bail!("usage: toggle <n>...");
    }
    for reference in args {
        let id = render::resolve_step(controller.review().recommendations(), reference)
            .ok_or_else(|| anyhow::anyhow!("no step '{reference}' (see `list`)"))?;
        let selected = controller.toggle_step(id.clone())?;
        let mark = if selected { "[x]" } else { "[ ]" };
        println!("{mark} {id}");
    }
    Ok(())
}

fn edit_step(controller: &mut WorkflowController, args: &[&str]) -> anyhow::Result<()> {
    let [reference] = args else {
        anyhow::bail!("usage: edit <n>");
    };
    let id = render::resolve_step(controller.review().recommendations(), reference)
        .ok_or_else(|| anyhow::anyhow!("no step '{reference}' (see `list`)"))?;
    let label = id.to_string();
    edit(controller, EditTarget::Recommendation(id), &label)
}

fn edit_line(controller: &mut WorkflowController, args: &[&str]) -> anyhow::Result<()> {
    let [number] = args else {
        anyhow::bail!("usage: edit-line <n>");
    };
    let number: usize = number
        .parse()
        .map_err(|err| anyhow::anyhow!("line number '{number}': {err}"))?;
    let index = number
        .checked_sub(1)
        .ok_or_else(|| anyhow::anyhow!("line numbers start at 1"))?;
    edit(controller, EditTarget::CodeLine(index), &format!("line {number}"))
}

/// Activates `target`, lets the user change its text, then commits it.
fn edit(
    controller: &mut WorkflowController,
    target: EditTarget,
    label: &str,
) -> anyhow::Result<()> {
    controller.begin_edit(target)?;
    let current = controller
        .review()
        .edit()
        .buffer()
        .unwrap_or_default()
        .to_string();
    let edited = match prompt::edit_text(label, &current) {
        Ok(text) => text,
        Err(err) => {
            // Leaving the field keeps what it held.
            controller.commit_edit();
            return Err(err);
        }
    };
    controller.set_edit_buffer(edited);
    if let Some(committed) = controller.commit_edit() {
        if committed.applied {
            println!("{}", style::success(format!("{label}: {}", committed.text)));
        }
    }
    Ok(())
}

fn copy(controller: &mut WorkflowController) -> anyhow::Result<()> {
    let mut clipboard = Osc52Clipboard::new(std::io::stdout());
    controller.copy_code(&mut clipboard)?;
    Ok(())
}

fn raw(controller: &WorkflowController) {
    if controller.raw_response().is_empty() {
        println!("{}", style::dim("No response yet."));
    } else {
        println!("{}", controller.raw_response());
    }
}

fn status(controller: &WorkflowController, config: &ClientConfig) {
    let review = controller.review();
    let file = controller
        .session_file()
        .map_or_else(|| "none".to_string(), |file| file.name);
    println!("backend:         {}", config.backend.base_url);
    println!("session file:    {file}");
    println!(
        "recommendations: {} categories, {} steps, {} selected",
        review.recommendations().len(),
        review.recommendations().step_count(),
        review.selection().len()
    );
    println!("code:            {} lines", review.code().len());
    println!(
        "requests:        {} in flight{}",
        controller.in_flight(),
        if controller.is_loading() {
            " (generating)"
        } else {
            ""
        }
    );
}

fn confirm_quit(controller: &WorkflowController) -> anyhow::Result<bool> {
    if controller.in_flight() == 0 {
        return Ok(true);
    }
    prompt::prompt_yes_no("A request is still running. Quit anyway?", false)
}
