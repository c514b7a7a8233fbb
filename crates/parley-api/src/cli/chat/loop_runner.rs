//! Chat loop orchestration.
//!
//! `run_chat` wires identity, History Service transport and model into a
//! [`ChatController`], then `drive` reads input until the user leaves.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use console::style;
use crossterm::style::Color;
use parley_core::client::backend::HistoryBackend;
use parley_core::client::context::SessionContext;
use parley_core::client::controller::{ChatController, ControllerError};
use parley_core::llm::provider::LanguageModel;
use parley_infra::credentials::FileCredentialStore;
use parley_infra::llm::gemini::GeminiProvider;
use parley_types::config::ClientConfig;
use tracing::info;

use super::banner::{print_offline_panel, print_session_header, print_welcome_banner};
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::{ChatRenderer, thinking_spinner};
use crate::cli::BackendArgs;
use crate::cli::backend::{ClientBackend, resolve_session_ref};

/// Resolve identity, connect, initialize and run the interactive chat.
///
/// Returns an error (non-zero exit) when the user is not logged in or the
/// History Service is unreachable at startup.
pub async fn run_chat(
    data_dir: &Path,
    config: &ClientConfig,
    backend_args: &BackendArgs,
    model: Option<&str>,
) -> anyhow::Result<()> {
    let store = FileCredentialStore::in_data_dir(data_dir);
    let context = SessionContext::from_store(&store)
        .context("Run `parley identity set` to choose who you are chatting as")?;

    let model_name = model.unwrap_or(&config.model).to_string();
    let provider = GeminiProvider::new(
        GeminiProvider::api_key_from_env_or_empty(),
        model_name.clone(),
        config.model_base_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let backend = ClientBackend::connect(backend_args, config, data_dir).await?;
    let backend_label = backend.describe();

    let mut controller = ChatController::new(backend, provider, Arc::new(context));
    let spinner = thinking_spinner();
    spinner.set_message("loading sessions...");
    let initialized = controller.initialize().await;
    spinner.finish_and_clear();

    if let Err(e) = initialized {
        print_offline_panel(&backend_label, &e.to_string());
        bail!("Backend offline");
    }

    print_welcome_banner(
        controller.context().display_name(),
        &model_name,
        &backend_label,
        active_name(&controller),
    );

    drive(&mut controller).await
}

/// Read input and dispatch it until EOF or `/exit`.
pub async fn drive<B: HistoryBackend, M: LanguageModel>(
    controller: &mut ChatController<B, M>,
) -> anyhow::Result<()> {
    let renderer = ChatRenderer::new(Color::Cyan);
    renderer.print_transcript(controller.transcript());

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        match chat_input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
            }
            InputEvent::Message(text) if text.is_empty() => {}
            InputEvent::Message(text) => match commands::parse(&text) {
                Some(ChatCommand::Exit) => break,
                Some(ChatCommand::Clear) => chat_input.clear(),
                Some(command) => {
                    if let Err(e) = run_command(controller, &renderer, command).await {
                        print_error(&e);
                    }
                }
                None => send(controller, &renderer, &text).await,
            },
        }
    }

    chat_input.flush();
    println!("\n  {}", style("Chat ended.").dim());
    info!(user_id = %controller.context().user_id, "chat ended");
    Ok(())
}

async fn send<B: HistoryBackend, M: LanguageModel>(
    controller: &mut ChatController<B, M>,
    renderer: &ChatRenderer,
    text: &str,
) {
    let spinner = thinking_spinner();
    let result = controller.send_message(text).await;
    spinner.finish_and_clear();

    match result {
        Ok(reply) => {
            println!();
            renderer.print_message(&reply);
        }
        Err(e) => print_error(&e),
    }
}

async fn run_command<B: HistoryBackend, M: LanguageModel>(
    controller: &mut ChatController<B, M>,
    renderer: &ChatRenderer,
    command: ChatCommand,
) -> Result<(), ControllerError> {
    match command {
        ChatCommand::Help => commands::print_help(),
        ChatCommand::Sessions => print_sessions(controller),
        ChatCommand::Refresh => {
            controller.refresh_sessions().await?;
            print_sessions(controller);
        }
        ChatCommand::New(name) => {
            controller.new_session(name.as_deref()).await?;
            show_active(controller, renderer);
        }
        ChatCommand::Switch(target) => {
            let Some(id) = resolve_session_ref(controller.sessions(), &target) else {
                print_unknown_session(&target);
                return Ok(());
            };
            controller.switch_session(id).await?;
            show_active(controller, renderer);
        }
        ChatCommand::Delete(target) => {
            let Some(id) = resolve_session_ref(controller.sessions(), &target) else {
                print_unknown_session(&target);
                return Ok(());
            };
            let was_active = controller.active_session_id() == Some(id);
            controller.delete_session(id).await?;
            println!("  {} Session deleted.", style("x").red().bold());
            if was_active {
                show_active(controller, renderer);
            }
        }
        ChatCommand::Rename(name) => {
            let Some(id) = controller.active_session_id() else {
                return Err(ControllerError::NotReady);
            };
            let renamed = controller.rename_session(id, &name).await?;
            println!(
                "  {} Renamed to '{}'",
                style("~").yellow().bold(),
                style(&renamed.session_name).cyan()
            );
        }
        ChatCommand::Unknown(cmd) => {
            println!(
                "  {} Unknown command: {}. Type /help for available commands.",
                style("?").yellow().bold(),
                style(cmd).dim()
            );
        }
        ChatCommand::Exit | ChatCommand::Clear => {}
    }
    Ok(())
}

fn print_sessions<B: HistoryBackend, M: LanguageModel>(controller: &ChatController<B, M>) {
    let active = controller.active_session_id();
    println!();
    for (i, session) in controller.sessions().iter().enumerate() {
        let marker = if Some(session.id) == active { "*" } else { " " };
        println!(
            "  {} {:>3}  {}  {}",
            style(marker).green().bold(),
            i + 1,
            style(&session.session_name).cyan(),
            style(session.updated_at.format("%Y-%m-%d %H:%M")).dim()
        );
    }
    println!();
}

fn show_active<B: HistoryBackend, M: LanguageModel>(
    controller: &ChatController<B, M>,
    renderer: &ChatRenderer,
) {
    let position = controller
        .active_session_id()
        .and_then(|id| controller.sessions().iter().position(|s| s.id == id))
        .map(|i| i + 1);
    print_session_header(active_name(controller), position);
    renderer.print_transcript(controller.transcript());
}

fn active_name<B: HistoryBackend, M: LanguageModel>(controller: &ChatController<B, M>) -> &str {
    controller
        .active_session()
        .map(|s| s.session_name.as_str())
        .unwrap_or("(new session)")
}

fn print_unknown_session(target: &str) {
    println!(
        "  {} No session '{}'. Use /sessions to see the list.",
        style("?").yellow().bold(),
        style(target).dim()
    );
}

fn print_error(e: &ControllerError) {
    println!("  {} {e}", style("!").red().bold());
}
