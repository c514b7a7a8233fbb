//! Session management CLI commands: list, show, new, delete, rename.
//!
//! Talks to the History Service through a [`HistoryBackend`], so the same
//! commands work against a remote server or the local store.

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use parley_core::client::backend::HistoryBackend;
use parley_core::client::context::SessionContext;
use parley_types::history::{ChatMessage, ChatSession, MessageRole, NewMessage, SessionSummary};
use uuid::Uuid;

use super::backend::resolve_session_ref;

/// List the user's sessions, most recent first.
///
/// # Examples
///
/// ```bash
/// parley session list
/// parley session --local list --json
/// ```
pub async fn list_sessions(backend: &impl HistoryBackend, ctx: &SessionContext, json: bool) -> Result<()> {
    let sessions = backend.list_sessions(&ctx.user_id).await?;

    if json {
        let summaries: Vec<SessionSummary> = sessions.iter().map(SessionSummary::from).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions yet. Start one with: {}",
            style("i").blue().bold(),
            style("parley chat").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
        Cell::new("Id").fg(Color::White),
    ]);

    for (i, session) in sessions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1).fg(Color::DarkGrey),
            Cell::new(truncate(&session.session_name, 40)).fg(Color::Cyan),
            Cell::new(session.messages.len()).fg(Color::White),
            Cell::new(session.updated_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::White),
            Cell::new(session.id).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("  Sessions for '{}'", style(ctx.display_name()).cyan().bold());
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Print a session's transcript.
pub async fn show_session(
    backend: &impl HistoryBackend,
    ctx: &SessionContext,
    reference: &str,
    json: bool,
) -> Result<()> {
    let session_id = find_session(backend, ctx, reference).await?;
    let session = backend.get_session(&ctx.user_id, &session_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(&session.session_name).cyan().bold());
    println!(
        "  {}",
        style(format!(
            "{} messages · created {}",
            session.messages.len(),
            session.created_at.format("%Y-%m-%d %H:%M UTC")
        ))
        .dim()
    );
    println!();

    for message in &session.messages {
        print_message(message);
    }

    Ok(())
}

/// Create a session seeded with the welcome message.
pub async fn new_session(
    backend: &impl HistoryBackend,
    ctx: &SessionContext,
    name: Option<&str>,
    json: bool,
) -> Result<()> {
    let session = backend.create_session(&ctx.user_id, name).await?;
    let session = backend
        .append_message(&ctx.user_id, &session.id, &NewMessage::from(&ChatMessage::welcome()))
        .await
        .context("session created but the welcome message was not stored")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&SessionSummary::from(&session))?);
    } else {
        println!(
            "  {} Created session '{}' ({})",
            style("+").green().bold(),
            style(&session.session_name).cyan(),
            style(session.id).dim()
        );
    }
    Ok(())
}

/// Delete a session with confirmation.
///
/// # Examples
///
/// ```bash
/// parley session delete 2
/// parley session delete <session-id> --force
/// ```
pub async fn delete_session(
    backend: &impl HistoryBackend,
    ctx: &SessionContext,
    reference: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    let session_id = find_session(backend, ctx, reference).await?;
    let session = backend.get_session(&ctx.user_id, &session_id).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete session '{}' ({} messages)?",
                style(&session.session_name).red().bold(),
                session.messages.len()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    backend.delete_session(&ctx.user_id, &session_id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "sessionId": session_id.to_string()})
        );
    } else {
        println!(
            "  {} Session '{}' deleted.",
            style("x").red().bold(),
            session.session_name
        );
    }
    Ok(())
}

pub async fn rename_session(
    backend: &impl HistoryBackend,
    ctx: &SessionContext,
    reference: &str,
    name: &str,
    json: bool,
) -> Result<()> {
    let session_id = find_session(backend, ctx, reference).await?;
    let session = backend.rename_session(&ctx.user_id, &session_id, name).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&SessionSummary::from(&session))?);
    } else {
        println!(
            "  {} Renamed to '{}'",
            style("~").yellow().bold(),
            style(&session.session_name).cyan()
        );
    }
    Ok(())
}

async fn find_session(
    backend: &impl HistoryBackend,
    ctx: &SessionContext,
    reference: &str,
) -> Result<Uuid> {
    let sessions: Vec<ChatSession> = backend.list_sessions(&ctx.user_id).await?;
    match resolve_session_ref(&sessions, reference) {
        Some(id) => Ok(id),
        None => bail!("Session '{reference}' not found. See `parley session list`."),
    }
}

fn print_message(message: &ChatMessage) {
    let label = match message.role {
        MessageRole::User => style("You").green().bold(),
        MessageRole::Model => style("Model").cyan().bold(),
    };
    let time = message.timestamp.format("%H:%M");
    println!("  {label} {}", style(time).dim());
    for part in &message.parts {
        for line in part.text.lines() {
            println!("    {line}");
        }
    }
    println!();
}

// --- Formatting helpers ---

/// Shorten to at most `max` characters, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
