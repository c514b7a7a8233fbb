//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and manage sessions from inside the chat.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat.
    Exit,
    /// Create a session and switch to it, optionally named.
    New(Option<String>),
    /// List sessions, most recent first.
    Sessions,
    /// Switch to a session by list position or id.
    Switch(String),
    /// Delete a session by list position or id.
    Delete(String),
    /// Rename the active session.
    Rename(String),
    /// Reload the session list from the backend.
    Refresh,
    /// Unknown command or missing argument.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd.to_lowercase(), Some(arg.trim().to_string())),
        None => (trimmed.to_lowercase(), None),
    };
    let arg = arg.filter(|a| !a.is_empty());

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/clear" | "/cls" => ChatCommand::Clear,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/new" => ChatCommand::New(arg),
        "/sessions" | "/ls" => ChatCommand::Sessions,
        "/refresh" => ChatCommand::Refresh,
        "/switch" | "/sw" => match arg {
            Some(target) => ChatCommand::Switch(target),
            None => ChatCommand::Unknown("/switch requires a session number or id".to_string()),
        },
        "/delete" | "/rm" => match arg {
            Some(target) => ChatCommand::Delete(target),
            None => ChatCommand::Unknown("/delete requires a session number or id".to_string()),
        },
        "/rename" => match arg {
            Some(name) => ChatCommand::Rename(name),
            None => ChatCommand::Unknown("/rename requires a name".to_string()),
        },
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(command)
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/sessions", "List sessions (* marks the active one)"),
        ("/new [name]", "Start a new session"),
        ("/switch <n|id>", "Switch to another session"),
        ("/delete <n|id>", "Delete a session"),
        ("/rename <name>", "Rename the active session"),
        ("/refresh", "Reload the session list"),
        ("/clear", "Clear the screen"),
        ("/exit", "Leave the chat"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (command, description) in rows {
        println!("  {:<16} {description}", style(command).cyan());
    }
    println!();
    println!("  {}", style("Ctrl+D to exit").dim());
    println!();
}
