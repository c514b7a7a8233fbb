//! Welcome banner and offline panel for the chat.

use console::style;

/// Print the banner at the start of a chat.
pub fn print_welcome_banner(user: &str, model: &str, backend: &str, session_name: &str) {
    println!();
    println!("  {} {}", style("*").cyan().bold(), style("Parley").cyan().bold());
    println!("  {}", style(format!("Signed in as {user}")).dim());
    println!();
    println!("  {}    {}", style("Model:").bold(), style(model).dim());
    println!("  {}  {}", style("History:").bold(), style(backend).dim());
    println!("  {}  {}", style("Session:").bold(), style(session_name).cyan());
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}

/// Print the panel shown when the History Service cannot be reached.
pub fn print_offline_panel(backend: &str, reason: &str) {
    let rule = style("─".repeat(48)).red();
    eprintln!();
    eprintln!("  {rule}");
    eprintln!("  {} {}", style("✗").red().bold(), style("Backend offline").red().bold());
    eprintln!();
    eprintln!("  Could not reach the history service at {}", style(backend).yellow());
    eprintln!("  {}", style(reason).dim());
    eprintln!();
    eprintln!(
        "  Start it with {} or chat against the local store with {}",
        style("parley serve").cyan(),
        style("parley chat --local").cyan()
    );
    eprintln!("  {rule}");
    eprintln!();
}

/// Print a divider announcing the session now shown.
pub fn print_session_header(session_name: &str, position: Option<usize>) {
    let label = match position {
        Some(n) => format!("#{n} {session_name}"),
        None => session_name.to_string(),
    };
    println!();
    println!("  {} {}", style("──").dim(), style(label).cyan().bold());
    println!();
}
