//! Identity CLI commands: set, show, clear, verify.
//!
//! The chat client never logs in by itself. These commands write the token
//! and user record it reads at startup.

use anyhow::{Result, bail};
use console::style;
use dialoguer::Password;
use parley_core::client::context::{CredentialStore, SessionContext, StoredCredentials};
use parley_infra::http::auth_client::AuthClient;
use parley_types::config::ClientConfig;
use parley_types::user::UserRecord;

/// Store a token and/or user id.
///
/// # Examples
///
/// ```bash
/// # Secure prompt for the token
/// parley identity set
///
/// parley identity set --user-id 64f1c0ffee --name Ada --email ada@example.com
/// ```
pub fn set_identity(
    store: &impl CredentialStore,
    user_id: Option<String>,
    token: Option<String>,
    name: Option<String>,
    email: Option<String>,
    json: bool,
) -> Result<()> {
    let token = match (&user_id, token) {
        (_, Some(token)) => Some(token),
        (Some(_), None) => None,
        (None, None) => Some(Password::new().with_prompt("Token").interact()?),
    };

    let user = match (&user_id, name, email) {
        (Some(id), name, email) if name.is_some() || email.is_some() => Some(UserRecord {
            id: id.clone(),
            name: name.unwrap_or_default(),
            email: email.unwrap_or_default(),
        }),
        _ => None,
    };

    let credentials = StoredCredentials {
        token,
        user,
        user_id,
    };

    // Refuse to store something the chat client could not use.
    let ctx = SessionContext::resolve(credentials.clone())?;
    store.save(&credentials)?;

    if json {
        println!("{}", serde_json::json!({"saved": true, "userId": ctx.user_id}));
    } else {
        println!(
            "  {} Identity saved for '{}'",
            style("✓").green().bold(),
            style(ctx.display_name()).cyan()
        );
    }
    Ok(())
}

/// Show what is stored and who it resolves to.
pub fn show_identity(store: &impl CredentialStore, json: bool) -> Result<()> {
    let credentials = store.load()?;
    let resolved = SessionContext::resolve(credentials.clone());

    if json {
        println!(
            "{}",
            serde_json::json!({
                "userId": resolved.as_ref().ok().map(|c| c.user_id.clone()),
                "user": credentials.user,
                "hasToken": credentials.token.is_some(),
            })
        );
        return Ok(());
    }

    println!();
    match &resolved {
        Ok(ctx) => println!(
            "  {}  {}",
            style("User:").bold(),
            style(ctx.display_name()).cyan()
        ),
        Err(e) => println!("  {} {e}", style("!").yellow().bold()),
    }
    if let Ok(ctx) = &resolved {
        println!("  {}    {}", style("Id:").bold(), ctx.user_id);
    }
    if let Some(user) = credentials.user.as_ref().filter(|u| !u.email.is_empty()) {
        println!("  {} {}", style("Email:").bold(), user.email);
    }
    println!(
        "  {} {}",
        style("Token:").bold(),
        credentials
            .token
            .as_deref()
            .map(mask_token)
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!();
    Ok(())
}

pub fn clear_identity(store: &impl CredentialStore, json: bool) -> Result<()> {
    store.clear()?;
    if json {
        println!("{}", serde_json::json!({"cleared": true}));
    } else {
        println!("  {} Identity cleared.", style("x").red().bold());
    }
    Ok(())
}

/// Ask the authentication service about the stored token and keep the user
/// record it returns.
pub async fn verify_identity(
    store: &impl CredentialStore,
    config: &ClientConfig,
    auth_url: Option<&str>,
    json: bool,
) -> Result<()> {
    let Some(auth_url) = auth_url.or(config.auth_url.as_deref()) else {
        bail!("No authentication service configured. Pass --auth-url or set client.auth_url.");
    };

    let mut credentials = store.load()?;
    let Some(token) = credentials.token.clone() else {
        bail!("No token stored. Run `parley identity set` first.");
    };

    let response = AuthClient::new(auth_url)?.verify_token(&token).await?;
    let Some(user) = response.user.filter(|_| response.success) else {
        bail!("Token rejected by the authentication service. Please log in again.");
    };

    credentials.user_id = Some(user.id.clone());
    credentials.user = Some(user.clone());
    store.save(&credentials)?;

    if json {
        println!("{}", serde_json::json!({"verified": true, "user": user}));
    } else {
        println!(
            "  {} Token valid for '{}'",
            style("✓").green().bold(),
            style(if user.name.is_empty() { &user.id } else { &user.name }).cyan()
        );
    }
    Ok(())
}

/// Keep the first and last four characters of a token.
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
