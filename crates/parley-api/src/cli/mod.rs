//! CLI command definitions and dispatch for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing. Flags override values from
//! `config.toml`, and most of them can also be set through the environment.

pub mod backend;
pub mod chat;
pub mod identity;
pub mod session;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Multi-session chat with a persistent history backend.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "PARLEY_LOG_JSON")]
    pub log_json: bool,

    /// Export spans through the OpenTelemetry stdout exporter.
    #[arg(long, global = true, env = "PARLEY_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the History REST API server.
    Serve {
        /// Port to listen on [default: 3000].
        #[arg(long, env = "PARLEY_PORT")]
        port: Option<u16>,

        /// Host to bind to [default: 127.0.0.1].
        #[arg(long, env = "PARLEY_HOST")]
        host: Option<String>,

        /// Keep sessions in memory only; nothing is written to disk.
        #[arg(long)]
        ephemeral: bool,
    },

    /// Open the interactive chat.
    Chat {
        #[command(flatten)]
        backend: BackendArgs,

        /// Model name for generateContent.
        #[arg(long, env = "PARLEY_MODEL")]
        model: Option<String>,
    },

    /// Inspect and manage chat sessions.
    #[command(alias = "sessions")]
    Session {
        #[command(flatten)]
        backend: BackendArgs,

        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Manage the locally stored identity used by the chat client.
    Identity {
        #[command(subcommand)]
        action: IdentityCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Where the client finds the History Service.
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Base URL of the History Service.
    #[arg(long, global = true, env = "PARLEY_BACKEND_URL", conflicts_with = "local")]
    pub backend_url: Option<String>,

    /// Use the SQLite store in the data directory directly, without a server.
    #[arg(long, global = true)]
    pub local: bool,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// List sessions, most recent first.
    #[command(alias = "ls")]
    List,

    /// Print a session's transcript.
    Show {
        /// List position (1 = most recent) or session id.
        session: String,
    },

    /// Create a session seeded with the welcome message.
    New {
        /// Session name [default: "Session <date time>"].
        name: Option<String>,
    },

    /// Delete a session and its messages.
    #[command(alias = "rm")]
    Delete {
        /// List position (1 = most recent) or session id.
        session: String,

        /// Skip confirmation prompt.
        #[arg(long, short)]
        force: bool,
    },

    /// Rename a session.
    Rename {
        /// List position (1 = most recent) or session id.
        session: String,

        /// New name.
        name: String,
    },
}

#[derive(Subcommand)]
pub enum IdentityCommand {
    /// Store the identity used for chat.
    Set {
        /// Bare user id.
        #[arg(long)]
        user_id: Option<String>,

        /// Token issued by the authentication service.
        #[arg(long, env = "PARLEY_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Display name.
        #[arg(long, requires = "user_id")]
        name: Option<String>,

        /// Email address.
        #[arg(long, requires = "user_id")]
        email: Option<String>,
    },

    /// Show the stored identity and which user id it resolves to.
    Show,

    /// Forget the stored identity.
    Clear,

    /// Check the stored token with the authentication service and store the
    /// returned user record.
    Verify {
        /// Base URL of the authentication service.
        #[arg(long, env = "PARLEY_AUTH_URL")]
        auth_url: Option<String>,
    },
}
