//! Parley CLI and History REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, loads `config.toml` from the data directory, then
//! starts the REST server, the interactive chat, or a one-shot command.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use parley_core::client::context::SessionContext;
use parley_infra::config::load_config;
use parley_infra::credentials::FileCredentialStore;
use parley_infra::filesystem::resolve_data_dir;
use parley_observe::tracing_setup::{LogFormat, init_tracing, shutdown_tracing};

use cli::backend::ClientBackend;
use cli::{Cli, Commands, IdentityCommand, SessionCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need logging or config
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let is_server = matches!(cli.command, Commands::Serve { .. });
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 if is_server => "info",
        0 => "warn",
        1 => "info,parley_api=debug,parley_core=debug,parley_infra=debug",
        _ => "trace",
    };
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(filter, format, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = resolve_data_dir();
    let config = load_config(&data_dir).await;

    match cli.command {
        Commands::Serve {
            port,
            host,
            ephemeral,
        } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let state = AppState::init(data_dir, ephemeral).await?;
            let store_label = match state.store_kind() {
                "sqlite" => format!("Store: sqlite ({})", state.data_dir.display()),
                other => format!("Store: {other}"),
            };

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Parley history service listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!(
                "  {}",
                console::style(store_label).dim()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Chat { backend, model } => {
            cli::chat::loop_runner::run_chat(&data_dir, &config.client, &backend, model.as_deref())
                .await?;
        }

        Commands::Session { backend, action } => {
            let store = FileCredentialStore::in_data_dir(&data_dir);
            let ctx = SessionContext::from_store(&store)?;
            let backend = ClientBackend::connect(&backend, &config.client, &data_dir).await?;

            match action {
                SessionCommand::List => {
                    cli::session::list_sessions(&backend, &ctx, cli.json).await?;
                }
                SessionCommand::Show { session } => {
                    cli::session::show_session(&backend, &ctx, &session, cli.json).await?;
                }
                SessionCommand::New { name } => {
                    cli::session::new_session(&backend, &ctx, name.as_deref(), cli.json).await?;
                }
                SessionCommand::Delete { session, force } => {
                    cli::session::delete_session(&backend, &ctx, &session, force, cli.json).await?;
                }
                SessionCommand::Rename { session, name } => {
                    cli::session::rename_session(&backend, &ctx, &session, &name, cli.json).await?;
                }
            }
        }

        Commands::Identity { action } => {
            let store = FileCredentialStore::in_data_dir(&data_dir);
            match action {
                IdentityCommand::Set {
                    user_id,
                    token,
                    name,
                    email,
                } => cli::identity::set_identity(&store, user_id, token, name, email, cli.json)?,
                IdentityCommand::Show => cli::identity::show_identity(&store, cli.json)?,
                IdentityCommand::Clear => cli::identity::clear_identity(&store, cli.json)?,
                IdentityCommand::Verify { auth_url } => {
                    cli::identity::verify_identity(&store, &config.client, auth_url.as_deref(), cli.json)
                        .await?;
                }
            }
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
///
/// If a handler cannot be installed the server keeps running until the
/// other signal arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
