use anyhow::{bail, Context, Result};
use clap::Parser;
use pollbot_core::dispatch::Dispatcher;
use pollbot_core::engine::VoteEngine;
use pollbot_core::persistence::{JsonFileMedium, SnapshotMedium};
use pollbot_core::store::PollStore;
use pollbot_core::{sweep, AppState};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod decode;
mod error;
mod rest;
mod routes;
mod signature;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pollbot=info,tower_http=debug")),
        )
        .init();

    let args = cli::Args::parse();
    let config = config::Config::load(&args.config)?;

    let platform = rest::RestPlatform::new(&config.platform.api_base, &config.platform.bot_token)?;

    // ── Command registration mode ────────────────────────────────────────────
    if args.register_commands {
        if config.platform.application_id == 0 {
            bail!("platform.application_id must be set to register commands");
        }
        let count = platform
            .register_commands(config.platform.application_id, &decode::command_definitions())
            .await
            .context("failed to register slash commands")?;
        tracing::info!(count, "Registered slash commands");
        return Ok(());
    }

    if config.platform.bot_token.is_empty() {
        tracing::warn!(
            "No bot token configured (set platform.bot_token or {}); outbound calls will fail",
            config::BOT_TOKEN_ENV
        );
    }
    let verifier = signature::InteractionVerifier::from_hex(&config.platform.public_key)
        .map_err(|e| {
            anyhow::anyhow!(
                "platform.public_key (or {}) is invalid: {e}",
                config::PUBLIC_KEY_ENV
            )
        })?;

    // ── Poll state ───────────────────────────────────────────────────────────
    let engine = VoteEngine::new(config.week_window()?);
    let medium = SnapshotMedium::File(JsonFileMedium::new(&config.storage.snapshot_path));
    let medium_label = medium.describe();
    let store = PollStore::load(medium)
        .await
        .context("failed to load poll snapshot")?;
    let state = AppState::new(store, engine, config.poll_settings());

    let dispatcher = Dispatcher::new(state.clone(), Arc::new(platform));
    let sweeper = sweep::spawn_sweeper(dispatcher.clone(), state.settings.sweep_interval);

    let app = routes::build_router(routes::ServerState {
        dispatcher,
        verifier,
    });

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;

    print_startup_banner(&config, &medium_label, state.store.len());

    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
        println!();
        tracing::info!("Shutting down...");
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    sweeper.abort();
    if let Err(e) = state.store.persist().await {
        tracing::error!("Final snapshot save failed: {e}");
    }

    Ok(())
}

fn print_startup_banner(config: &config::Config, storage: &str, polls: usize) {
    let window = &config.window;
    println!();
    println!("  pollbot v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("  Listening:   http://{}/interactions", config.server.bind_address);
    println!("  Storage:     {} ({} polls)", storage, polls);
    println!(
        "  Reset:       every {} 00:00 (UTC offset {} min)",
        window.anchor, window.utc_offset_minutes
    );
    println!(
        "  Live counts: {}",
        if config.polls.echo_counts_publicly { "public" } else { "hidden" }
    );
    println!();
}
