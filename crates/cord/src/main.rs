//! Example bot
//!
//! Logs every event it receives and answers `!ping` with `Pong!`.
//!
//! Run with:
//! ```bash
//! DISCORD_TOKEN=... cargo run -p cord --bin cord-bot
//! ```

use cord::builders::MessageBuilder;
use cord::{listener_fn, ClientConfig, DiscordApi, DiscordApiBuilder, Event, ListenerScope};
use cord_common::{try_init_tracing_with_config, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = try_init_tracing_with_config(TracingConfig::from_env()) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Bot stopped with an error");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting cord-bot...");

    let config = ClientConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;
    config.validate()?;

    info!(
        env = ?config.env,
        shard = config.shard,
        total_shards = config.total_shards,
        "Configuration loaded"
    );

    let log_events = listener_fn(|event: Event| async move {
        info!(event = event.event_type(), server_id = ?event.server_id(), "Event received");
    });
    let api = DiscordApiBuilder::from_config(&config)
        .add_listener(ListenerScope::Global, log_events)
        .login()
        .await?;

    if let Some(user) = api.yourself() {
        info!(user_id = %user.id, name = %user.name, servers = api.servers().len(), "Logged in");
    }

    let ping_api = api.clone();
    api.add_listener(
        ListenerScope::Global,
        listener_fn(move |event: Event| {
            let api = ping_api.clone();
            async move { answer_ping(&api, &event).await }
        }),
    );

    let shutdown_api = api.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            shutdown_api.disconnect();
        }
    });

    api.join().await?;
    info!("Disconnected");

    Ok(())
}

async fn answer_ping(api: &DiscordApi, event: &Event) {
    let Event::MessageCreate(e) = event else {
        return;
    };
    if e.message.author.bot || e.message.content.trim() != "!ping" {
        return;
    }

    let reply = MessageBuilder::new().content("Pong!");
    if let Err(e) = api.send_message(e.message.channel_id, &reply).await {
        error!(error = %e, "Failed to answer ping");
    }
}
