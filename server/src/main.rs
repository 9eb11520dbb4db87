use anyhow::Context;
use playback_server::{config::Config, coordinator::CoordinatorBuilder};
use tokio::{
    net::TcpListener,
    signal::unix::{signal, SignalKind},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playback_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("failed to load configuration")?;

    let coordinator = CoordinatorBuilder::from_config(&config).build();

    let mut interrupt =
        signal(SignalKind::interrupt()).expect("failed to create interrupt signal stream");
    let server = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("could not bind to {}", config.bind_addr()))?;

    tracing::info!(
        addr = %config.bind_addr(),
        max_playlist_size = config.max_playlist_size,
        playback_rate = config.playback_rate,
        "Listening"
    );

    playback_server::serve(server, coordinator, config.max_line_length, async move {
        interrupt.recv().await;
    })
    .await?;

    tracing::info!("Server shut down");

    Ok(())
}
