use anyhow::Context;
use chrono::Utc;
use comms::{
    command::{ControlActionCommand, ControlActionKind, ControlValue, UserCommand},
    event::{Event, PlaybackStatus, SyncStateEvent, TimeSyncResponseEvent},
    sync::{ClockEstimator, ClockSample, DEFAULT_PROBE_COUNT},
    transport::{self, server::DEFAULT_MAX_LINE_LENGTH},
};
use tokio::net::{TcpListener, TcpStream};
use tokio_stream::StreamExt;

const PORT: usize = 8081;

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

async fn server_example() -> anyhow::Result<()> {
    // bind to the example port to wait for client connection
    let listener = TcpListener::bind(format!("0.0.0.0:{}", PORT))
        .await
        .expect("could not bind to the port");

    // accept the only client connection we will have
    let tcp_stream = match listener.accept().await {
        Ok((tcp_stream, _addr)) => tcp_stream,
        Err(e) => return Err(anyhow::anyhow!("failed to accept client: {}", e)),
    };

    // break the client connection into higher level API for ease of use
    let (mut command_stream, mut event_writer) =
        transport::server::split_tcp_stream(tcp_stream, DEFAULT_MAX_LINE_LENGTH);

    // listen for commands from the client until the connection is closed
    while let Some(result) = command_stream.next().await {
        let raw = match result {
            Ok(raw) => raw,
            // client has sent a line which we could not read or parse
            Err(e) => {
                println!("SERVER: failed to read command: {}", e);
                continue;
            }
        };

        match serde_json::from_value::<UserCommand>(serde_json::to_value(&raw)?) {
            Ok(UserCommand::TimeSync(client_send_time)) => {
                event_writer
                    .write(&Event::TimeSyncResponse(TimeSyncResponseEvent {
                        client_send_time,
                        server_receive_time: now_ms(),
                    }))
                    .await?;
            }
            Ok(UserCommand::ControlAction(ControlActionCommand {
                action: ControlActionKind::Switch,
                value: Some(ControlValue::Text(url)),
            })) => {
                let now = now_ms();
                event_writer
                    .write(&Event::SyncState(SyncStateEvent {
                        url: Some(url),
                        status: PlaybackStatus::Playing,
                        playback_rate: 1.0,
                        anchor_position: 0.0,
                        anchor_server_time: now,
                        last_updated: now,
                    }))
                    .await?;
            }
            other => println!("SERVER: ignoring command: {:?}", other),
        }
    }

    Ok(())
}

async fn client_example() -> anyhow::Result<()> {
    // create a client connection to the server
    let tcp_stream = match TcpStream::connect(format!("localhost:{}", PORT)).await {
        Ok(tcp_stream) => tcp_stream,
        Err(e) => return Err(anyhow::anyhow!("failed to connect to server: {}", e)),
    };

    // break the server connection into higher level API for ease of use
    let (mut event_stream, mut command_writer) = transport::client::split_tcp_stream(tcp_stream);
    let mut estimator = ClockEstimator::new();

    // sample the server clock a few times, one probe in flight at a time
    for _ in 0..DEFAULT_PROBE_COUNT {
        command_writer
            .write(&UserCommand::TimeSync(now_ms() as f64))
            .await?;

        match event_stream.next().await {
            Some(Ok(Event::TimeSyncResponse(response))) => {
                estimator.record(ClockSample::from_response(&response, now_ms() as f64));
            }
            Some(Ok(event)) => println!("CLIENT: unexpected event: {:?}", event),
            Some(Err(e)) => println!("CLIENT: failed to read event: {}", e),
            None => return Err(anyhow::anyhow!("server closed the connection")),
        }
    }

    println!("CLIENT: estimated clock offset {:?}ms", estimator.offset());

    command_writer
        .write(&UserCommand::ControlAction(ControlActionCommand::switch(
            "https://media.example/clip.mp4",
        )))
        .await?;

    match event_stream.next().await {
        Some(Ok(Event::SyncState(state))) => {
            let server_now = estimator
                .server_time(now_ms() as f64)
                .context("no clock sample recorded")?;
            println!(
                "CLIENT: now playing {:?} at {:.3}s",
                state.url,
                state.effective_position(server_now)
            );
        }
        Some(Ok(event)) => println!("CLIENT: unexpected event: {:?}", event),
        Some(Err(e)) => println!("CLIENT: failed to read event: {}", e),
        None => return Err(anyhow::anyhow!("server closed the connection")),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tokio::try_join!(server_example(), client_example()).context("one of the examples failed")?;

    println!("example ran without problems");

    Ok(())
}
