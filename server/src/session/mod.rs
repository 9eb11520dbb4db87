use std::io;

use comms::{
    event::Event,
    transport::{
        self,
        server::{CommandStream, EventWriter},
    },
};
use nanoid::nanoid;
use tokio::{net::TcpStream, sync::broadcast};
use tokio_stream::StreamExt;

use crate::coordinator::{Coordinator, SessionInfo};

use self::peer_session::PeerSession;

mod peer_session;

/// Given a tcp stream and the coordinator, handles the peer session
/// until the peer closes the tcp stream, a write to it fails, or the server shuts down
pub async fn handle_peer_session(
    coordinator: Coordinator,
    quit_rx: broadcast::Receiver<()>,
    stream: TcpStream,
    max_line_length: usize,
) -> anyhow::Result<()> {
    // Sessions have no identity beyond the connection, a random id is enough for bookkeeping
    let session_info = SessionInfo {
        session_id: nanoid!(),
        peer_addr: stream.peer_addr().ok(),
    };
    // Split the tcp stream into a command stream and an event writer with better ergonomics
    let (commands, event_writer) = transport::server::split_tcp_stream(stream, max_line_length);
    let (mut session, snapshot) = PeerSession::connect(coordinator, session_info).await;

    let result = serve(
        &mut session,
        snapshot.into_events(),
        commands,
        event_writer,
        quit_rx,
    )
    .await;

    // Whatever ended the session, the peer leaves the registry and nothing else changes
    if let Err(e) = &result {
        tracing::warn!(session_id = session.session_id(), error = %e, "session ended with error");
    }
    session.leave().await;

    result
}

async fn serve(
    session: &mut PeerSession,
    snapshot: [Event; 2],
    mut commands: CommandStream,
    mut event_writer: EventWriter,
    mut quit_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    // Welcome the peer with the playlist then the room state, before any broadcast
    for event in snapshot.iter() {
        event_writer.write(event).await?;
    }

    loop {
        tokio::select! {
            cmd = commands.next() => match cmd {
                // The peer closed the tcp stream
                None => break,
                Some(Ok(raw)) => {
                    // Only per-peer replies come back here, room changes arrive through the broadcast
                    if let Some(reply) = session.handle_command(&raw).await {
                        event_writer.write(&reply).await?;
                    }
                }
                // Garbage from a peer is dropped without telling it why
                Some(Err(e)) => {
                    if is_connection_error(&e) {
                        tracing::debug!(session_id = session.session_id(), error = %e, "could not read from peer");
                        break;
                    }
                    tracing::debug!(session_id = session.session_id(), error = %e, "dropping unreadable line");
                }
            },
            // Room wide events are forwarded to the peer
            event = session.recv() => match event {
                Ok(event) => event_writer.write(&event).await?,
                Err(_) => break,
            },
            // If the server is shutting down, we can just close the tcp streams
            // and exit the session handler
            Ok(_) = quit_rx.recv() => {
                drop(event_writer);
                tracing::debug!(session_id = session.session_id(), "gracefully shutting down peer tcp stream");
                break;
            }
        }
    }

    Ok(())
}

/// Whether the error comes from the socket rather than from the line content
fn is_connection_error(e: &anyhow::Error) -> bool {
    e.root_cause()
        .downcast_ref::<io::Error>()
        .is_some_and(|io_error| io_error.kind() != io::ErrorKind::InvalidData)
}
