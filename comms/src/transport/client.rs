use anyhow::Context;
use serde::Serialize;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{tcp::OwnedWriteHalf, TcpStream},
};
use tokio_stream::{wrappers::LinesStream, StreamExt};

use crate::{
    command::{RawCommand, UserCommand},
    event::Event,
};

use super::common::{encode_line, BoxedStream};

/// [EventStream] is a stream of [Event]s sent by the coordinator
///
/// # Cancel Safety
///
/// This stream is cancel-safe, meaning that it can be used in [tokio::select!]
/// without the risk of missing events.
pub type EventStream = BoxedStream<anyhow::Result<Event>>;

/// [CommandWriter] sends commands to the coordinator over the write half of a [TcpStream]
pub struct CommandWriter {
    writer: OwnedWriteHalf,
}

impl CommandWriter {
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self { writer }
    }

    /// Send a typed [UserCommand]
    ///
    /// # Cancel Safety
    ///
    /// Not cancel-safe: a write interrupted by another [tokio::select!] branch may leave
    /// half a line on the socket, and the coordinator will drop it as garbage.
    pub async fn write(&mut self, command: &UserCommand) -> anyhow::Result<()> {
        self.send(command).await
    }

    /// Send a [RawCommand], whatever its payload looks like
    ///
    /// # Cancel Safety
    ///
    /// Same as [CommandWriter::write].
    pub async fn write_raw(&mut self, command: &RawCommand) -> anyhow::Result<()> {
        self.send(command).await
    }

    async fn send<T: Serialize>(&mut self, frame: &T) -> anyhow::Result<()> {
        let line = encode_line(frame)?;
        self.writer
            .write_all(&line)
            .await
            .context("could not write command to the coordinator")
    }
}

/// Splits a TCP stream into a stream of events and a command writer.
///
/// Events from the coordinator are trusted, there is no line limit on this side.
///
/// # Arguments
///
/// - `stream` - A [TcpStream] to split
pub fn split_tcp_stream(stream: TcpStream) -> (EventStream, CommandWriter) {
    let (reader, writer) = stream.into_split();
    let events = LinesStream::new(BufReader::new(reader).lines()).map(|line| {
        let line = line.context("could not read line from the coordinator")?;

        serde_json::from_str::<Event>(&line)
            .context("failed to deserialize event from the coordinator")
    });

    (Box::pin(events), CommandWriter::new(writer))
}
