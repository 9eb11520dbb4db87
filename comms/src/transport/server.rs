use std::io;

use anyhow::Context;
use bytes::BytesMut;
use tokio::{
    io::AsyncWriteExt,
    net::{tcp::OwnedWriteHalf, TcpStream},
};
use tokio_stream::StreamExt;
use tokio_util::codec::{Decoder, FramedRead, LinesCodec, LinesCodecError};

use crate::{command::RawCommand, event};

use super::common::{encode_line, BoxedStream};

/// Longest command line a peer may send, in bytes
///
/// Leaves room for a 1024 character link with every character JSON-escaped.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8 * 1024;

/// [CommandStream] is a stream of [RawCommand]s sent by the client
///
/// A line that is not a JSON command envelope, is not UTF-8 or is longer than the
/// line limit yields an `Err` item, the stream itself keeps going. It only ends
/// when the client closes the connection or the socket fails.
///
/// # Cancel Safety
///
/// This stream is cancel-safe, meaning that it can be used in [tokio::select!]
/// without the risk of missing commands.
pub type CommandStream = BoxedStream<anyhow::Result<RawCommand>>;

/// [CommandCodec] frames one [RawCommand] per line and caps how much of a line is buffered
///
/// Once a line passes the limit the rest of it is discarded up to the next newline,
/// so an endless line costs at most `max_line_length` bytes of memory.
#[derive(Debug, Clone)]
pub struct CommandCodec {
    lines: LinesCodec,
    max_line_length: usize,
}

impl CommandCodec {
    pub fn new(max_line_length: usize) -> Self {
        CommandCodec {
            lines: LinesCodec::new_with_max_length(max_line_length),
            max_line_length,
        }
    }

    /// Content problems become an `Err` frame, only socket failures end the stream
    fn frame(
        &self,
        line: Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<anyhow::Result<RawCommand>>, io::Error> {
        match line {
            Ok(Some(line)) => Ok(Some(
                serde_json::from_str::<RawCommand>(&line)
                    .context("failed to deserialize command from client"),
            )),
            Ok(None) => Ok(None),
            Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Err(anyhow::anyhow!(
                "command line exceeds {} bytes",
                self.max_line_length
            )))),
            Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => Ok(Some(Err(
                anyhow::Error::new(e).context("command line is not valid UTF-8"),
            ))),
            Err(LinesCodecError::Io(e)) => Err(e),
        }
    }
}

impl Default for CommandCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl Decoder for CommandCodec {
    type Item = anyhow::Result<RawCommand>;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let line = self.lines.decode(src);
        self.frame(line)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let line = self.lines.decode_eof(src);
        self.frame(line)
    }
}

/// [EventWriter] is a wrapper around a [TcpStream] which writes [crate::event::Event]s to the client
pub struct EventWriter {
    writer: OwnedWriteHalf,
}

impl EventWriter {
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self { writer }
    }

    /// Send a [crate::event::Event] to the backing [TcpStream]
    ///
    /// # Cancel Safety
    ///
    /// Not cancel-safe: a write interrupted by another [tokio::select!] branch may leave
    /// half a line on the socket, and the peer will fail to parse what follows.
    pub async fn write(&mut self, event: &event::Event) -> anyhow::Result<()> {
        let line = encode_line(event)?;
        self.writer.write_all(&line).await?;

        Ok(())
    }
}

/// Splits a TCP stream into a stream of commands and an event writer.
///
/// # Arguments
///
/// - `stream` - A [TcpStream] to split
/// - `max_line_length` - Longest command line, in bytes, buffered before it is dropped
pub fn split_tcp_stream(
    stream: TcpStream,
    max_line_length: usize,
) -> (CommandStream, EventWriter) {
    let (reader, writer) = stream.into_split();
    let commands = FramedRead::new(reader, CommandCodec::new(max_line_length)).map(|frame| {
        frame
            .context("could not read line from the client")
            .and_then(|command| command)
    });

    (Box::pin(commands), EventWriter::new(writer))
}
