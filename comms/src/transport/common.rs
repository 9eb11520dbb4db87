use std::pin::Pin;

use serde::Serialize;
use tokio_stream::Stream;

pub const NEW_LINE: &[u8; 2] = b"\r\n";

pub type BoxedStream<Item> = Pin<Box<dyn Stream<Item = Item> + Send>>;

/// Serialize a frame as a single JSON line
pub fn encode_line<T: Serialize>(frame: &T) -> anyhow::Result<Vec<u8>> {
    let mut serialized_bytes = serde_json::to_vec(frame)?;
    serialized_bytes.extend_from_slice(NEW_LINE);

    Ok(serialized_bytes)
}
