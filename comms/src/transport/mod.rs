/// Transport over TCP implementation for a peer to be able to interact with the coordinator
#[cfg(feature = "client")]
pub mod client;
#[cfg(any(feature = "client", feature = "server"))]
mod common;
/// Transport over TCP implementation for the coordinator to interact with a single peer TCP Stream
#[cfg(feature = "server")]
pub mod server;
