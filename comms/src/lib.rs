/// Set of commands which the coordinator can receive and process
pub mod command;
/// Set of events split into broadcast and reply events according to their recipients
pub mod event;
/// Client side clock offset estimation and drift correction
pub mod sync;
/// Implementation of event and command transportation over TCP Streams.
/// Requires 'server' or 'client' features to be enabled and will bring in tokio dependency alongside with other dependencies
pub mod transport;
