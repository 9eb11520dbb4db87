use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: String,
    pub peer_addr: Option<SocketAddr>,
}

#[derive(Debug)]
/// [SessionHandle] identifies one live connection inside the room.
///
/// It is created when a peer connects and handed out to the session task,
/// consuming it on disconnect removes the peer from the registry.
pub struct SessionHandle {
    /// The session this handle belongs to
    session_info: SessionInfo,
}

impl SessionHandle {
    pub(super) fn new(session_info: SessionInfo) -> Self {
        SessionHandle { session_info }
    }

    pub fn session_id(&self) -> &str {
        &self.session_info.session_id
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.session_info.peer_addr
    }
}
