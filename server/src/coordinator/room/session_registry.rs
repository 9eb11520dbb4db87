use std::collections::HashSet;

use super::session_handle::SessionHandle;

/// [SessionRegistry] keeps track of the connections which are currently live in the room
///
/// Sessions carry no identity beyond their connection, so an entry only lives as long as the socket does
#[derive(Debug, Default)]
pub struct SessionRegistry {
    session_ids: HashSet<String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry {
            session_ids: HashSet::new(),
        }
    }

    /// Register a session, returns false if the session id was already live
    pub fn insert(&mut self, handle: &SessionHandle) -> bool {
        self.session_ids.insert(String::from(handle.session_id()))
    }

    /// Removes a given session, returns false if it was not registered
    pub fn remove(&mut self, handle: &SessionHandle) -> bool {
        self.session_ids.remove(handle.session_id())
    }

    pub fn len(&self) -> usize {
        self.session_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.session_ids.is_empty()
    }
}
