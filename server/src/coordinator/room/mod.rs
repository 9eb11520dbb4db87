mod playlist;
mod room_state;
mod session_handle;
mod session_registry;
mod sync_room;

pub use self::playlist::Playlist;
pub use self::room_state::{RoomState, Transition};
pub use self::session_handle::{SessionHandle, SessionInfo};
pub use self::session_registry::SessionRegistry;
pub use self::sync_room::{RoomSettings, RoomSnapshot, SyncRoom};
