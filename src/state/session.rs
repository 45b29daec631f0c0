//! Session state: playback mode and current room group
//!
//! The room group is an ordered list whose first element is the primary
//! room, the one that owns the Sonos group and receives room-addressed
//! requests. The group is restored from disk at startup and persisted
//! (best-effort) on every switch.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// What a scanned library/streaming card should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// Play the scanned song right away
    SongImmediate,
    /// Play the scanned song's whole album right away
    AlbumImmediate,
    /// Append scanned songs to the queue
    BuildQueue,
}

impl Default for PlayMode {
    fn default() -> Self {
        Self::SongImmediate
    }
}

impl std::fmt::Display for PlayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayMode::SongImmediate => write!(f, "SongImmediate"),
            PlayMode::AlbumImmediate => write!(f, "AlbumImmediate"),
            PlayMode::BuildQueue => write!(f, "BuildQueue"),
        }
    }
}

/// Mutable per-run state owned by the dispatcher
#[derive(Debug)]
pub struct Session {
    mode: PlayMode,
    rooms: Vec<String>,
    combine_rooms: bool,
    last_room_path: PathBuf,
}

impl Session {
    /// Restore the session, falling back to the default room when the
    /// last-room file is missing or unreadable.
    pub fn restore(last_room_path: &Path, default_room: &str) -> Self {
        let rooms = match read_room_group(last_room_path) {
            Some(rooms) => {
                info!(?rooms, "restored last used room group");
                rooms
            }
            None => {
                info!(room = default_room, "starting with default room");
                vec![default_room.to_string()]
            }
        };

        Self {
            mode: PlayMode::default(),
            rooms,
            combine_rooms: false,
            last_room_path: last_room_path.to_owned(),
        }
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PlayMode) {
        if self.mode != mode {
            info!(from = %self.mode, to = %mode, "play mode changed");
            self.mode = mode;
        }
    }

    /// The primary room: first in the group, addressee of room requests.
    pub fn primary(&self) -> &str {
        &self.rooms[0]
    }

    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    pub fn combine_rooms(&self) -> bool {
        self.combine_rooms
    }

    /// Flip the combine flag; while set, room switches add to the group
    /// instead of replacing it.
    pub fn toggle_combine_rooms(&mut self) {
        self.combine_rooms = !self.combine_rooms;
        info!(combine = self.combine_rooms, "combine-rooms flag toggled");
    }

    /// Replace the room group and persist it. The group must be non-empty.
    pub fn set_rooms(&mut self, rooms: Vec<String>) {
        debug_assert!(!rooms.is_empty());
        self.rooms = rooms;
        self.persist();
    }

    /// Best-effort write of the current group; a failure costs only the
    /// restore on next startup.
    fn persist(&self) {
        let contents = match serde_json::to_string(&self.rooms) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(?e, "failed to encode room group");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.last_room_path, contents) {
            warn!(?e, path = ?self.last_room_path, "failed to persist room group");
        }
    }
}

/// Read the persisted room group; `None` on any read or parse failure.
fn read_room_group(path: &Path) -> Option<Vec<String>> {
    let contents = std::fs::read_to_string(path).ok()?;
    let rooms: Vec<String> = serde_json::from_str(&contents).ok()?;
    if rooms.is_empty() {
        None
    } else {
        Some(rooms)
    }
}
