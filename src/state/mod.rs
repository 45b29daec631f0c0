//! Session state module
//!
//! Holds the per-run mutable state: the playback mode (what a scanned
//! music card should do) and the current room group, restored from and
//! persisted to the last-room file.

mod session;

pub use session::{PlayMode, Session};
