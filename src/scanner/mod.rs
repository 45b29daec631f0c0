//! Scanner module: turns raw scanner key events into scanned codes
//!
//! The listener reads the evdev node on a dedicated thread; the decoder
//! assembles forwarded characters into complete codes, flushed either on
//! newline or after the idle window.

mod decoder;
mod keys;
mod listener;

pub use decoder::{ScanDecoder, IDLE_FLUSH};
pub use listener::{ScannerError, ScannerListener};
