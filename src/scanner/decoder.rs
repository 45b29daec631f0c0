//! Accumulates decoded characters into complete scanned codes
//!
//! A code is complete when the scanner sends a newline, or when the run
//! loop sees no input for the idle window and calls `flush()` (some
//! scanners never send a terminator).

use std::time::Duration;

/// How long the run loop waits for the next character before flushing
/// a non-empty buffer as a completed code.
pub const IDLE_FLUSH: Duration = Duration::from_millis(700);

/// Builds scanned codes one character at a time.
#[derive(Debug, Default)]
pub struct ScanDecoder {
    buf: String,
}

impl ScanDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one decoded character. Returns a completed code when the
    /// character is a newline and the buffer holds something non-empty.
    pub fn push(&mut self, ch: char) -> Option<String> {
        if ch == '\n' {
            return self.flush();
        }
        self.buf.push(ch);
        None
    }

    /// Complete the in-progress code, if any. Surrounding whitespace is
    /// trimmed; codes that trim to nothing are discarded.
    pub fn flush(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let code = std::mem::take(&mut self.buf);
        let code = code.trim();
        if code.is_empty() {
            None
        } else {
            Some(code.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_str(decoder: &mut ScanDecoder, s: &str) -> Option<String> {
        let mut out = None;
        for ch in s.chars() {
            if let Some(code) = decoder.push(ch) {
                out = Some(code);
            }
        }
        out
    }

    #[test]
    fn test_newline_completes_code() {
        let mut decoder = ScanDecoder::new();
        assert_eq!(push_str(&mut decoder, "cmd:playpause\n").as_deref(), Some("cmd:playpause"));
    }

    #[test]
    fn test_idle_flush_completes_code() {
        let mut decoder = ScanDecoder::new();
        assert_eq!(push_str(&mut decoder, "lib:42"), None);
        assert_eq!(decoder.flush().as_deref(), Some("lib:42"));
        // Buffer resets after a flush
        assert_eq!(decoder.flush(), None);
    }

    #[test]
    fn test_whitespace_trimmed() {
        let mut decoder = ScanDecoder::new();
        assert_eq!(push_str(&mut decoder, "  spotify:abc \n").as_deref(), Some("spotify:abc"));
    }

    #[test]
    fn test_empty_codes_discarded() {
        let mut decoder = ScanDecoder::new();
        assert_eq!(decoder.push('\n'), None);
        assert_eq!(push_str(&mut decoder, "   \n"), None);
    }
}
