//! Onboard status LED feedback
//!
//! Blinks the Raspberry Pi green LED twice after a code is handled, the
//! only feedback for silent actions like queueing a song. Every sysfs
//! write is best-effort: other boards simply won't have the paths, and
//! that must never disturb the run loop.

use std::time::Duration;

use tracing::debug;

const LED_TRIGGER: &str = "/sys/class/leds/led0/trigger";
const LED_BRIGHTNESS: &str = "/sys/class/leds/led0/brightness";
const PULSE: Duration = Duration::from_millis(150);

/// Handle to the host status LED
#[derive(Debug, Clone, Copy)]
pub struct StatusLed {
    enabled: bool,
}

impl StatusLed {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// An indicator that does nothing; used in replay mode and tests.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Blink the LED on-off twice.
    pub async fn blink_twice(&self) {
        if !self.enabled {
            return;
        }

        // Detach the LED from its default kernel trigger so brightness
        // writes take effect.
        write_sysfs(LED_TRIGGER, "none");

        for _ in 0..2 {
            write_sysfs(LED_BRIGHTNESS, "1");
            tokio::time::sleep(PULSE).await;
            write_sysfs(LED_BRIGHTNESS, "0");
            tokio::time::sleep(PULSE).await;
        }
    }
}

impl Default for StatusLed {
    fn default() -> Self {
        Self::new()
    }
}

fn write_sysfs(path: &str, value: &str) {
    if let Err(e) = std::fs::write(path, value) {
        debug!(?e, path, "status LED write failed");
    }
}
