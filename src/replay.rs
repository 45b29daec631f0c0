//! Script replay: feed codes from a file instead of live hardware
//!
//! Lets the whole dispatch path run on a machine with no scanner
//! attached. Scripts are newline-delimited codes with `#` comments;
//! a fixed delay between dispatches emulates human scan pacing.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::dispatch::Dispatcher;

/// Extract the dispatchable codes from a script: inline `#` comments are
/// stripped, blank and comment-only lines dropped.
pub fn parse_script(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(|line| {
            let code = line.split('#').next().unwrap_or("").trim();
            if code.is_empty() {
                None
            } else {
                Some(code.to_string())
            }
        })
        .collect()
}

/// Dispatch every code in the script, pausing `delay` between codes.
pub async fn run(dispatcher: &mut Dispatcher, path: &Path, delay: Duration) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read replay script {}", path.display()))?;

    let codes = parse_script(&contents);
    info!(count = codes.len(), ?path, "replaying script");

    for code in &codes {
        dispatcher.handle_swipe(code).await;
        tokio::time::sleep(delay).await;
    }

    info!("replay complete");
    Ok(())
}
