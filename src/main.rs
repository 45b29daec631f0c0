//! swipeplay: scanned-card jukebox daemon for Sonos
//!
//! Reads codes from a barcode/QR scanner exposed as a keyboard-like
//! input device, maps each code to a playback action through a JSON
//! table, and issues the action to a local `node-sonos-http-api`
//! instance. A replay mode feeds codes from a script file for offline
//! testing and demos.

mod config;
mod dispatch;
mod indicator;
mod replay;
mod scanner;
mod sonos;
mod state;
mod table;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Args, Config};
use crate::dispatch::Dispatcher;
use crate::indicator::StatusLed;
use crate::scanner::{ScanDecoder, ScannerListener, IDLE_FLUSH};
use crate::state::Session;
use crate::table::CommandTable;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "swipeplay starting");

    let config = Config::from_args(Args::parse());
    info!(base_url = %config.base_url, default_room = %config.default_room, "configuration loaded");

    // Without the table no scanned code can ever be handled; the error
    // carries the instruction to run the association step first.
    let table =
        CommandTable::load(&config.mapping_file).context("cannot start without a command table")?;

    let session = Session::restore(&config.last_room_file, &config.default_room);

    let replay_mode = config.replay_file.is_some();
    let led = if replay_mode {
        StatusLed::disabled()
    } else {
        StatusLed::new()
    };

    let client = sonos::Client::new(&config.base_url)?;
    let mut dispatcher = Dispatcher::new(client, session, table, led);

    dispatcher.announce_startup(config.skip_load).await;

    if let Some(script) = &config.replay_file {
        return replay::run(&mut dispatcher, script, config.replay_delay).await;
    }

    // Scanner thread -> run loop
    let (key_tx, key_rx) = mpsc::channel(64);
    let listener = ScannerListener::new(&config.input_device, key_tx);
    listener.start()?;

    info!("entering scan loop");

    tokio::select! {
        _ = run_scan_loop(&mut dispatcher, key_rx) => {
            info!("scan loop ended");
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
    }

    listener.stop();
    info!("swipeplay stopped");

    Ok(())
}

/// Poll the scanner for completed codes and dispatch each one.
///
/// Characters arrive from the listener thread; a code completes on the
/// scanner's newline or when no character arrives within the idle window
/// (for scanners that never send a terminator).
async fn run_scan_loop(dispatcher: &mut Dispatcher, mut key_rx: mpsc::Receiver<char>) {
    let mut decoder = ScanDecoder::new();

    loop {
        match tokio::time::timeout(IDLE_FLUSH, key_rx.recv()).await {
            Ok(Some(ch)) => {
                if let Some(code) = decoder.push(ch) {
                    dispatcher.handle_swipe(&code).await;
                }
            }
            Ok(None) => {
                debug!("scanner listener closed the key channel");
                break;
            }
            Err(_) => {
                if let Some(code) = decoder.flush() {
                    dispatcher.handle_swipe(&code).await;
                }
            }
        }
    }
}

/// Wait for SIGTERM or SIGINT.
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sig) => sig,
        Err(e) => {
            tracing::error!(?e, "failed to register SIGTERM handler");
            return std::future::pending::<()>().await;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(sig) => sig,
        Err(e) => {
            tracing::error!(?e, "failed to register SIGINT handler");
            return std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => debug!("received SIGTERM"),
        _ = sigint.recv() => debug!("received SIGINT"),
    }
}
