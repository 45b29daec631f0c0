//! Command-line arguments and runtime configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Translates scanned QR/barcode cards into Sonos commands
#[derive(Parser, Debug)]
#[command(name = "swipeplay", version)]
pub struct Args {
    /// Name of the default device/room
    #[arg(long, default_value = "Living Room", env = "SWIPEPLAY_DEFAULT_ROOM")]
    pub default_room: String,

    /// Hostname or IP of the machine running `node-sonos-http-api`
    #[arg(long, default_value = "localhost", env = "SWIPEPLAY_HOSTNAME")]
    pub hostname: String,

    /// Input device node of the scanner
    #[arg(long, default_value = "/dev/input/event0", env = "SWIPEPLAY_INPUT_DEVICE")]
    pub input_device: PathBuf,

    /// Path to the code → command mapping table
    #[arg(long, default_value = "swipeToCmd.json")]
    pub mapping_file: PathBuf,

    /// Path of the persisted last-used room group
    #[arg(long, default_value = ".last-room")]
    pub last_room_file: PathBuf,

    /// Skip the music library warm-up (useful if the server already loaded it)
    #[arg(long)]
    pub skip_load: bool,

    /// Replay codes from a script file instead of reading the scanner
    #[arg(long)]
    pub replay_file: Option<PathBuf>,

    /// Seconds to wait between replayed codes
    #[arg(long, default_value = "4")]
    pub replay_delay_secs: u64,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub default_room: String,
    pub input_device: PathBuf,
    pub mapping_file: PathBuf,
    pub last_room_file: PathBuf,
    pub skip_load: bool,
    pub replay_file: Option<PathBuf>,
    pub replay_delay: Duration,
}

impl Config {
    pub fn from_args(args: Args) -> Self {
        Self {
            base_url: format!("http://{}:5005", args.hostname),
            default_room: args.default_room,
            input_device: args.input_device,
            mapping_file: args.mapping_file,
            last_room_file: args.last_room_file,
            skip_load: args.skip_load,
            replay_file: args.replay_file,
            replay_delay: Duration::from_secs(args.replay_delay_secs),
        }
    }
}
