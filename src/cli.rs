use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "loopcast",
    about = "Endless audio broadcast — `loopcast /path/to/mp3s` loops the folder to every listener",
    long_about = None,
    version,
)]
pub struct Args {
    /// Directory of MP3 files to broadcast (created if missing) [default: static/library]
    pub media_dir: Option<PathBuf>,

    /// HTTP port to listen on [default: 10000]
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// JSON file holding the listener log [default: listeners.json]
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Path to TOML config file (overrides default search: ./loopcast.toml, ~/.config/loopcast/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bind to localhost only (127.0.0.1) instead of all interfaces (0.0.0.0)
    #[arg(long)]
    pub localhost: bool,

    /// Base URL of the IP geolocation service; the address is appended as a path segment
    #[arg(long, value_name = "URL")]
    pub geo_url: Option<String>,

    /// Skip geolocation entirely; every listener is recorded as "Unknown"
    #[arg(long)]
    pub no_geo: bool,
}
