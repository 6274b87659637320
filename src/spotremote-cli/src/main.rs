use anyhow::Result;
use clap::{Parser, Subcommand};
use spotremote_core::{init_logging, AppDirs, Config, WebHelperConfig};
use thiserror::Error;
use webhelper::{PlaybackStatus, WebHelper};

#[derive(Debug, Parser)]
#[command(name = "spotremote", version, about = "Remote control for the desktop player")]
struct Cli {
    /// Do not launch the helper if it is not running
    #[arg(long, global = true)]
    no_start: bool,
    /// Helper port override (skips the port scan)
    #[arg(long, global = true)]
    port: Option<u16>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Show what is playing
    Status {
        /// Print the normalized status as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the helper's unprocessed status payload
    Raw,
    /// Play a track URI, or resume when none is given
    Play {
        uri: Option<String>,
        /// Playlist or album URI to play the track in
        #[arg(long)]
        context: Option<String>,
    },
    /// Pause playback
    Pause,
    /// Resume playback
    Resume,
    /// Restart the current track at an offset (often ignored by the helper)
    Seek { seconds: u64 },
    /// Helper and client versions
    Info,
    /// Which transport controls are currently enabled
    Controls,
}

#[derive(Debug, Error, PartialEq, Eq)]
enum CliError {
    #[error("--port must be between 1 and 65535")]
    InvalidPort,
}

impl Cli {
    fn helper_config(&self, config: &Config) -> Result<WebHelperConfig, CliError> {
        let mut helper = config.webhelper.clone();
        if let Some(port) = self.port {
            if port == 0 {
                return Err(CliError::InvalidPort);
            }
            helper.port = Some(port);
        }
        if self.no_start {
            helper.auto_start = false;
        }
        Ok(helper)
    }
}

fn describe(status: &PlaybackStatus) -> String {
    let state = if status.playing { "Playing" } else { "Paused" };
    match &status.current {
        Some(now) => format!(
            "{state}: {} - {} ({}) at {} | volume {}%",
            now.artist.name,
            now.track.name,
            now.album.name,
            webhelper::format_offset(status.position_seconds as u64),
            status.volume
        ),
        None => format!("{state}: nothing loaded | volume {}%", status.volume),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::discover()?;
    let config = Config::load_or_default(&dirs)?;
    let _logging = init_logging(&config.logging, &dirs)?;

    let helper_config = cli.helper_config(&config)?;
    let auto_start = helper_config.auto_start;
    let helper = WebHelper::new(helper_config)?;
    let url = helper.connect(auto_start).await?;
    tracing::info!("helper session ready at {url}");

    match cli.command {
        Command::Status { json } => {
            let status = helper.status(None).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("{}", describe(&status));
            }
        }
        Command::Raw => {
            let raw = helper.raw_status().await?;
            println!("{}", serde_json::to_string_pretty(&raw)?);
        }
        Command::Play { uri, context } => {
            let status = helper.play(uri.as_deref(), context.as_deref()).await?;
            println!("{}", describe(&status));
        }
        Command::Pause => println!("{}", describe(&helper.pause(true).await?)),
        Command::Resume => println!("{}", describe(&helper.unpause().await?)),
        Command::Seek { seconds } => {
            helper.seek(seconds).await?;
            println!("Requested seek to {}", webhelper::format_offset(seconds));
        }
        Command::Info => {
            let info = helper.information().await?;
            println!(
                "helper version: {}",
                info.version
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "unknown".into())
            );
            println!(
                "client version: {}",
                info.client_version.as_deref().unwrap_or("unknown")
            );
        }
        Command::Controls => {
            let controls = helper.is_enabled().await?;
            println!("previous: {}", controls.previous_track);
            println!("play/pause: {}", controls.play_pause);
            println!("next: {}", controls.next_track);
        }
    }

    Ok(())
}
