use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use ytplay::commands::{self, Context};
use ytplay::config::Paths;
use ytplay::output::{Format, Output};
use ytplay::playlist::SortOptions;
use ytplay::progress::Progress;
use ytplay::sort::SortKey;
use ytplay::youtube_api::PrivacyStatus;

#[derive(Parser)]
#[command(name = "ytplay", version)]
#[command(about = "List, inspect, sort and delete your YouTube playlists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Write the result to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// How to format the result
    #[arg(short, long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    /// Don't show progress bars
    #[arg(long, global = true)]
    no_progress: bool,

    /// Directory holding client_secret.json and the cached token
    #[arg(long, env = "YTPLAY_CONFIG_DIR", global = true)]
    config_dir: Option<PathBuf>,

    /// OAuth client secret file, if not the one in the configuration directory
    #[arg(long, env = "YTPLAY_CLIENT_SECRETS", global = true)]
    client_secrets: Option<PathBuf>,

    /// Log more (repeat for even more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Base URL of the YouTube Data API
    #[arg(long, env = "YTPLAY_API_BASE", hide = true, global = true)]
    api_base: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Authorize ytplay to manage your YouTube account
    Login {
        /// Go through the consent screen even if credentials are cached
        #[arg(long)]
        force: bool,
    },
    /// Forget the cached credentials
    Logout,
    /// Show whether usable credentials are cached
    Status,
    /// List your playlists
    ListPlaylists,
    /// Show the details of one playlist
    PlaylistSummary {
        /// The playlist's ID
        playlist_id: Option<String>,
    },
    /// List the videos in a playlist
    ListVideos {
        /// The playlist's ID
        playlist_id: Option<String>,
    },
    /// List the videos in a playlist along with their durations
    ListVideosWithDurations {
        /// The playlist's ID
        playlist_id: Option<String>,
    },
    /// Create a sorted copy of a playlist
    CreateSortedPlaylist {
        /// The ID of the playlist to copy
        playlist_id: Option<String>,
        /// What to sort by
        #[arg(short, long, value_enum, default_value_t = SortKey::Duration)]
        sort_by: SortKey,
        /// Sort in descending order
        #[arg(short, long)]
        reverse: bool,
        /// Title of the new playlist
        #[arg(short, long)]
        title: Option<String>,
        /// Privacy status of the new playlist
        #[arg(short, long, value_enum, default_value_t = PrivacyStatus::Private)]
        privacy: PrivacyStatus,
    },
    /// Delete a playlist
    DeletePlaylist {
        /// The playlist's ID
        playlist_id: Option<String>,
        /// Don't ask for confirmation
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(ytplay::Error::find_in(&e).map_or(1, ytplay::Error::exit_code))
        }
    }
}

async fn run(cli: Cli) -> eyre::Result<()> {
    let ctx = Context {
        paths: Paths::resolve(cli.config_dir, cli.client_secrets)?,
        output: Output::new(cli.format, cli.output),
        progress: Progress::new(!cli.no_progress && std::io::stderr().is_terminal()),
        api_base: cli.api_base,
    };
    tracing::debug!(paths = ?ctx.paths, "resolved configuration");

    match cli.command {
        Command::Login { force } => commands::login(&ctx, force).await,
        Command::Logout => commands::logout(&ctx).await,
        Command::Status => commands::status(&ctx).await,
        Command::ListPlaylists => commands::list_playlists(&ctx).await,
        Command::PlaylistSummary { playlist_id } => {
            commands::playlist_summary(&ctx, playlist_id).await
        }
        Command::ListVideos { playlist_id } => {
            commands::list_videos(&ctx, playlist_id, false).await
        }
        Command::ListVideosWithDurations { playlist_id } => {
            commands::list_videos(&ctx, playlist_id, true).await
        }
        Command::CreateSortedPlaylist {
            playlist_id,
            sort_by,
            reverse,
            title,
            privacy,
        } => {
            let options = SortOptions {
                key: sort_by,
                reverse,
                title,
                privacy,
            };
            commands::create_sorted_playlist(&ctx, playlist_id, options).await
        }
        Command::DeletePlaylist { playlist_id, force } => {
            commands::delete_playlist(&ctx, playlist_id, force).await
        }
    }
}
