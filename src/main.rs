use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use lawander::api::AppState;
use lawander::chat::{ChatBackend, OpenAiChat};
use lawander::resolver::{BatchScheduler, Resolver};
use lawander::session::{ReplyLayout, TripSession};
use lawander::{LawanderConfig, LawanderError, geocoding, telemetry, web};

#[derive(Parser)]
#[command(name = "lawander", version, about = "Map annotation for AI travel itineraries")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Resolve the places marked in existing text, without the chat backend
    Annotate {
        #[arg(long)]
        destination: String,
        #[arg(long, default_value_t = 3)]
        days: u32,
        /// Text file with `**Place**` markup; stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Generate and annotate a full itinerary
    Plan {
        #[arg(long)]
        destination: String,
        #[arg(long, default_value_t = 3)]
        days: u32,
    },
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(LawanderError::from)?;
            Ok(text)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = LawanderConfig::load_from_path(cli.config.clone())?;
    let _telemetry = telemetry::init(&config.logging, cli.verbose)?;

    let geocoder = geocoding::from_config(&config)?;
    let chat: Arc<dyn ChatBackend> = Arc::new(OpenAiChat::new(&config.chat)?);
    let scheduler = || BatchScheduler::new(Resolver::new(geocoder.clone(), config.resolver.clone()));

    match cli.command {
        Command::Serve { port } => {
            let mut server = config.server.clone();
            if let Some(port) = port {
                server.port = port;
            }
            let state = AppState::new(geocoder.clone(), chat, config.resolver.clone())
                .with_session_limits(server.session_idle(), server.max_sessions);
            let state = Arc::new(state);
            web::run(state, &server).await?;
        }
        Command::Annotate {
            destination,
            days,
            file,
        } => {
            let text = read_input(file.as_ref())?;
            let mut session = TripSession::open(&destination, days, scheduler(), chat).await?;
            session.annotate(&text, ReplyLayout::Itinerary).await;
            info!("{} places on the map", session.found_places().len());
            println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
        }
        Command::Plan { destination, days } => {
            if config.chat.api_key.is_none() {
                return Err(LawanderError::config(
                    "Planning needs chat.api_key (or LAWANDER__CHAT__API_KEY)",
                )
                .into());
            }
            let session = TripSession::start(&destination, days, scheduler(), chat).await?;
            println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
        }
    }

    Ok(())
}
