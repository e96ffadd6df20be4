use clap::{Parser, Subcommand};
use std::io::Write;

use lugabiz::commands;
use lugabiz::logging;
use lugabiz::readline;
use lugabiz::AppContext;
use lugabiz_core::{AppConfig, AppConfigExt};

#[tokio::main]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();

    let ctx = AppContext::start(AppConfig::load())?;

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "Nearby places and proximity alerts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Position, places and notifier state
    Status,
    /// Loaded places, closest first
    Places,
    /// Map markers; --query previews matches without applying them
    Markers {
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Change the search radius
    Radius {
        #[arg(short, long)]
        meters: u32,
    },
    /// Available distance presets
    Presets,
    /// Highlight markers matching a query (empty clears)
    Filter {
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Restart location acquisition
    Retry,
    Config,
    Notifications,
    Exit,
}

async fn respond(line: &str, ctx: &AppContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "lugabiz".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::Status) => commands::show_status(ctx).await?,
        Some(Commands::Places) => commands::list_places(ctx).await?,
        Some(Commands::Markers { query }) => commands::show_markers(ctx, query.as_deref()).await?,
        Some(Commands::Radius { meters }) => commands::set_radius(ctx, *meters).await?,
        Some(Commands::Presets) => commands::list_presets(ctx.pipeline.radius()),
        Some(Commands::Filter { query }) => commands::set_filter(ctx, query).await?,
        Some(Commands::Retry) => commands::retry_location(ctx).await?,
        Some(Commands::Config) => commands::show_config(ctx).await?,
        Some(Commands::Notifications) => commands::show_notifications(ctx).await?,
        Some(Commands::Exit) => {
            commands::exit(ctx).await?;
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
