mod commands;
mod config;
mod date_range;
mod fetch;
mod logger;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use icsdrop_core::Formatter;

use config::{Overrides, Settings};
use date_range::DateRange;
use render::SurfaceOptions;

#[derive(Parser)]
#[command(name = "icsdrop")]
#[command(about = "Browse an ICS feed and save single events as .ics files")]
struct Cli {
    /// Config file (defaults to ~/.config/icsdrop/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Feed URL (http, https, webcal) or local path
    #[arg(long, global = true)]
    feed: Option<String>,

    /// Display timezone: an IANA name or "local"
    #[arg(long, global = true)]
    tz: Option<String>,

    /// Use a 12-hour clock
    #[arg(long, global = true)]
    h12: bool,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List events, expanding recurring ones
    List {
        /// Show events from this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Show events until this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Print each event's details under it
        #[arg(short, long)]
        details: bool,

        /// Print markup instead of plain text
        #[arg(long)]
        html: bool,
    },
    /// Show the details of one event
    Show {
        /// Event number from `list`, or part of its title
        query: String,

        /// Print markup instead of plain text
        #[arg(long)]
        html: bool,
    },
    /// Save one event as <title>.ics
    Download {
        /// Event number from `list`, or part of its title
        query: String,

        /// Directory to save into
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print one event as an iCalendar document
    Ics {
        /// Event number from `list`, or part of its title
        query: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let config = config::load_config(cli.config.as_deref())?;
    let settings = Settings::resolve(
        config,
        Overrides {
            feed: cli.feed,
            timezone: cli.tz,
            h12: cli.h12,
        },
    )?;

    let formatter = Formatter::new(&settings.format);
    log::debug!("Displaying times in {}", formatter.timezone().name());

    let events = fetch::load_events(settings.feed()?, formatter.timezone()).await?;

    match cli.command {
        Commands::List {
            from,
            to,
            details,
            html,
        } => {
            let range = DateRange::from_args(
                from.as_deref(),
                to.as_deref(),
                formatter.timezone(),
                Utc::now(),
            )?;
            commands::list::run(&events, range, formatter, SurfaceOptions { details, html })
        }
        Commands::Show { query, html } => commands::show::run(&events, &query, &formatter, html),
        Commands::Download { query, out } => {
            let out = out.unwrap_or_else(|| settings.download_dir.clone());
            commands::download::run(&events, &query, &formatter, &out)
        }
        Commands::Ics { query } => commands::ics::run(&events, &query),
    }
}
