use anyhow::Context;
use card_core::{Config, ThemeName, ViewModelAggregator, sources_from_config};
use clap::{Parser, Subcommand};
use inquire::{Select, Text};
use tracing::debug;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-card", version, about = "CWB weather card for the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the authorization key, station, region and theme.
    Configure,

    /// Fetch once and print the card.
    Show {
        /// Print the view model as JSON instead of the card.
        #[arg(long)]
        json: bool,
    },

    /// Keep the card on screen with manual refresh.
    Watch,
}

const REFRESH: &str = "Refresh";
const TOGGLE_THEME: &str = "Toggle theme";
const QUIT: &str = "Quit";

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { json } => show(json).await,
            Command::Watch => watch().await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let key = Text::new("CWB authorization key:")
        .with_initial_value(config.authorization.as_deref().unwrap_or_default())
        .prompt()
        .context("Failed to read authorization key")?;
    let station = Text::new("Observation station:")
        .with_initial_value(&config.station_name)
        .prompt()
        .context("Failed to read station name")?;
    let region = Text::new("Forecast region:")
        .with_initial_value(&config.region_name)
        .prompt()
        .context("Failed to read region name")?;
    let theme = Select::new("Theme:", ThemeName::all().to_vec())
        .with_starting_cursor(if config.theme == ThemeName::Light { 0 } else { 1 })
        .prompt()
        .context("Failed to read theme")?;

    config.set_authorization(key.trim().to_string());
    config.station_name = station.trim().to_string();
    config.region_name = region.trim().to_string();
    config.theme = theme;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn aggregator(config: &Config) -> anyhow::Result<ViewModelAggregator> {
    let (current, forecast) = sources_from_config(config)?;
    Ok(ViewModelAggregator::new(current, forecast))
}

async fn show(json: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let agg = aggregator(&config)?;

    let view = agg.refresh().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render::card(&agg.snapshot(), config.theme));
    }
    Ok(())
}

async fn watch() -> anyhow::Result<()> {
    let config = Config::load()?;
    let agg = aggregator(&config)?;
    let mut theme = config.theme;

    refresh_and_draw(&agg, theme).await;

    loop {
        let choice = Select::new("Action:", vec![REFRESH, TOGGLE_THEME, QUIT])
            .prompt()
            .context("Failed to read action")?;
        debug!(choice, "watch action");

        match choice {
            REFRESH => refresh_and_draw(&agg, theme).await,
            TOGGLE_THEME => {
                theme = theme.toggled();
                print!("{}", render::card(&agg.snapshot(), theme));
            }
            _ => break,
        }
    }

    Ok(())
}

async fn refresh_and_draw(agg: &ViewModelAggregator, theme: ThemeName) {
    if let Err(err) = agg.refresh().await {
        eprintln!("Refresh failed: {err:#}");
    }
    print!("{}", render::card(&agg.snapshot(), theme));
}
