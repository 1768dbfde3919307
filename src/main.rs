// Main entry point - Dependency injection and terminal setup
use clap::Parser;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use sirn_visualizer::application::feed::{SirnFeed, drive_feed};
use sirn_visualizer::application::visualizer::SirnVisualizer;
use sirn_visualizer::domain::view::DisplayMode;
use sirn_visualizer::infrastructure::config::{LoggingSettings, load_visualizer_config};
use sirn_visualizer::infrastructure::feeds::{DatasetFeed, ExampleFeed, SimulationFeed};
use sirn_visualizer::infrastructure::json_loader::load_dataset;
use sirn_visualizer::infrastructure::terminal::TerminalSurface;
use sirn_visualizer::presentation::cli::{RunMode, VisualizerArgs};
use sirn_visualizer::presentation::input::pump_input;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = VisualizerArgs::parse();

    // Load configuration
    let config = load_visualizer_config()?;

    // The terminal belongs to the UI, so logs go to a file
    init_tracing(&config.logging)?;

    let mode = match args.mode {
        RunMode::Static => DisplayMode::Static,
        RunMode::Dynamic | RunMode::Demo | RunMode::Example => DisplayMode::Dynamic,
    };
    let visualizer = SirnVisualizer::new(&config, mode);

    // Everything that can fail on bad input happens before the terminal switches modes
    let feed: Option<Box<dyn SirnFeed>> = match args.mode {
        RunMode::Static => {
            let dataset = load_dataset(args.require_data_file()?, config.data.max_sum_deviation)?;
            visualizer.load_dataset(&dataset)?;
            None
        }
        RunMode::Dynamic => {
            let dataset = load_dataset(args.require_data_file()?, config.data.max_sum_deviation)?;
            Some(Box::new(DatasetFeed::new(&dataset)))
        }
        RunMode::Demo => Some(Box::new(SimulationFeed::new(
            args.cities.unwrap_or(config.playback.demo_cities),
            config.playback.max_time,
            config.playback.time_step,
            args.stochastic,
            args.seed,
        )?)),
        RunMode::Example => Some(Box::new(ExampleFeed::new())),
    };

    let mut surface = TerminalSurface::enter()?;

    // Render loop owns the surface until the visualizer closes
    let render = {
        let visualizer = visualizer.clone();
        tokio::spawn(async move {
            let result = visualizer.run(&mut surface).await;
            if result.is_err() {
                visualizer.close();
            }
            (surface, result)
        })
    };

    let input = {
        let visualizer = visualizer.clone();
        tokio::spawn(async move {
            if let Err(err) = pump_input(visualizer.clone()).await {
                tracing::error!("Input stream failed: {}", err);
                visualizer.close();
            }
        })
    };

    if let Some(feed) = feed {
        let visualizer = visualizer.clone();
        let delay = config.playback.step_delay();
        tokio::spawn(async move {
            if let Err(err) = drive_feed(visualizer, feed, delay).await {
                tracing::error!("Feed stopped: {}", err);
            }
        });
    }

    visualizer.wait_for_close().await;

    let (mut surface, result) = render.await?;
    surface.restore()?;
    input.await?;
    result
}

fn init_tracing(logging: &LoggingSettings) -> anyhow::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logging.file)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
