// Command line arguments for both binaries
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Load the whole file, then show it.
    Static,
    /// Replay the file one time step at a time.
    Dynamic,
    /// Live synthetic epidemic across many cities.
    Demo,
    /// Four-city scripted model fed from a producer task.
    Example,
}

#[derive(Debug, Parser)]
#[command(name = "sirn-visualizer", version, about = "SIRN model visualization in the terminal")]
pub struct VisualizerArgs {
    /// Path to a JSON data file (static and dynamic modes)
    pub data_file: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = RunMode::Static)]
    pub mode: RunMode,

    /// Number of demo cities (defaults to playback.demo_cities)
    #[arg(long)]
    pub cities: Option<usize>,

    /// Seed for the stochastic demo
    #[arg(long)]
    pub seed: Option<u64>,

    /// Add 5% random variation to the demo model rates
    #[arg(long, default_value_t = false)]
    pub stochastic: bool,
}

impl VisualizerArgs {
    /// The data file, required by the file-backed modes.
    pub fn require_data_file(&self) -> anyhow::Result<&PathBuf> {
        match (&self.data_file, self.mode) {
            (Some(path), _) => Ok(path),
            (None, mode) => anyhow::bail!("a data file is required for {:?} mode", mode),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "sirn-generate", version, about = "Generate synthetic SIRN model data")]
pub struct GenerateArgs {
    #[arg(long, default_value_t = 3)]
    pub cities: usize,

    #[arg(long, default_value_t = 100)]
    pub max_time: u32,

    #[arg(long, default_value_t = 10)]
    pub time_step: u32,

    #[arg(long, default_value_t = 1)]
    pub initial_infected: u32,

    #[arg(long, default_value = "sirn_data.json")]
    pub output: PathBuf,

    /// Use beta = 0.3, gamma = 0.1 for every city
    #[arg(long, default_value_t = false)]
    pub fixed_params: bool,

    /// Population for each city
    #[arg(long, num_args = 0..)]
    pub populations: Vec<u32>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = false)]
    pub stochastic: bool,

    /// Print the first few points of the first cities
    #[arg(long, default_value_t = false)]
    pub preview: bool,
}
